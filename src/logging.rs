use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,caseforge=debug"))
}

/// Console plus daily-rolling file output under `<data_dir>/logs/`.
///
/// The returned guard flushes the file writer on drop; the caller must hold it
/// for the lifetime of the process or buffered lines are lost.
pub fn init_logging(data_dir: &Path) -> anyhow::Result<WorkerGuard> {
    let logs_dir = data_dir.join("logs");
    std::fs::create_dir_all(&logs_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "caseforge.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(default_filter())
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    tracing::info!("Logging initialized. Logs directory: {:?}", logs_dir);
    Ok(guard)
}

/// Console-only output for one-shot CLI invocations.
pub fn init_console_logging() {
    tracing_subscriber::registry()
        .with(default_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
