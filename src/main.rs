use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use caseforge::api::{self, ApiConfig, AppState};
use caseforge::config::{self, AppConfig};
use caseforge::figma;
use caseforge::gemini::{GeminiClient, TextModel};
use caseforge::logging;
use caseforge::pipeline;
use caseforge::runs::RunStore;

#[derive(Parser)]
#[command(
    name = "caseforge",
    version,
    about = "Turns an SRS document and a Figma design into Playwright tests"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP pipeline API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(long, default_value_t = config::DEFAULT_PORT)]
        port: u16,
        /// Override the data directory
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Run the generation stages once against an existing summary file
    Generate {
        /// Path to a requirements summary file
        #[arg(long)]
        summary: PathBuf,
        /// Figma personal access token
        #[arg(long)]
        figma_token: String,
        /// Figma file key or file URL
        #[arg(long)]
        figma_file: String,
        /// Base URL of the application under test
        #[arg(long)]
        target_url: String,
        /// Directory for the generated artifacts
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            host,
            port,
            data_dir,
        } => serve(host, port, data_dir).await,
        Command::Generate {
            summary,
            figma_token,
            figma_file,
            target_url,
            out_dir,
        } => generate(summary, figma_token, figma_file, target_url, out_dir).await,
    }
}

async fn serve(host: String, port: u16, data_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let mut app_config = AppConfig::from_env()?;
    if let Some(dir) = data_dir {
        app_config.data_dir = dir;
    }

    let _log_guard = logging::init_logging(&app_config.data_dir)?;

    tracing::info!("caseforge v{} starting up", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {:?}", app_config.data_dir);

    let store = Arc::new(RunStore::open(app_config.runs_dir())?);

    // Runs left mid-pipeline by a crash or restart can never finish.
    match store.sweep_interrupted() {
        Ok(count) if count > 0 => {
            tracing::info!("Startup sweep: marked {} interrupted run(s) as failed", count);
        }
        Err(e) => {
            tracing::warn!("Startup sweep failed: {}", e);
        }
        _ => {}
    }

    let model: Arc<dyn TextModel> = Arc::new(GeminiClient::new(
        app_config.gemini_api_key.clone(),
        app_config.gemini_model.clone(),
    )?);
    let designs = Arc::new(figma::Client::new()?);
    let state = AppState::new(store, model, designs);

    let host_addr: Ipv4Addr = host.parse().context("invalid --host address")?;
    let api_config = ApiConfig {
        host: host_addr.octets(),
        port,
    };

    let handle = api::start_server(state, api_config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to start API server: {}", e))?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("Received shutdown signal");
    handle.shutdown();

    Ok(())
}

async fn generate(
    summary: PathBuf,
    figma_token: String,
    figma_file: String,
    target_url: String,
    out_dir: PathBuf,
) -> anyhow::Result<()> {
    logging::init_console_logging();

    let app_config = AppConfig::from_env()?;
    let model = GeminiClient::new(
        app_config.gemini_api_key.clone(),
        app_config.gemini_model.clone(),
    )?;
    let designs = figma::Client::new()?;

    let file_key = figma::parse_file_key(&figma_file)
        .with_context(|| format!("could not determine a file key from {:?}", figma_file))?;

    std::fs::create_dir_all(&out_dir)?;

    tracing::info!(%file_key, "Fetching design file");
    let file = designs.fetch_file(&figma_token, &file_key).await?;
    let pages = figma::extract_pages(&file)?;
    tracing::info!(pages = pages.len(), "Extracted design pages");

    let cases_path = out_dir.join("test_cases.txt");
    let (cases, count) =
        pipeline::generate_test_cases(&model, &summary, &pages, &cases_path).await?;
    tracing::info!(cases = count, path = %cases_path.display(), "Wrote test cases");

    let script_path = out_dir.join("tests.spec.js");
    pipeline::generate_script(&model, &cases, &target_url, &script_path).await?;
    tracing::info!(path = %script_path.display(), "Wrote Playwright test script");

    Ok(())
}
