use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use super::handlers::*;
use super::state::AppState;

/// Uploaded requirements documents can be sizeable; axum's 2 MB default is
/// too small for real SRS PDFs.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    let app = Router::new()
        .route("/health", get(health))
        .route("/health/detailed", get(health_detailed))
        // Pipeline
        .route("/upload", post(upload_document))
        .route("/runs/:run_id/generate", post(trigger_generation))
        // Run records
        .route("/runs", get(list_runs))
        .route("/runs/:run_id", get(get_run))
        // Artifacts
        .route("/runs/:run_id/summary", get(get_summary))
        .route("/runs/:run_id/script", get(get_script))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state);

    // Add CORS for browser clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    app.layer(cors)
}
