use std::fs;

use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    Json,
};

use super::error::{ApiResult, AppError};
use super::state::AppState;
use super::types::*;
use crate::figma;
use crate::pipeline::{self, GenerateParams};
use crate::runs::{PipelineRun, PipelineStage, RunStatus, StoreError};

pub async fn health() -> &'static str {
    "ok"
}

pub async fn health_detailed(
    State(state): State<AppState>,
) -> ApiResult<Json<serde_json::Value>> {
    let run_count = state.store.count().unwrap_or(0);

    Ok(Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "runCount": run_count
    })))
}

async fn read_text_part(field: Field<'_>) -> Option<String> {
    field
        .text()
        .await
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Accept the requirements document, store it in a fresh run workspace, and
/// run the synchronous half of the pipeline (text extraction + summary).
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut document: Option<Vec<u8>> = None;
    let mut figma_file: Option<String> = None;
    let mut target_url: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "document" => {
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::bad_request(format!("Failed to read document part: {}", e))
                })?;
                document = Some(bytes.to_vec());
            }
            "figma_file" => figma_file = read_text_part(field).await,
            "target_url" => target_url = read_text_part(field).await,
            // Accepted so clients can post the whole form at once, but the
            // token never lands in the run record.
            "figma_token" => {
                let _ = field.text().await;
            }
            _ => {}
        }
    }

    let document = match document {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => return Err(AppError::bad_request("No PDF file uploaded")),
    };

    let run = state.store.create()?;
    let paths = state.store.paths(&run.id);
    fs::write(paths.document(), &document)
        .map_err(|e| AppError::internal(format!("Failed to store document: {}", e)))?;
    state.store.update(&run.id, |r| {
        r.figma_file = figma_file;
        r.target_url = target_url;
    })?;

    tracing::info!(run_id = %run.id, bytes = document.len(), "Stored uploaded document");

    if let Err(e) = pipeline::run_upload(&state.store, state.model.as_ref(), &run.id).await {
        tracing::error!(run_id = %run.id, "Upload processing failed: {}", e);
        if let Err(store_err) = state.store.finish_failed(&run.id, &e.to_string()) {
            tracing::error!(run_id = %run.id, "Failed to record run failure: {}", store_err);
        }
        return Err(AppError::from(e));
    }

    Ok(Json(UploadResponse {
        run_id: run.id.clone(),
        message: "File uploaded, text extracted, and summarization completed".to_string(),
        document_path: paths.document().display().to_string(),
        extracted_text_path: paths.extracted_text().display().to_string(),
        summary_path: paths.summary().display().to_string(),
    }))
}

/// Kick off the generation half of the pipeline as a background task and
/// return immediately; progress is polled via `GET /runs/:run_id`.
pub async fn trigger_generation(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    Json(req): Json<GenerateRequest>,
) -> ApiResult<(StatusCode, Json<GenerateAccepted>)> {
    let figma_token = req.figma_token.as_deref().map(str::trim).unwrap_or_default();
    let figma_file = req.figma_file.as_deref().map(str::trim).unwrap_or_default();
    let target_url = req.target_url.as_deref().map(str::trim).unwrap_or_default();

    if figma_token.is_empty() || figma_file.is_empty() || target_url.is_empty() {
        return Err(AppError::bad_request("Missing required parameters"));
    }

    let file_key = figma::parse_file_key(figma_file)
        .ok_or_else(|| AppError::bad_request("figmaFile does not contain a usable file key"))?;

    let existing = state.store.get(&run_id)?;
    if existing.status == RunStatus::Running {
        return Err(AppError::conflict("Run is already generating"));
    }

    let paths = state.store.paths(&run_id);
    if !paths.summary().is_file() {
        return Err(AppError::conflict(
            "Run has no requirements summary yet; upload processing may have failed",
        ));
    }

    // Claim the run before spawning so a second trigger cannot race past the
    // status check above.
    state
        .store
        .begin_exclusive(&run_id, PipelineStage::FetchDesign)?;
    let run = state.store.update(&run_id, |r| {
        r.figma_file = Some(file_key.clone());
        r.target_url = Some(target_url.to_string());
    })?;

    let params = GenerateParams {
        figma_token: figma_token.to_string(),
        figma_file_key: file_key,
        target_url: target_url.to_string(),
    };

    tokio::spawn(pipeline::run_generation_task(
        state.store.clone(),
        state.model.clone(),
        state.designs.clone(),
        run_id.clone(),
        params,
    ));

    Ok((
        StatusCode::ACCEPTED,
        Json(GenerateAccepted {
            run_id,
            status: run.status,
            message: "Generation pipeline started".to_string(),
        }),
    ))
}

pub async fn list_runs(State(state): State<AppState>) -> ApiResult<Json<Vec<PipelineRun>>> {
    let runs = state.store.list()?;
    Ok(Json(runs))
}

pub async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> ApiResult<Json<PipelineRun>> {
    let run = state.store.get(&run_id)?;
    Ok(Json(run))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> ApiResult<Json<SummaryResponse>> {
    // An unknown run and a summary not produced yet read the same from
    // outside: retry later.
    state.store.get(&run_id).map_err(|e| match e {
        StoreError::NotFound(_) => AppError::artifact_pending("Summary"),
        other => AppError::from(other),
    })?;

    let path = state.store.paths(&run_id).summary();
    if !path.is_file() {
        return Err(AppError::artifact_pending("Summary"));
    }

    let summary = fs::read_to_string(&path)
        .map_err(|e| AppError::internal(format!("Failed to read summary: {}", e)))?;
    Ok(Json(SummaryResponse { summary }))
}

pub async fn get_script(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> ApiResult<Json<ScriptResponse>> {
    state.store.get(&run_id).map_err(|e| match e {
        StoreError::NotFound(_) => AppError::artifact_pending("Test script"),
        other => AppError::from(other),
    })?;

    let path = state.store.paths(&run_id).test_script();
    if !path.is_file() {
        return Err(AppError::artifact_pending("Test script"));
    }

    let script = fs::read_to_string(&path)
        .map_err(|e| AppError::internal(format!("Failed to read test script: {}", e)))?;
    Ok(Json(ScriptResponse { script }))
}
