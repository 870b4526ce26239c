//! Staged pipeline from uploaded document to generated Playwright script.
//!
//! The upload half (ingest, summarize) runs synchronously inside the upload
//! request. The generation half (fetch design, test cases, script) runs as a
//! background task; every stage records itself on the run before doing work,
//! so a poll of the run always shows where the pipeline is.

pub mod prompt;
pub mod testcase;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::figma::{self, DesignError, PageSummary};
use crate::gemini::{ModelError, TextModel};
use crate::ingest::{self, IngestError};
use crate::runs::{PipelineStage, RunStore, StoreError};

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[A-Za-z]*").expect("static regex"));

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Design(#[from] DesignError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("missing input file: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("model produced an empty test script")]
    EmptyScript,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Inputs for the generation half of the pipeline. The token lives only in
/// this in-memory struct for the duration of the task.
#[derive(Debug, Clone)]
pub struct GenerateParams {
    pub figma_token: String,
    pub figma_file_key: String,
    pub target_url: String,
}

/// Remove markdown code fences (```javascript, ```js, bare ```) the model
/// wraps around generated code.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

fn read_input(path: &Path) -> Result<String, PipelineError> {
    if !path.is_file() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

// ===== Stage Functions =====

/// Extract plain text from the uploaded document and write it next to it.
pub fn extract_document_text(
    document_path: &Path,
    text_path: &Path,
) -> Result<String, PipelineError> {
    let text = ingest::extract_text(document_path)?;
    fs::write(text_path, &text)?;
    Ok(text)
}

/// Summarize previously extracted text into the requirements summary file.
pub async fn summarize_document(
    model: &dyn TextModel,
    text_path: &Path,
    summary_path: &Path,
) -> Result<String, PipelineError> {
    let text = read_input(text_path)?;
    let summary = model.generate(&prompt::build_summary_prompt(&text)).await?;
    fs::write(summary_path, &summary)?;
    Ok(summary)
}

/// Generate the manual test cases from the stored summary plus the design
/// inventory. Returns the raw text and how many cases parsed out of it.
pub async fn generate_test_cases(
    model: &dyn TextModel,
    summary_path: &Path,
    pages: &[PageSummary],
    test_cases_path: &Path,
) -> Result<(String, usize), PipelineError> {
    let summary = read_input(summary_path)?;
    let cases = model
        .generate(&prompt::build_test_case_prompt(&summary, pages))
        .await?;
    fs::write(test_cases_path, &cases)?;
    let count = testcase::parse_test_cases(&cases).len();
    Ok((cases, count))
}

/// Convert the test-case text into a Playwright file. The file is only
/// written once the cleaned script is known to be non-empty.
pub async fn generate_script(
    model: &dyn TextModel,
    test_cases: &str,
    target_url: &str,
    script_path: &Path,
) -> Result<String, PipelineError> {
    let raw = model
        .generate(&prompt::build_script_prompt(test_cases, target_url))
        .await?;
    let script = strip_code_fences(&raw);
    if script.is_empty() {
        return Err(PipelineError::EmptyScript);
    }
    fs::write(script_path, &script)?;
    Ok(script)
}

// ===== Orchestration =====

/// Upload half of the pipeline: ingest the stored document and summarize it.
/// The caller has already written the document into the run workspace. On
/// success the run is parked pending, waiting for the generation trigger.
pub async fn run_upload(
    store: &RunStore,
    model: &dyn TextModel,
    run_id: &str,
) -> Result<(), PipelineError> {
    let paths = store.paths(run_id);

    store.begin_stage(run_id, PipelineStage::Ingest)?;
    let text = extract_document_text(&paths.document(), &paths.extracted_text())?;
    store.update(run_id, |run| {
        run.artifacts.document_path = Some(display_path(&paths.document()));
        run.artifacts.extracted_text_path = Some(display_path(&paths.extracted_text()));
    })?;
    tracing::info!(run_id, chars = text.len(), "Extracted document text");

    store.begin_stage(run_id, PipelineStage::Summarize)?;
    summarize_document(model, &paths.extracted_text(), &paths.summary()).await?;
    store.update(run_id, |run| {
        run.artifacts.summary_path = Some(display_path(&paths.summary()));
    })?;

    store.park_pending(run_id)?;
    Ok(())
}

/// Generation half of the pipeline, entered from the background task: fetch
/// the design file, then hand off to [`generate_from_pages`]. The caller has
/// already claimed the run and put it in the fetch_design stage.
pub async fn run_generation(
    store: &RunStore,
    model: &dyn TextModel,
    designs: &figma::Client,
    run_id: &str,
    params: &GenerateParams,
) -> Result<(), PipelineError> {
    let file = designs
        .fetch_file(&params.figma_token, &params.figma_file_key)
        .await?;
    let pages = figma::extract_pages(&file)?;
    tracing::info!(run_id, pages = pages.len(), "Extracted design pages");

    generate_from_pages(store, model, run_id, &pages, &params.target_url).await
}

/// Test-case and script stages over an already extracted design. Split from
/// [`run_generation`] so the model-side stages can run without a live design
/// API.
pub async fn generate_from_pages(
    store: &RunStore,
    model: &dyn TextModel,
    run_id: &str,
    pages: &[PageSummary],
    target_url: &str,
) -> Result<(), PipelineError> {
    let paths = store.paths(run_id);

    store.begin_stage(run_id, PipelineStage::TestCases)?;
    let (cases, count) =
        generate_test_cases(model, &paths.summary(), pages, &paths.test_cases()).await?;
    store.update(run_id, |run| {
        run.test_case_count = Some(count);
        run.artifacts.test_cases_path = Some(display_path(&paths.test_cases()));
    })?;
    tracing::info!(run_id, cases = count, "Generated test cases");

    store.begin_stage(run_id, PipelineStage::Script)?;
    let script = generate_script(model, &cases, target_url, &paths.test_script()).await?;
    store.update(run_id, |run| {
        run.artifacts.test_script_path = Some(display_path(&paths.test_script()));
    })?;
    tracing::info!(run_id, bytes = script.len(), "Generated test script");

    store.finish_success(run_id)?;
    Ok(())
}

/// Entry point for the spawned generation task. Failures are recorded on the
/// run instead of bubbling anywhere; the task has no caller to return to.
pub async fn run_generation_task(
    store: Arc<RunStore>,
    model: Arc<dyn TextModel>,
    designs: Arc<figma::Client>,
    run_id: String,
    params: GenerateParams,
) {
    if let Err(e) = run_generation(&store, model.as_ref(), &designs, &run_id, &params).await {
        tracing::error!(run_id = %run_id, "Pipeline run failed: {}", e);
        if let Err(store_err) = store.finish_failed(&run_id, &e.to_string()) {
            tracing::error!(run_id = %run_id, "Failed to record run failure: {}", store_err);
        }
    }
}
