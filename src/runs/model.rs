use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of one pipeline run. `Pending` covers the window between upload
/// and the generation trigger; only `Running` runs own a live background task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RunStatus::Pending),
            "running" => Some(RunStatus::Running),
            "succeeded" => Some(RunStatus::Succeeded),
            "failed" => Some(RunStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::Failed)
    }
}

/// The stage a run is currently in (while running) or stopped at (when
/// failed). Upload covers ingest and summarize; the background task covers
/// the rest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Ingest,
    Summarize,
    FetchDesign,
    TestCases,
    Script,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Ingest => "ingest",
            PipelineStage::Summarize => "summarize",
            PipelineStage::FetchDesign => "fetch_design",
            PipelineStage::TestCases => "test_cases",
            PipelineStage::Script => "script",
        }
    }
}

/// File paths produced so far, as recorded in `run.json` and returned by the
/// status endpoint. Unset entries have simply not been produced yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunArtifacts {
    pub document_path: Option<String>,
    pub extracted_text_path: Option<String>,
    pub summary_path: Option<String>,
    pub test_cases_path: Option<String>,
    pub test_script_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub id: String,
    pub status: RunStatus,
    pub stage: Option<PipelineStage>,
    pub error: Option<String>,
    /// Design-file key supplied at upload or trigger time. Informational; the
    /// access token is deliberately never written to the record.
    pub figma_file: Option<String>,
    pub target_url: Option<String>,
    pub test_case_count: Option<usize>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub artifacts: RunArtifacts,
}

impl PipelineRun {
    pub fn new(id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: RunStatus::Pending,
            stage: None,
            error: None,
            figma_file: None,
            target_url: None,
            test_case_count: None,
            created_at: now,
            updated_at: now,
            finished_at: None,
            artifacts: RunArtifacts::default(),
        }
    }
}
