use serde::{Deserialize, Serialize};

use crate::runs::RunStatus;

// ===== Upload Types =====

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub run_id: String,
    pub message: String,
    pub document_path: String,
    pub extracted_text_path: String,
    pub summary_path: String,
}

// ===== Generation Types =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub figma_token: Option<String>,
    #[serde(default)]
    pub figma_file: Option<String>,
    #[serde(default)]
    pub target_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAccepted {
    pub run_id: String,
    pub status: RunStatus,
    pub message: String,
}

// ===== Artifact Types =====

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct ScriptResponse {
    pub script: String,
}
