use std::path::PathBuf;

use anyhow::Context;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Process-level configuration, resolved once at startup from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root directory for run workspaces and logs.
    pub data_dir: PathBuf,
    /// Secret for the generative-language API.
    pub gemini_api_key: String,
    /// Model identifier passed to the generative-language API.
    pub gemini_model: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .context("GEMINI_API_KEY environment variable not set")?;

        let gemini_model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());

        let data_dir = std::env::var("CASEFORGE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        Ok(Self {
            data_dir,
            gemini_api_key,
            gemini_model,
        })
    }

    /// Directory holding one workspace per pipeline run.
    pub fn runs_dir(&self) -> PathBuf {
        self.data_dir.join("runs")
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("caseforge"))
        .unwrap_or_else(|| PathBuf::from(".caseforge"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_data_dir() {
        let dir = default_data_dir();
        assert!(dir.to_string_lossy().contains("caseforge"));
    }

    #[test]
    fn test_runs_dir_under_data_dir() {
        let config = AppConfig {
            data_dir: PathBuf::from("/tmp/cf-test"),
            gemini_api_key: "k".to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
        };
        assert_eq!(config.runs_dir(), PathBuf::from("/tmp/cf-test/runs"));
    }
}
