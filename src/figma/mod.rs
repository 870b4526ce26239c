//! Figma REST client and the design-tree extraction that turns a fetched
//! file into prompt-ready page/frame/element summaries.

pub mod extract;

pub use extract::{extract_pages, FrameSummary, ImportantElement, PageSummary};

use std::time::Duration;

use thiserror::Error;

const FIGMA_BASE_URL: &str = "https://api.figma.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum DesignError {
    #[error("design API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("design API returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("design document is malformed: {0}")]
    MalformedDocument(String),
}

/// Thin fetch-only client; the token travels per call because it arrives with
/// each pipeline trigger rather than living in the process environment.
pub struct Client {
    http: reqwest::Client,
}

impl Client {
    pub fn new() -> Result<Self, DesignError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }

    /// Fetch the raw file JSON. Structural validation happens in
    /// [`extract_pages`], not here.
    pub async fn fetch_file(
        &self,
        token: &str,
        file_key: &str,
    ) -> Result<serde_json::Value, DesignError> {
        let url = format!("{}/files/{}", FIGMA_BASE_URL, file_key);

        tracing::debug!(file_key, "Fetching Figma file");

        let response = self
            .http
            .get(&url)
            .header("X-Figma-Token", token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DesignError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

/// Accepts either a bare file key or a figma.com `/file/<key>/...` or
/// `/design/<key>/...` URL and yields the key, or `None` when neither form
/// can be read.
pub fn parse_file_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    match url::Url::parse(trimmed) {
        Ok(parsed) => {
            let mut segments = parsed.path_segments()?;
            while let Some(segment) = segments.next() {
                if segment == "file" || segment == "design" {
                    return segments
                        .next()
                        .filter(|key| !key.is_empty())
                        .map(|key| key.to_string());
                }
            }
            None
        }
        // Not a URL at all: treat the input as the key itself.
        Err(_) => Some(trimmed.to_string()),
    }
}
