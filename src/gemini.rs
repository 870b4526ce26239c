//! Client for the Gemini generateContent API. All three LLM-backed stages
//! (summary, test cases, script) go through the [`TextModel`] trait so tests
//! can substitute a canned model.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model API returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("model response did not contain any generated text")]
    EmptyResponse,
}

/// One prompt in, one completion out. No conversation state.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

pub struct GeminiClient {
    api_key: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Calls are bounded by a fixed request timeout; there are deliberately
    /// no automatic retries, a failed call fails the stage that issued it.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            GEMINI_BASE_URL, self.model, self.api_key
        );

        let body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": self.temperature,
                "topK": 40,
                "topP": 0.95
            }
        });

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Calling Gemini");

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response_json: serde_json::Value = response.json().await?;
        let text = response_json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or(ModelError::EmptyResponse)?;

        Ok(text.to_string())
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Hands out canned completions in order; an exhausted queue produces
    /// [`ModelError::EmptyResponse`], which doubles as a failure injector.
    pub struct MockModel {
        responses: Mutex<VecDeque<String>>,
    }

    impl MockModel {
        pub fn new(responses: &[&str]) -> Self {
            Self {
                responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            }
        }

        pub fn empty() -> Self {
            Self::new(&[])
        }
    }

    #[async_trait]
    impl TextModel for MockModel {
        async fn generate(&self, _prompt: &str) -> Result<String, ModelError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or(ModelError::EmptyResponse)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MockModel;
    use super::*;

    #[tokio::test]
    async fn test_mock_model_hands_out_responses_in_order() {
        let model = MockModel::new(&["first", "second"]);
        assert_eq!(model.generate("a").await.unwrap(), "first");
        assert_eq!(model.generate("b").await.unwrap(), "second");
        assert!(matches!(
            model.generate("c").await.unwrap_err(),
            ModelError::EmptyResponse
        ));
    }

    #[test]
    fn test_client_construction() {
        let client = GeminiClient::new("test-key", "gemini-2.5-flash").unwrap();
        assert_eq!(client.model(), "gemini-2.5-flash");
    }

    #[tokio::test]
    #[ignore] // requires GEMINI_API_KEY and network access
    async fn test_live_generate() {
        let api_key = std::env::var("GEMINI_API_KEY").unwrap();
        let client = GeminiClient::new(api_key, "gemini-2.5-flash").unwrap();
        let text = client.generate("Reply with the single word: pong").await.unwrap();
        assert!(!text.is_empty());
    }
}
