//! Transport for the Gemini `generateContent` endpoint.
//!
//! Both the tax lookup and the vehicle ranking workflows speak to the same
//! provider/model, so the request envelope, credential handling, and error
//! taxonomy live here. Workflows depend on the [`TextModel`] trait rather
//! than the concrete client so tests can drive them with stubs.

use std::env;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    /// Absent keys surface [`GeminiError::MissingApiKey`] at first use, not
    /// at startup.
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn from_env() -> Self {
        let base_url = env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let timeout = env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(30));

        Self {
            base_url,
            model,
            api_key,
            timeout,
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {0} from generative endpoint")]
    Status(u16),

    #[error("response envelope missing candidate text")]
    MalformedEnvelope,
}

/// Sampling parameters forwarded as the request `generationConfig`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<&'a GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// Seam between the workflows and the generative provider. The concrete
/// implementation is [`GeminiClient`]; tests substitute stubs.
pub trait TextModel: Send + Sync {
    fn generate(
        &self,
        prompt: &str,
        generation: Option<&GenerationConfig>,
    ) -> impl Future<Output = Result<String, GeminiError>> + Send;
}

#[derive(Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, GeminiError> {
        let http = reqwest::Client::builder()
            .user_agent("drivematch/advisor")
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }
}

impl TextModel for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        generation: Option<&GenerationConfig>,
    ) -> Result<String, GeminiError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GeminiError::MissingApiKey)?;

        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: generation,
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .timeout(self.config.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeminiError::Status(status.as_u16()));
        }

        let envelope = response.json::<GenerateContentResponse>().await?;
        envelope.into_text().ok_or(GeminiError::MalformedEnvelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_extracts_first_candidate_text() {
        let raw = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "County: Polk County\nTax: 7.0"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }"#;
        let envelope: GenerateContentResponse = serde_json::from_str(raw).expect("valid envelope");
        assert_eq!(
            envelope.into_text().as_deref(),
            Some("County: Polk County\nTax: 7.0")
        );
    }

    #[test]
    fn envelope_without_candidates_yields_none() {
        let envelope: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": []}"#).expect("valid envelope");
        assert!(envelope.into_text().is_none());
    }

    #[test]
    fn generation_config_serializes_camel_case() {
        let generation = GenerationConfig {
            temperature: Some(0.3),
            top_k: Some(40),
            top_p: Some(0.95),
            max_output_tokens: Some(8192),
        };
        let value = serde_json::to_value(&generation).expect("serializes");
        assert_eq!(value["topK"], 40);
        assert_eq!(value["topP"], 0.95);
        assert_eq!(value["maxOutputTokens"], 8192);
    }

    #[test]
    fn default_config_points_at_flash_model() {
        let config = GeminiConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.base_url.starts_with("https://"));
    }
}
