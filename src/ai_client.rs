//! # AI Client Module
//!
//! This module talks to a Gemini `generateContent` endpoint, either through the
//! Generative Language API (API key) or through Vertex AI (OAuth bearer token).
//!
//! ## Features
//!
//! - Multimodal prompts: text, file references (video links) and inline base64 data (audio)
//! - Per-call timeout
//! - Retry with exponential backoff and jitter for transient failures
//! - Circuit breaker that fails fast after repeated failures
//!
//! The rest of the crate depends on the [`TextGenerator`] trait, so tests can swap in
//! an in-process fake.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::config::{AiConfig, AiProvider, RecoveryConfig};
use crate::errors::AiError;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// One part of a multimodal prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContentPart {
    Text {
        text: String,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub file_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Base64-encoded payload
    pub data: String,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Reference to a remote file, such as a video link
    pub fn file_uri(uri: impl Into<String>) -> Self {
        ContentPart::FileData {
            file_data: FileData {
                mime_type: None,
                file_uri: uri.into(),
            },
        }
    }

    /// Raw bytes sent inline, base64-encoded
    pub fn inline_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        ContentPart::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: STANDARD.encode(bytes),
            },
        }
    }
}

/// Something that turns a multimodal prompt into model text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, parts: Vec<ContentPart>) -> Result<String, AiError>;
}

// ============================================================================
// API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    candidate_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ============================================================================
// Client Implementation
// ============================================================================

/// `generateContent` client for Gemini and Vertex AI
pub struct GeminiClient {
    client: Client,
    config: AiConfig,
    breaker: CircuitBreaker,
}

impl GeminiClient {
    /// Create a client, rejecting blank credentials up front
    pub fn new(config: AiConfig) -> Result<Self, AiError> {
        match &config.provider {
            AiProvider::Gemini { api_key } if api_key.trim().is_empty() => {
                return Err(AiError::Configuration("Gemini API key is empty".to_string()));
            }
            AiProvider::Vertex {
                project_id,
                access_token,
                ..
            } if project_id.trim().is_empty() || access_token.trim().is_empty() => {
                return Err(AiError::Configuration(
                    "Vertex project id and access token are required".to_string(),
                ));
            }
            _ => {}
        }

        Ok(Self {
            client: Client::new(),
            breaker: CircuitBreaker::new(&config.recovery),
            config,
        })
    }

    /// Endpoint URL for the configured provider and model
    pub fn endpoint_url(&self) -> String {
        let model = &self.config.model;
        match &self.config.provider {
            AiProvider::Gemini { .. } => format!("{GEMINI_BASE_URL}/models/{model}:generateContent"),
            AiProvider::Vertex {
                project_id,
                location,
                ..
            } => format!(
                "https://{location}-aiplatform.googleapis.com/v1/projects/{project_id}/locations/{location}/publishers/google/models/{model}:generateContent"
            ),
        }
    }

    fn build_request(&self, parts: Vec<ContentPart>) -> GenerateRequest {
        GenerateRequest {
            contents: vec![RequestContent { role: "user", parts }],
            generation_config: self.config.temperature.map(|temperature| GenerationConfig {
                temperature,
                candidate_count: 1,
            }),
        }
    }

    async fn send_once(&self, request: &GenerateRequest) -> Result<String, AiError> {
        let builder = self.client.post(self.endpoint_url()).json(request);
        let builder = match &self.config.provider {
            AiProvider::Gemini { api_key } => builder.header(API_KEY_HEADER, api_key),
            AiProvider::Vertex { access_token, .. } => builder.bearer_auth(access_token),
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<GenerateResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .map_or(body, |e| e.message);
            error!(status = %status, "Model endpoint returned an error");
            return Err(AiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)?;
        extract_text(parsed)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    #[instrument(skip(self, parts), fields(model = %self.config.model, parts = parts.len()))]
    async fn generate(&self, parts: Vec<ContentPart>) -> Result<String, AiError> {
        if self.breaker.is_open() {
            warn!("Circuit breaker open, refusing model call");
            return Err(AiError::CircuitOpen);
        }

        let request = self.build_request(parts);
        let recovery = &self.config.recovery;
        let timeout = Duration::from_secs(recovery.operation_timeout_secs);
        let mut attempt = 0;

        loop {
            let result = match tokio::time::timeout(timeout, self.send_once(&request)).await {
                Ok(result) => result,
                Err(_) => Err(AiError::Timeout(recovery.operation_timeout_secs)),
            };

            match result {
                Ok(text) => {
                    self.breaker.record_success();
                    debug!(attempt, response_length = text.len(), "Model call succeeded");
                    return Ok(text);
                }
                Err(e) if e.is_transient() && attempt < recovery.max_retries => {
                    let delay = retry_delay(recovery, attempt);
                    warn!(attempt, error = %e, delay_ms = delay.as_millis() as u64, "Model call failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    self.breaker.record_failure();
                    error!(attempt, error = %e, failures = self.breaker.failure_count(), "Model call failed");
                    return Err(e);
                }
            }
        }
    }
}

fn extract_text(response: GenerateResponse) -> Result<String, AiError> {
    if let Some(error) = response.error {
        return Err(AiError::Api {
            status: 200,
            message: error.message,
        });
    }

    let candidate = response
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or(AiError::EmptyResponse)?;

    if let Some(reason) = &candidate.finish_reason {
        if reason != "STOP" {
            info!(finish_reason = %reason, "Model stopped early");
        }
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(text)
}

/// Exponential backoff capped at the configured maximum, plus up to 25% jitter
pub fn retry_delay(config: &RecoveryConfig, attempt: u32) -> Duration {
    let exponential = config
        .base_retry_delay_ms
        .saturating_mul(1u64 << attempt.min(16));
    let capped = exponential.min(config.max_retry_delay_ms);
    let jitter = rand::thread_rng().gen_range(0..=capped / 4);
    Duration::from_millis(capped.saturating_add(jitter))
}
