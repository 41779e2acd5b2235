//! Gemini video analysis provider.
//!
//! Sends the video inline (base64) to `generateContent` together with the
//! analysis instruction and system prompt, asks for a JSON response and
//! parses the text of the first candidate part.

use super::{ProviderError, VideoAnalysisProvider, VideoInput};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Upstream error bodies are cut to this many characters in error messages.
const MAX_ERROR_BODY_CHARS: usize = 1000;

/// The key travels in a header so it never appears in a request URL.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
    pub instruction: String,
    pub system_instruction: String,
}

/// Gemini video provider.
pub struct GeminiVideoProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiVideoProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Build the API URL for the given model and method.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.model,
            method
        )
    }

    /// Build the request body. Called once per attempt.
    fn build_request<'a>(&'a self, video: &VideoInput<'a>) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    Part::Text {
                        text: &self.config.instruction,
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: video.mime_type,
                            data: video.data_base64,
                        },
                    },
                ],
            }],
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text {
                    text: &self.config.system_instruction,
                }],
            },
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        }
    }

    /// Error messages end up in client responses, so the URL is stripped.
    fn map_send_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.config.timeout)
        } else {
            ProviderError::NetworkError(err.without_url().to_string())
        }
    }
}

#[async_trait]
impl VideoAnalysisProvider for GeminiVideoProvider {
    async fn analyze(&self, video: &VideoInput<'_>) -> Result<Value, ProviderError> {
        let request = self.build_request(video);
        let url = self.api_url("generateContent");

        tracing::debug!(
            model = %self.config.model,
            mime_type = %video.mime_type,
            payload_len = video.data_base64.len(),
            "Sending video to Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let body = truncate(&error_text, MAX_ERROR_BODY_CHARS);

            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(ProviderError::RateLimited(body));
            }

            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        let envelope: GenerateContentResponse = serde_json::from_slice(&bytes).map_err(|e| {
            ProviderError::MalformedResponse(format!("Failed to parse response envelope: {}", e))
        })?;

        extract_result(envelope)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }
        if self.config.model.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini model not configured".to_string(),
            ));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// Pull `candidates[0].content.parts[0].text` out of the envelope and parse
/// it as JSON.
fn extract_result(envelope: GenerateContentResponse) -> Result<Value, ProviderError> {
    let candidate = match envelope.candidates.into_iter().next() {
        Some(candidate) => candidate,
        None => {
            let reason = envelope
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map(|r| format!(" (prompt blocked: {})", r))
                .unwrap_or_default();
            return Err(ProviderError::MalformedResponse(format!(
                "response has no candidates{}",
                reason
            )));
        }
    };

    let finish_reason = candidate.finish_reason;
    let text = candidate
        .content
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| {
            ProviderError::MalformedResponse(match finish_reason.as_deref() {
                Some(reason) => {
                    format!("first candidate has no text part (finish reason: {})", reason)
                }
                None => "first candidate has no text part".to_string(),
            })
        })?;

    serde_json::from_str(&text).map_err(|e| ProviderError::InvalidJson(e.to_string()))
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    system_instruction: Content<'a>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
