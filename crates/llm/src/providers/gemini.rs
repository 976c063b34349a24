//! Google Gemini provider (`generateContent` REST endpoint).
//!
//! The API key travels in the `x-goog-api-key` header, never in the URL,
//! and transport errors are stripped of their URL before they are reported.
//! Only the first candidate's first text part is used.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use methodics_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Characters of an error body kept for the log line.
const ERROR_BODY_PREVIEW: usize = 200;

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

/// Gemini API request format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
}

/// Gemini API response format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

/// Gemini LLM client.
pub struct GeminiClient {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client for `model` on the public endpoint.
    pub fn new(model: &str, api_key: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        Self::with_endpoint(
            format!("{}/{}:generateContent", DEFAULT_BASE_URL, model),
            api_key,
            timeout,
        )
    }

    /// Create a client for a full `...:generateContent` URL.
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            client,
        })
    }

    fn to_gemini_request(&self, request: &LlmRequest) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(request.prompt.clone()),
                }],
            }],
            system_instruction: request.system.as_ref().map(|system| GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(system.clone()),
                }],
            }),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                top_p: request.top_p,
            },
        }
    }

    fn convert_response(&self, model: &str, response: GeminiResponse) -> AppResult<LlmResponse> {
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| AppError::Llm("Gemini response has no candidate text".to_string()))?;

        let usage = response.usage_metadata.unwrap_or_default();

        Ok(LlmResponse {
            content: text.trim().to_string(),
            model: model.to_string(),
            usage: LlmUsage::new(usage.prompt_token_count, usage.candidates_token_count),
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(
            "Sending completion request to Gemini ({} prompt chars)",
            request.prompt.chars().count()
        );

        let body = self.to_gemini_request(request);

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AppError::Llm(format!(
                    "Failed to send request to Gemini: {}",
                    e.without_url()
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let preview: String = error_text.chars().take(ERROR_BODY_PREVIEW).collect();
            return Err(AppError::Llm(format!(
                "Gemini API error ({}): {}",
                status, preview
            )));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| {
                AppError::Llm(format!(
                    "Failed to parse Gemini response: {}",
                    e.without_url()
                ))
            })?;

        let converted = self.convert_response(&request.model, gemini_response)?;
        tracing::debug!(
            "Received completion from Gemini ({} tokens)",
            converted.usage.total_tokens
        );
        Ok(converted)
    }
}
