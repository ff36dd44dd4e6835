//! Google Gemini API provider implementation.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;

use crate::config::LlmConfig;
use crate::error::{ReportError, Result};

use super::provider::{Completion, TextGenerator, TokenUsage};

/// Gemini API base URL.
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini text generation provider.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    api_base: String,
    config: LlmConfig,
}

impl GeminiProvider {
    /// Create a provider with the given API key and default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, LlmConfig::default())
    }

    /// Create a provider with custom configuration.
    pub fn with_config(api_key: impl Into<String>, config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ReportError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            api_base: API_BASE.to_string(),
            config,
        })
    }

    /// Point the provider at a different API base (e.g. a proxy).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.api_base, self.config.model)
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| ReportError::Config(format!("Invalid API key: {}", e)))?,
        );
        Ok(headers)
    }
}

impl TextGenerator for GeminiProvider {
    fn generate(&self, prompt: &str) -> Result<Completion> {
        let body = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ],
            "generationConfig": {
                "temperature": self.config.temperature,
                "maxOutputTokens": self.config.max_tokens
            }
        });

        let response = self
            .client
            .post(self.endpoint())
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .map_err(|e| ReportError::Generation(format!("API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(ReportError::Generation(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let api_response: ApiResponse = response
            .json()
            .map_err(|e| ReportError::Generation(format!("Failed to parse API response: {}", e)))?;

        api_response.into_completion()
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
    total_token_count: Option<u64>,
}

impl ApiResponse {
    fn into_completion(self) -> Result<Completion> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ReportError::Generation("No text in API response".to_string()));
        }

        let usage = self.usage_metadata.and_then(|u| {
            TokenUsage::from_parts(
                u.prompt_token_count,
                u.candidates_token_count,
                u.total_token_count,
            )
        });

        Ok(Completion { text, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_with_usage() {
        let body = r##"{
            "candidates": [{"content": {"parts": [{"text": "# Laporan"}, {"text": " lengkap"}]}}],
            "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 80, "totalTokenCount": 200}
        }"##;
        let completion = serde_json::from_str::<ApiResponse>(body)
            .unwrap()
            .into_completion()
            .unwrap();

        assert_eq!(completion.text, "# Laporan lengkap");
        assert_eq!(
            completion.usage,
            Some(TokenUsage {
                prompt_tokens: 120,
                output_tokens: 80,
                total_tokens: 200
            })
        );
    }

    #[test]
    fn test_partial_usage_is_dropped() {
        let body = r#"{
            "candidates": [{"content": {"parts": [{"text": "ok"}]}}],
            "usageMetadata": {"promptTokenCount": 120, "totalTokenCount": 200}
        }"#;
        let completion = serde_json::from_str::<ApiResponse>(body)
            .unwrap()
            .into_completion()
            .unwrap();
        assert_eq!(completion.usage, None);
    }

    #[test]
    fn test_empty_candidates_is_error() {
        let response: ApiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(matches!(response.into_completion(), Err(ReportError::Generation(_))));
    }

    #[test]
    fn test_endpoint_uses_model() {
        let provider = GeminiProvider::new("key").unwrap().with_api_base("http://proxy/models/");
        assert_eq!(
            provider.endpoint(),
            "http://proxy/models/gemini-2.5-flash:generateContent"
        );
    }
}
