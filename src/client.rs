//! Model Client
//!
//! The external text-generation service behind a trait seam, so the
//! orchestrator and tests depend on `dyn ModelClient` rather than a
//! concrete provider. The production adapter speaks a generateContent-style
//! HTTP API and classifies every failure into the error taxonomy before it
//! escapes.

use crate::error::{BoardError, ErrorKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CallOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReply {
    pub content: String,
    pub model: String,
    pub provider: String,
    pub timestamp: DateTime<Utc>,
    pub usage: Usage,
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    fn provider_name(&self) -> &str;

    /// One prompt in, one reply out, or a classified [`BoardError`].
    /// Implementations classify their own failures; callers never see a
    /// raw transport error.
    async fn call(&self, prompt: &str, options: &CallOptions) -> Result<ModelReply, BoardError>;

    /// Cheap availability probe for health checks. Must not panic.
    async fn healthy(&self) -> bool {
        true
    }
}

/// HTTP adapter for a generateContent-style endpoint.
pub struct HttpModelClient {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    model: String,
}

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

impl HttpModelClient {
    /// Build from the environment. `.env` is honored; a missing key is a
    /// configuration error, not something to discover on the first call.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let api_key = env::var("GEMINI_API_KEY")
            .context("GEMINI_API_KEY not found in .env or environment")?;
        Ok(Self::new(api_key, DEFAULT_BASE_URL, DEFAULT_MODEL))
    }

    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    fn classify_status(status: reqwest::StatusCode, body: &str) -> BoardError {
        let kind = match status.as_u16() {
            401 | 403 => ErrorKind::AuthenticationError,
            429 => {
                if body.to_lowercase().contains("quota") {
                    ErrorKind::QuotaExceeded
                } else {
                    ErrorKind::RateLimited
                }
            }
            408 | 504 => ErrorKind::ResponseTimeout,
            500..=599 => ErrorKind::ApiUnavailable,
            _ => ErrorKind::ServiceUnavailable,
        };
        // Response bodies can carry key material on auth failures; keep
        // only the status line for those.
        let detail = if kind == ErrorKind::AuthenticationError {
            format!("provider returned {}", status)
        } else {
            format!("provider returned {}: {}", status, truncate(body, 200))
        };
        BoardError::new(kind, detail)
    }

    fn classify_transport(err: &reqwest::Error) -> BoardError {
        let kind = if err.is_timeout() {
            ErrorKind::ResponseTimeout
        } else if err.is_connect() || err.is_request() {
            ErrorKind::NetworkError
        } else if err.is_decode() {
            ErrorKind::InvalidResponse
        } else {
            ErrorKind::UnknownError
        };
        BoardError::new(kind, err.to_string())
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    async fn call(&self, prompt: &str, options: &CallOptions) -> Result<ModelReply, BoardError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": options.temperature,
                "maxOutputTokens": options.max_tokens,
            }
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(options.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Self::classify_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, &body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| BoardError::new(ErrorKind::InvalidResponse, e.to_string()))?;

        let content = extract_text(&body).ok_or_else(|| {
            BoardError::new(ErrorKind::InvalidResponse, "no text candidate in response body")
        })?;

        Ok(ModelReply {
            content,
            model: self.model.clone(),
            provider: self.provider_name().to_string(),
            timestamp: Utc::now(),
            usage: extract_usage(&body),
        })
    }

    async fn healthy(&self) -> bool {
        let url = format!("{}/models/{}", self.base_url, self.model);
        match self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

fn extract_text(body: &Value) -> Option<String> {
    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(|s| s.to_string())
}

fn extract_usage(body: &Value) -> Usage {
    let meta = &body["usageMetadata"];
    Usage {
        prompt_tokens: meta["promptTokenCount"].as_u64().unwrap_or(0) as u32,
        completion_tokens: meta["candidatesTokenCount"].as_u64().unwrap_or(0) as u32,
        total_tokens: meta["totalTokenCount"].as_u64().unwrap_or(0) as u32,
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "hello" }] } }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 3, "totalTokenCount": 15 }
        });
        assert_eq!(extract_text(&body).unwrap(), "hello");
        let usage = extract_usage(&body);
        assert_eq!(usage.total_tokens, 15);
        assert_eq!(usage.prompt_tokens, 12);
    }

    #[test]
    fn test_extract_text_missing_is_none() {
        let body = json!({ "candidates": [] });
        assert!(extract_text(&body).is_none());
    }

    #[test]
    fn test_status_classification() {
        let cases = [
            (401, ErrorKind::AuthenticationError),
            (403, ErrorKind::AuthenticationError),
            (429, ErrorKind::RateLimited),
            (500, ErrorKind::ApiUnavailable),
            (503, ErrorKind::ApiUnavailable),
            (504, ErrorKind::ResponseTimeout),
            (418, ErrorKind::ServiceUnavailable),
        ];
        for (code, kind) in cases {
            let status = reqwest::StatusCode::from_u16(code).unwrap();
            let err = HttpModelClient::classify_status(status, "");
            assert_eq!(err.kind, kind, "status {code}");
        }
    }

    #[test]
    fn test_quota_sniffed_from_429_body() {
        let status = reqwest::StatusCode::from_u16(429).unwrap();
        let err = HttpModelClient::classify_status(status, "daily quota exceeded for project");
        assert_eq!(err.kind, ErrorKind::QuotaExceeded);
    }

    #[test]
    fn test_auth_error_hides_body() {
        let status = reqwest::StatusCode::from_u16(401).unwrap();
        let err = HttpModelClient::classify_status(status, "api key ABC123 rejected");
        assert!(!err.message.contains("ABC123"));
    }

    #[test]
    fn test_call_options_defaults() {
        let options = CallOptions::default();
        assert_eq!(options.max_tokens, 1024);
        assert_eq!(options.timeout, Duration::from_secs(30));
    }
}
