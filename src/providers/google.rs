use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use super::Translate;

/// Public endpoint of the v2 (basic) API
pub const DEFAULT_ENDPOINT: &str = "https://translation.googleapis.com/language/translate/v2";

/// Upper bound for a single retry delay
const MAX_BACKOFF_MS: u64 = 60_000;

/// Google Cloud Translation client
pub struct GoogleTranslate {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL
    endpoint: String,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

impl std::fmt::Debug for GoogleTranslate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslate")
            .field("endpoint", &self.endpoint)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

/// Translate request body
#[derive(Debug, Serialize)]
pub struct TranslateRequest<'a> {
    /// Text to translate
    pub q: &'a str,
    /// Target language code
    pub target: &'a str,
    /// `text` keeps the API from HTML-escaping the result
    pub format: &'a str,
}

/// Translate response body
#[derive(Debug, Deserialize)]
pub struct TranslateResponse {
    pub data: TranslationList,
}

#[derive(Debug, Deserialize)]
pub struct TranslationList {
    pub translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub translated_text: String,
    #[serde(default)]
    pub detected_source_language: Option<String>,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl GoogleTranslate {
    /// Create a new client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        let endpoint = endpoint.into();
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: if endpoint.is_empty() { DEFAULT_ENDPOINT.to_string() } else { endpoint },
            max_retries: 2,
            backoff_base_ms: 1000,
        }
    }

    /// Set retry behaviour for connection failures and server errors
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Send one request without retrying
    async fn send(&self, text: &str, target_language: &str) -> Result<String, ProviderError> {
        let request = TranslateRequest {
            q: text,
            target: target_language,
            format: "text",
        };

        let response = self.client.post(&self.endpoint)
            .header("X-Goog-Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(classify_error(status, &body));
        }

        let body = response.json::<TranslateResponse>().await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Self::extract_text(body)
    }

    /// Pull the first translation out of a response
    pub fn extract_text(response: TranslateResponse) -> Result<String, ProviderError> {
        response.data.translations.into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| ProviderError::ParseError("Response contained no translations".to_string()))
    }
}

/// Map an HTTP error status to the provider error it stands for
pub fn classify_error(status: StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        // Daily and per-user limits come back as 403 too
        StatusCode::FORBIDDEN if message.to_lowercase().contains("limit") => ProviderError::QuotaExceeded(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::QuotaExceeded(message),
        // Google reports an invalid key as a 400 with this reason
        StatusCode::BAD_REQUEST if message.contains("API key not valid") => {
            ProviderError::AuthenticationError(message)
        }
        _ => ProviderError::ApiError {
            status_code: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl Translate for GoogleTranslate {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.send(text, target_language).await {
                Ok(translation) => {
                    debug!("Google translated {} chars on attempt {}", text.chars().count(), attempt + 1);
                    return Ok(translation);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let backoff_ms = backoff_delay_ms(self.backoff_base_ms, attempt);
                    warn!("Google Translate request failed ({}), retrying in {} ms", e, backoff_ms);
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
                Err(e) => {
                    error!("Google Translate error: {}", e);
                    return Err(e);
                }
            }
        }
    }

    fn name(&self) -> &str {
        "google"
    }
}

/// Exponential delay before retry number `attempt` (1-based), capped
fn backoff_delay_ms(base_ms: u64, attempt: u32) -> u64 {
    let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    base_ms.saturating_mul(factor).min(MAX_BACKOFF_MS)
}
