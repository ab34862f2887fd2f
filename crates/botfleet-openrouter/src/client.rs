// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat completions.
//!
//! Provides [`OpenRouterClient`] which handles request construction,
//! bearer authentication, attribution headers, and optional retry of
//! transient errors.

use std::time::Duration;

use botfleet_config::model::InferenceConfig;
use botfleet_core::BotfleetError;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

/// HTTP client for chat completion calls.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
}

impl OpenRouterClient {
    /// Creates a client posting to `{base_url}/chat/completions`.
    pub fn new(api_key: &str, config: &InferenceConfig) -> Result<Self, BotfleetError> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, header_value("Authorization", &format!("Bearer {api_key}"))?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(referer) = config.referer.as_deref().filter(|r| !r.is_empty()) {
            headers.insert("http-referer", header_value("HTTP-Referer", referer)?);
        }
        if let Some(title) = config.title.as_deref().filter(|t| !t.is_empty()) {
            headers.insert("x-title", header_value("X-Title", title)?);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BotfleetError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            max_retries: config.max_retries,
        })
    }

    /// Sends one completion request.
    ///
    /// Transient statuses (429, 500, 502, 503) are retried up to
    /// `max_retries` times with a one-second pause.
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, BotfleetError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying completion request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .json(request)
                .send()
                .await
                .map_err(|e| BotfleetError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "completion response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| BotfleetError::Provider {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return serde_json::from_str(&body).map_err(|e| BotfleetError::Provider {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            let error = BotfleetError::Provider {
                message: describe_error(status, &body),
                source: None,
            };

            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, "transient error, will retry");
                last_error = Some(error);
                continue;
            }
            return Err(error);
        }

        Err(last_error.unwrap_or_else(|| BotfleetError::Provider {
            message: "completion request failed after retries".into(),
            source: None,
        }))
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, BotfleetError> {
    HeaderValue::from_str(value)
        .map_err(|e| BotfleetError::Config(format!("invalid {name} header value: {e}")))
}

fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api_err) => format!("inference API error ({status}): {}", api_err.error.message),
        Err(_) => format!("API returned {status}: {body}"),
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}
