// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock inference adapter for deterministic testing.
//!
//! `MockProvider` answers from a FIFO queue of scripted outcomes, then from
//! an optional handler, then with a default text. Every request is
//! recorded for later assertions.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use botfleet_core::BotfleetError;
use botfleet_core::traits::{InferenceAdapter, PluginAdapter};
use botfleet_core::types::{AdapterType, HealthStatus, InferenceRequest};

type Handler = Arc<dyn Fn(&InferenceRequest) -> Result<String, String> + Send + Sync>;

/// A mock inference collaborator that returns pre-configured outcomes.
#[derive(Clone)]
pub struct MockProvider {
    outcomes: Arc<Mutex<VecDeque<Result<String, String>>>>,
    requests: Arc<Mutex<Vec<InferenceRequest>>>,
    handler: Option<Handler>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new mock provider with an empty queue.
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            handler: None,
            delay: None,
        }
    }

    /// Create a mock provider pre-loaded with successful responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(responses.into_iter().map(Ok).collect())),
            ..Self::new()
        }
    }

    /// Answer requests the queue does not cover with `handler`.
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&InferenceRequest) -> Result<String, String> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Sleep before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful response.
    pub async fn push_response(&self, text: impl Into<String>) {
        self.outcomes.lock().await.push_back(Ok(text.into()));
    }

    /// Queue a failure.
    pub async fn push_error(&self, message: impl Into<String>) {
        self.outcomes.lock().await.push_back(Err(message.into()));
    }

    /// Every request received so far, in order.
    pub async fn requests(&self) -> Vec<InferenceRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, BotfleetError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BotfleetError> {
        Ok(())
    }
}

#[async_trait]
impl InferenceAdapter for MockProvider {
    async fn infer(&self, request: InferenceRequest) -> Result<String, BotfleetError> {
        self.requests.lock().await.push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.outcomes.lock().await.pop_front();
        let outcome = match (scripted, &self.handler) {
            (Some(outcome), _) => outcome,
            (None, Some(handler)) => handler(&request),
            (None, None) => Ok("mock response".to_string()),
        };

        outcome.map_err(|message| BotfleetError::Provider {
            message,
            source: None,
        })
    }
}
