// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenRouter inference adapter for Botfleet.
//!
//! Implements [`InferenceAdapter`] over the OpenAI-compatible chat
//! completions API. The same adapter serves both the intent classifier and
//! the response generator.

pub mod client;
pub mod types;

use async_trait::async_trait;
use botfleet_config::model::InferenceConfig;
use botfleet_core::error::BotfleetError;
use botfleet_core::traits::{InferenceAdapter, PluginAdapter};
use botfleet_core::types::{AdapterType, HealthStatus, InferenceRequest};
use tracing::{debug, info};

use crate::client::OpenRouterClient;
use crate::types::{ChatMessage, ChatRequest};

/// Environment variable consulted when `inference.api_key` is unset.
const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// OpenRouter provider implementing [`InferenceAdapter`].
pub struct OpenRouterProvider {
    client: OpenRouterClient,
    default_model: String,
}

impl OpenRouterProvider {
    /// Creates the provider. API key resolution: config, then
    /// `OPENROUTER_API_KEY`, then error.
    pub fn new(config: &InferenceConfig) -> Result<Self, BotfleetError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = OpenRouterClient::new(&api_key, config)?;
        info!(model = %config.model, base_url = %config.base_url, "inference provider initialized");
        Ok(Self {
            client,
            default_model: config.model.clone(),
        })
    }

    /// Builds the wire request: system prompt, prior turns, then the new user text.
    fn to_chat_request(&self, request: &InferenceRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(request.turns.len() + 2);
        messages.push(ChatMessage::new("system", request.system_prompt.clone()));
        messages.extend(
            request
                .turns
                .iter()
                .map(|t| ChatMessage::new(t.role.to_string(), t.content.clone())),
        );
        messages.push(ChatMessage::new("user", request.user_text.clone()));

        ChatRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.default_model.clone()),
            messages,
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, BotfleetError> {
        // Avoid spending tokens on health checks.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BotfleetError> {
        debug!("OpenRouter provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl InferenceAdapter for OpenRouterProvider {
    async fn infer(&self, request: InferenceRequest) -> Result<String, BotfleetError> {
        let chat = self.to_chat_request(&request);
        let response = self.client.complete(&chat).await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| BotfleetError::Provider {
                message: "response contained no choices".into(),
                source: None,
            })
    }
}

fn resolve_api_key(config_key: &Option<String>) -> Result<String, BotfleetError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            BotfleetError::Config(format!(
                "inference API key not found. Set inference.api_key in config or {API_KEY_ENV}."
            ))
        })
}
