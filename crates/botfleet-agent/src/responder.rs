// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply generation under an assembled system prompt.

use std::sync::Arc;

use botfleet_core::InferenceAdapter;
use botfleet_core::types::{HistoryEntry, InferenceRequest};
use tracing::warn;

/// Produces the assistant reply for one user message.
pub struct ResponseGenerator {
    provider: Arc<dyn InferenceAdapter>,
    fallback_reply: String,
}

impl ResponseGenerator {
    pub fn new(provider: Arc<dyn InferenceAdapter>, fallback_reply: impl Into<String>) -> Self {
        Self {
            provider,
            fallback_reply: fallback_reply.into(),
        }
    }

    /// Returns the generated text, or the fallback reply if inference fails.
    pub async fn respond(
        &self,
        user_message: &str,
        system_prompt: &str,
        history: &[HistoryEntry],
    ) -> String {
        let request = InferenceRequest {
            model: None,
            system_prompt: system_prompt.to_string(),
            turns: history.to_vec(),
            user_text: user_message.to_string(),
        };

        match self.provider.infer(request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "response generation failed, sending fallback");
                self.fallback_reply.clone()
            }
        }
    }
}
