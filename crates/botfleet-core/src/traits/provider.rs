// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inference adapter trait for the external text generation collaborator.

use async_trait::async_trait;

use crate::error::BotfleetError;
use crate::traits::adapter::PluginAdapter;
use crate::types::InferenceRequest;

/// Opaque, fallible text-in/text-out inference call.
///
/// Both the intent classifier and the response generator go through this
/// trait; they differ only in the prompt they send.
#[async_trait]
pub trait InferenceAdapter: PluginAdapter {
    /// Sends the system prompt, the prior turns and the new user text, and
    /// returns the generated text.
    async fn infer(&self, request: InferenceRequest) -> Result<String, BotfleetError>;
}
