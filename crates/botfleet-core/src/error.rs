// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Botfleet backend.

use thiserror::Error;

/// The primary error type used across all Botfleet adapter traits and core operations.
#[derive(Debug, Error)]
pub enum BotfleetError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Messaging transport errors (invalid token, send failure, closed listener).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Inference collaborator errors (HTTP failure, malformed response, empty choice list).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A keyed record does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// Listener lifecycle errors (inactive tenant, token already bound, tenant not running).
    #[error("registry error: {0}")]
    Registry(String),

    /// Rejected operator input (empty name, empty token, malformed import).
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BotfleetError {
    /// Shorthand for a [`BotfleetError::NotFound`] on a tenant id.
    pub fn tenant_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity: "tenant".into(),
            key: id.to_string(),
        }
    }
}
