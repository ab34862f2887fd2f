// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Botfleet backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Botfleet configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotfleetConfig {
    /// Process-level settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Inference collaborator settings.
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Conversation pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Operator notification channel.
    #[serde(default)]
    pub operator: OperatorConfig,

    /// First-run tenant seeding.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("botfleet").join("botfleet.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("botfleet.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// OpenAI-compatible chat completion endpoint (OpenRouter by default).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InferenceConfig {
    /// Bearer key. `None` requires `OPENROUTER_API_KEY` in the environment.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL; `/chat/completions` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for both classification and generation.
    #[serde(default = "default_model")]
    pub model: String,

    /// Optional `HTTP-Referer` attribution header.
    #[serde(default)]
    pub referer: Option<String>,

    /// Optional `X-Title` attribution header.
    #[serde(default)]
    pub title: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries on 429/5xx. Zero keeps every pipeline stage single-shot.
    #[serde(default)]
    pub max_retries: u32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            referer: None,
            title: None,
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
        }
    }
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "google/gemini-2.5-flash".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Conversation pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Reply used when generation fails.
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,

    /// Reply sent when the pipeline fails on persistence or send.
    #[serde(default = "default_error_reply")]
    pub error_reply: String,

    /// Confirmation sent after `/reset`.
    #[serde(default = "default_reset_reply")]
    pub reset_reply: String,

    /// Serialize pipeline runs per (user, tenant) to prevent lost session updates.
    #[serde(default = "default_serialize_sessions")]
    pub serialize_sessions: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fallback_reply: default_fallback_reply(),
            error_reply: default_error_reply(),
            reset_reply: default_reset_reply(),
            serialize_sessions: default_serialize_sessions(),
        }
    }
}

fn default_fallback_reply() -> String {
    "Sorry, I could not come up with an answer right now. Please try again later.".to_string()
}

fn default_error_reply() -> String {
    "An error occurred, please try again later.".to_string()
}

fn default_reset_reply() -> String {
    "Session reset! Let's start over. How can I help?".to_string()
}

fn default_serialize_sessions() -> bool {
    true
}

/// Operator notification bot. Both fields must be set to enable it.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OperatorConfig {
    /// Token of the bot that posts notifications.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Chat that receives notifications.
    #[serde(default)]
    pub chat_id: Option<String>,
}

impl OperatorConfig {
    /// True when notifications can be delivered.
    pub fn is_enabled(&self) -> bool {
        self.bot_token.as_deref().is_some_and(|t| !t.is_empty())
            && self.chat_id.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// Seeding of the first tenant on an empty database.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapConfig {
    /// Token for the default tenant. `None` disables seeding.
    #[serde(default)]
    pub default_token: Option<String>,

    /// Name given to the default tenant.
    #[serde(default = "default_tenant_name")]
    pub default_name: String,

    /// JSON contexts file imported into the default tenant.
    #[serde(default)]
    pub contexts_file: Option<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            default_token: None,
            default_name: default_tenant_name(),
            contexts_file: None,
        }
    }
}

fn default_tenant_name() -> String {
    "Default bot".to_string()
}
