// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the stores, the pipeline, and the adapters.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Command every conversation starts in and falls back to.
pub const START_COMMAND: &str = "/start";

/// Literal control token that wipes a conversation instead of answering it.
pub const RESET_COMMAND: &str = "/reset";

/// Section assigned to a command context when none is given.
pub const DEFAULT_SECTION: &str = "general";

/// Unique identifier of a tenant (one bot identity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub i64);

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a message delivered by a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Provider,
    Storage,
}

// --- Tenants ---

/// One independently configured bot identity served by the shared backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    /// Messaging transport token. Unique across tenants.
    pub token: String,
    /// Lowest-precedence layer of every assembled prompt.
    pub base_prompt: String,
    pub active: bool,
    pub created_at: String,
}

/// Fields needed to create a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTenant {
    pub name: String,
    pub token: String,
    #[serde(default)]
    pub base_prompt: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// Partial tenant update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantUpdate {
    pub name: Option<String>,
    pub token: Option<String>,
    pub base_prompt: Option<String>,
    pub active: Option<bool>,
}

impl TenantUpdate {
    /// Returns true when applying this update to `current` changes the
    /// listener binding (token or active flag).
    pub fn affects_listener(&self, current: &Tenant) -> bool {
        let token_changed = self
            .token
            .as_deref()
            .is_some_and(|t| t != current.token);
        let active_changed = self.active.is_some_and(|a| a != current.active);
        token_changed || active_changed
    }
}

/// Tenant as shown to operators: the token is masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSummary {
    pub id: TenantId,
    pub name: String,
    pub token: String,
    pub active: bool,
    pub running: bool,
    pub created_at: String,
}

// --- Contexts ---

/// Prompt triple keyed by (tenant, command).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandContext {
    pub tenant_id: TenantId,
    pub command: String,
    /// Instruction handed to the classifier while this command is current.
    pub classifier_prompt: String,
    /// Instruction contributed to the generation prompt when this command is selected.
    pub response_prompt: String,
    pub section: String,
}

// --- Conversations ---

/// Author of a history entry or logged message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of a session history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl HistoryEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Per-(user, tenant) conversation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub tenant_id: TenantId,
    /// Command that currently governs context assembly.
    pub last_command: String,
    pub history: Vec<HistoryEntry>,
    /// `None` until the session is first persisted.
    pub updated_at: Option<String>,
}

impl Session {
    /// The state of a conversation that has never been persisted.
    pub fn fresh(user_id: impl Into<String>, tenant_id: TenantId) -> Self {
        Self {
            user_id: user_id.into(),
            tenant_id,
            last_command: START_COMMAND.to_string(),
            history: Vec::new(),
            updated_at: None,
        }
    }

    /// Current command, falling back to `/start` when unset.
    pub fn current_command(&self) -> &str {
        let trimmed = self.last_command.trim();
        if trimmed.is_empty() {
            START_COMMAND
        } else {
            trimmed
        }
    }
}

/// The writes produced by one pipeline run, persisted together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub user_id: String,
    pub tenant_id: TenantId,
    pub new_command: String,
    /// History as it was loaded, before this exchange.
    pub prior_history: Vec<HistoryEntry>,
    pub user_text: String,
    pub reply: String,
}

impl Exchange {
    /// History after appending the user message and the reply.
    pub fn next_history(&self) -> Vec<HistoryEntry> {
        let mut history = self.prior_history.clone();
        history.push(HistoryEntry::user(self.user_text.clone()));
        history.push(HistoryEntry::assistant(self.reply.clone()));
        history
    }
}

/// A person talking to one or more tenants. Global across tenants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub nickname: String,
    pub username: Option<String>,
    /// Free text appended last to every prompt assembled for this user.
    pub user_context: Option<String>,
    pub registration_date: String,
    pub last_message_date: Option<String>,
}

/// One row of the append-only message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub user_id: String,
    pub tenant_id: TenantId,
    pub role: Role,
    pub content: String,
    pub created_at: String,
}

// --- Channel types ---

/// A message received by a tenant listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Chat the message arrived in. Doubles as the user id.
    pub chat_id: String,
    pub sender_name: String,
    pub sender_handle: Option<String>,
    pub text: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

/// Markup the transport should apply to an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    #[default]
    Plain,
    Html,
}

/// A message to be delivered through a tenant's channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: String,
    pub content: String,
    pub format: TextFormat,
}

impl OutboundMessage {
    pub fn plain(chat_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            content: content.into(),
            format: TextFormat::Plain,
        }
    }

    pub fn html(chat_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            content: content.into(),
            format: TextFormat::Html,
        }
    }
}

/// Outcome of a broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastReport {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
}

// --- Inference types ---

/// One call to the inference collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceRequest {
    /// Overrides the adapter's default model when set.
    pub model: Option<String>,
    pub system_prompt: String,
    /// Prior turns, oldest first.
    pub turns: Vec<HistoryEntry>,
    pub user_text: String,
}
