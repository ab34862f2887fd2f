// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable store traits.
//!
//! Each record family gets its own trait so components can be read against
//! the narrowest interface; [`StorageAdapter`] gathers them for backends.

use async_trait::async_trait;

use crate::error::BotfleetError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    CommandContext, Exchange, Message, NewTenant, Role, Session, Tenant, TenantId, TenantUpdate,
    User,
};

/// Tenant records.
#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn list_tenants(&self) -> Result<Vec<Tenant>, BotfleetError>;

    async fn get_tenant(&self, id: TenantId) -> Result<Option<Tenant>, BotfleetError>;

    /// Fails if the token is already used by another tenant.
    async fn create_tenant(&self, tenant: &NewTenant) -> Result<Tenant, BotfleetError>;

    /// Applies a partial update. Returns `None` if the tenant does not exist.
    async fn update_tenant(
        &self,
        id: TenantId,
        update: &TenantUpdate,
    ) -> Result<Option<Tenant>, BotfleetError>;

    /// Deletes the tenant together with its contexts, sessions and messages.
    async fn delete_tenant(&self, id: TenantId) -> Result<bool, BotfleetError>;
}

/// Command contexts and per-tenant base prompts.
#[async_trait]
pub trait ContextStore: Send + Sync {
    async fn get_context(
        &self,
        tenant_id: TenantId,
        command: &str,
    ) -> Result<Option<CommandContext>, BotfleetError>;

    async fn list_contexts(&self, tenant_id: TenantId)
    -> Result<Vec<CommandContext>, BotfleetError>;

    /// Inserts or replaces the context keyed by (tenant, command).
    async fn upsert_context(&self, context: &CommandContext) -> Result<(), BotfleetError>;

    async fn delete_context(&self, tenant_id: TenantId, command: &str)
    -> Result<bool, BotfleetError>;

    /// Returns `None` if the tenant does not exist.
    async fn base_prompt(&self, tenant_id: TenantId) -> Result<Option<String>, BotfleetError>;

    async fn set_base_prompt(&self, tenant_id: TenantId, prompt: &str)
    -> Result<bool, BotfleetError>;
}

/// Per-(user, tenant) session state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the stored session, or [`Session::fresh`] if none exists. Never fails
    /// for a missing row.
    async fn get_session(&self, user_id: &str, tenant_id: TenantId)
    -> Result<Session, BotfleetError>;

    /// Upserts keyed on (user, tenant). Not serialized per key.
    async fn save_session(&self, session: &Session) -> Result<(), BotfleetError>;

    /// Appends the user and assistant messages to the log and saves the
    /// extended session, all in one transaction.
    async fn record_exchange(&self, exchange: &Exchange) -> Result<(), BotfleetError>;

    /// Deletes the session and the message rows of exactly this (user, tenant) pair.
    async fn reset_conversation(&self, user_id: &str, tenant_id: TenantId)
    -> Result<(), BotfleetError>;
}

/// Global user registry.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates the user on first contact, refreshing nickname and username otherwise.
    async fn ensure_user(
        &self,
        user_id: &str,
        nickname: &str,
        username: Option<&str>,
    ) -> Result<(), BotfleetError>;

    /// Sets the last message date to now.
    async fn touch_user(&self, user_id: &str) -> Result<(), BotfleetError>;

    async fn list_users(&self) -> Result<Vec<User>, BotfleetError>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, BotfleetError>;

    /// Returns false if the user does not exist.
    async fn set_user_context(
        &self,
        user_id: &str,
        context: Option<&str>,
    ) -> Result<bool, BotfleetError>;
}

/// Append-only message log.
#[async_trait]
pub trait MessageLog: Send + Sync {
    async fn append_message(
        &self,
        user_id: &str,
        tenant_id: TenantId,
        role: Role,
        content: &str,
    ) -> Result<i64, BotfleetError>;

    /// Messages of a user ordered by creation time, optionally for one tenant only.
    async fn messages_for_user(
        &self,
        user_id: &str,
        tenant_id: Option<TenantId>,
    ) -> Result<Vec<Message>, BotfleetError>;
}

/// A complete persistence backend.
///
/// Storage adapters manage the lifecycle of the database connection and
/// implement every record store.
#[async_trait]
pub trait StorageAdapter:
    PluginAdapter + TenantStore + ContextStore + SessionStore + UserStore + MessageLog
{
    /// Initializes the storage backend (migrations, connection).
    async fn initialize(&self) -> Result<(), BotfleetError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), BotfleetError>;
}
