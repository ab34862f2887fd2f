// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the store traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use botfleet_config::model::StorageConfig;
use botfleet_core::types::{
    CommandContext, Exchange, Message, NewTenant, Role, Session, Tenant, TenantId, TenantUpdate,
    User,
};
use botfleet_core::{
    AdapterType, BotfleetError, ContextStore, HealthStatus, MessageLog, PluginAdapter,
    SessionStore, StorageAdapter, TenantStore, UserStore,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates every store operation to the
/// typed query modules. The database is opened by
/// [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage. The connection is not opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, BotfleetError> {
        self.db.get().ok_or_else(|| BotfleetError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(db: &Database) -> Result<(), BotfleetError> {
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, BotfleetError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BotfleetError> {
        if let Some(db) = self.db.get() {
            Self::checkpoint(db).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), BotfleetError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| BotfleetError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), BotfleetError> {
        Self::checkpoint(self.db()?).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl TenantStore for SqliteStorage {
    async fn list_tenants(&self) -> Result<Vec<Tenant>, BotfleetError> {
        queries::tenants::list_tenants(self.db()?).await
    }

    async fn get_tenant(&self, id: TenantId) -> Result<Option<Tenant>, BotfleetError> {
        queries::tenants::get_tenant(self.db()?, id).await
    }

    async fn create_tenant(&self, tenant: &NewTenant) -> Result<Tenant, BotfleetError> {
        queries::tenants::create_tenant(self.db()?, tenant).await
    }

    async fn update_tenant(
        &self,
        id: TenantId,
        update: &TenantUpdate,
    ) -> Result<Option<Tenant>, BotfleetError> {
        queries::tenants::update_tenant(self.db()?, id, update).await
    }

    async fn delete_tenant(&self, id: TenantId) -> Result<bool, BotfleetError> {
        queries::tenants::delete_tenant(self.db()?, id).await
    }
}

#[async_trait]
impl ContextStore for SqliteStorage {
    async fn get_context(
        &self,
        tenant_id: TenantId,
        command: &str,
    ) -> Result<Option<CommandContext>, BotfleetError> {
        queries::contexts::get_context(self.db()?, tenant_id, command).await
    }

    async fn list_contexts(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<CommandContext>, BotfleetError> {
        queries::contexts::list_contexts(self.db()?, tenant_id).await
    }

    async fn upsert_context(&self, context: &CommandContext) -> Result<(), BotfleetError> {
        queries::contexts::upsert_context(self.db()?, context).await
    }

    async fn delete_context(
        &self,
        tenant_id: TenantId,
        command: &str,
    ) -> Result<bool, BotfleetError> {
        queries::contexts::delete_context(self.db()?, tenant_id, command).await
    }

    async fn base_prompt(&self, tenant_id: TenantId) -> Result<Option<String>, BotfleetError> {
        queries::contexts::base_prompt(self.db()?, tenant_id).await
    }

    async fn set_base_prompt(
        &self,
        tenant_id: TenantId,
        prompt: &str,
    ) -> Result<bool, BotfleetError> {
        queries::contexts::set_base_prompt(self.db()?, tenant_id, prompt).await
    }
}

#[async_trait]
impl SessionStore for SqliteStorage {
    async fn get_session(
        &self,
        user_id: &str,
        tenant_id: TenantId,
    ) -> Result<Session, BotfleetError> {
        queries::sessions::get_session(self.db()?, user_id, tenant_id).await
    }

    async fn save_session(&self, session: &Session) -> Result<(), BotfleetError> {
        queries::sessions::save_session(self.db()?, session).await
    }

    async fn record_exchange(&self, exchange: &Exchange) -> Result<(), BotfleetError> {
        queries::sessions::record_exchange(self.db()?, exchange).await
    }

    async fn reset_conversation(
        &self,
        user_id: &str,
        tenant_id: TenantId,
    ) -> Result<(), BotfleetError> {
        queries::sessions::reset_conversation(self.db()?, user_id, tenant_id).await
    }
}

#[async_trait]
impl UserStore for SqliteStorage {
    async fn ensure_user(
        &self,
        user_id: &str,
        nickname: &str,
        username: Option<&str>,
    ) -> Result<(), BotfleetError> {
        queries::users::ensure_user(self.db()?, user_id, nickname, username).await
    }

    async fn touch_user(&self, user_id: &str) -> Result<(), BotfleetError> {
        queries::users::touch_user(self.db()?, user_id).await
    }

    async fn list_users(&self) -> Result<Vec<User>, BotfleetError> {
        queries::users::list_users(self.db()?).await
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, BotfleetError> {
        queries::users::get_user(self.db()?, user_id).await
    }

    async fn set_user_context(
        &self,
        user_id: &str,
        context: Option<&str>,
    ) -> Result<bool, BotfleetError> {
        queries::users::set_user_context(self.db()?, user_id, context).await
    }
}

#[async_trait]
impl MessageLog for SqliteStorage {
    async fn append_message(
        &self,
        user_id: &str,
        tenant_id: TenantId,
        role: Role,
        content: &str,
    ) -> Result<i64, BotfleetError> {
        queries::messages::append_message(self.db()?, user_id, tenant_id, role, content).await
    }

    async fn messages_for_user(
        &self,
        user_id: &str,
        tenant_id: Option<TenantId>,
    ) -> Result<Vec<Message>, BotfleetError> {
        queries::messages::messages_for_user(self.db()?, user_id, tenant_id).await
    }
}
