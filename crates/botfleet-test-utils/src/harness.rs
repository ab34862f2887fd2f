// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` provides a temp SQLite database behind [`SqliteStorage`],
//! a [`MockProvider`], a [`MockChannelFactory`] and a configuration pointing
//! at the temp database, plus helpers to seed tenants and contexts.

use std::sync::Arc;

use botfleet_config::model::{BotfleetConfig, StorageConfig};
use botfleet_core::types::{CommandContext, NewTenant, Tenant, DEFAULT_SECTION};
use botfleet_core::{BotfleetError, ContextStore, StorageAdapter, TenantStore};
use botfleet_storage::SqliteStorage;

use crate::mock_channel::MockChannelFactory;
use crate::mock_provider::MockProvider;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    provider: Option<MockProvider>,
    config: BotfleetConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            provider: None,
            config: BotfleetConfig::default(),
        }
    }

    /// Queue successful provider responses.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Use a preconfigured provider instead of a fresh one.
    pub fn with_provider(mut self, provider: MockProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Start from this configuration. The storage path is always overridden.
    pub fn with_config(mut self, config: BotfleetConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the harness, creating and migrating the temp database.
    pub async fn build(self) -> Result<TestHarness, BotfleetError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| BotfleetError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;

        let mock_provider = match self.provider {
            Some(provider) => provider,
            None => MockProvider::with_responses(self.responses),
        };

        Ok(TestHarness {
            storage: Arc::new(storage),
            mock_provider: Arc::new(mock_provider),
            factory: MockChannelFactory::new(),
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// The mock inference collaborator.
    pub mock_provider: Arc<MockProvider>,
    /// Channel factory handed to the registry.
    pub factory: MockChannelFactory,
    /// Configuration with the storage path pointing at the temp DB.
    pub config: BotfleetConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Insert an active tenant.
    pub async fn seed_tenant(
        &self,
        name: &str,
        token: &str,
        base_prompt: &str,
    ) -> Result<Tenant, BotfleetError> {
        self.storage
            .create_tenant(&NewTenant {
                name: name.to_string(),
                token: token.to_string(),
                base_prompt: base_prompt.to_string(),
                active: true,
            })
            .await
    }

    /// Insert or replace a command context in the default section.
    pub async fn seed_context(
        &self,
        tenant: &Tenant,
        command: &str,
        classifier_prompt: &str,
        response_prompt: &str,
    ) -> Result<(), BotfleetError> {
        self.storage
            .upsert_context(&CommandContext {
                tenant_id: tenant.id,
                command: command.to_string(),
                classifier_prompt: classifier_prompt.to_string(),
                response_prompt: response_prompt.to_string(),
                section: DEFAULT_SECTION.to_string(),
            })
            .await
    }
}
