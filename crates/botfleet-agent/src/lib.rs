// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot registry, conversation pipeline and admin operations for Botfleet.
//!
//! [`Fleet`] wires the pieces together: every running tenant's listener
//! feeds the shared [`ConversationPipeline`], and [`AdminService`] drives
//! the [`BotRegistry`] when tenants change.

pub mod admin;
pub mod classifier;
pub mod context;
pub mod control;
pub mod format;
pub mod locks;
pub mod notifier;
pub mod pipeline;
pub mod registry;
pub mod responder;
pub mod shutdown;

use std::sync::Arc;

use botfleet_config::model::PipelineConfig;
use botfleet_core::{BotfleetError, ChannelFactory, InferenceAdapter, StorageAdapter};
use tracing::info;

pub use admin::{AdminService, ContextEntry, ContextsDocument, ImportSummary};
pub use control::ControlOps;
pub use notifier::OperatorNotifier;
pub use pipeline::{Conversation, ConversationPipeline, PipelineOutcome};
pub use registry::{BotRegistry, InboundHandler};

/// The running system: pipeline, registry and admin surface over one store.
pub struct Fleet {
    pub storage: Arc<dyn StorageAdapter>,
    pub pipeline: Arc<ConversationPipeline>,
    pub registry: Arc<BotRegistry>,
    pub admin: Arc<AdminService>,
}

impl Fleet {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        provider: Arc<dyn InferenceAdapter>,
        factory: Arc<dyn ChannelFactory>,
        notifier: OperatorNotifier,
        config: PipelineConfig,
    ) -> Self {
        let pipeline = Arc::new(ConversationPipeline::new(
            Arc::clone(&storage),
            provider,
            notifier,
            config,
        ));
        let registry = Arc::new(BotRegistry::new(factory, pipeline.clone()));
        let admin = Arc::new(AdminService::new(
            Arc::clone(&storage),
            Arc::clone(&registry),
        ));
        Self {
            storage,
            pipeline,
            registry,
            admin,
        }
    }

    /// Starts every active stored tenant. Returns how many are running.
    pub async fn start(&self) -> Result<usize, BotfleetError> {
        let tenants = self.storage.list_tenants().await?;
        Ok(self.registry.start_all(&tenants).await)
    }

    /// Stops every listener. In-flight pipeline runs are not cancelled.
    pub async fn shutdown(&self) {
        self.registry.shutdown_all().await;
        info!("fleet stopped");
    }
}
