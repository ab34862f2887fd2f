// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator control operations: conversation reset, broadcast and direct messages.

use std::sync::Arc;

use botfleet_core::types::{BroadcastReport, OutboundMessage, Role, TenantId};
use botfleet_core::{BotfleetError, ChannelAdapter, StorageAdapter};
use tracing::{info, warn};

use crate::registry::BotRegistry;

/// Forgets one user's conversation with one tenant.
pub async fn reset_conversation(
    storage: &dyn StorageAdapter,
    user_id: &str,
    tenant_id: TenantId,
) -> Result<(), BotfleetError> {
    storage.reset_conversation(user_id, tenant_id).await?;
    info!(user_id, %tenant_id, "conversation reset");
    Ok(())
}

/// Control operations over stored conversations and running tenants.
pub struct ControlOps {
    storage: Arc<dyn StorageAdapter>,
    registry: Arc<BotRegistry>,
}

impl ControlOps {
    pub fn new(storage: Arc<dyn StorageAdapter>, registry: Arc<BotRegistry>) -> Self {
        Self { storage, registry }
    }

    /// Deletes the session and message log of exactly this (user, tenant) pair.
    pub async fn reset(&self, user_id: &str, tenant_id: TenantId) -> Result<(), BotfleetError> {
        reset_conversation(self.storage.as_ref(), user_id, tenant_id).await
    }

    /// Sends `text` to every known user through the tenant's channel.
    ///
    /// A failed recipient is counted and skipped.
    pub async fn broadcast(
        &self,
        tenant_id: TenantId,
        text: &str,
    ) -> Result<BroadcastReport, BotfleetError> {
        let channel = self.running_channel(tenant_id).await?;
        let users = self.storage.list_users().await?;

        let mut report = BroadcastReport {
            total: users.len(),
            sent: 0,
            failed: 0,
        };
        for user in &users {
            match channel
                .send(OutboundMessage::plain(user.user_id.clone(), text))
                .await
            {
                Ok(_) => report.sent += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(%tenant_id, user_id = %user.user_id, error = %e, "broadcast delivery failed");
                }
            }
        }

        info!(
            %tenant_id,
            total = report.total,
            sent = report.sent,
            failed = report.failed,
            "broadcast finished"
        );
        Ok(report)
    }

    /// Sends one message and logs it as an assistant message on success.
    pub async fn send_to_user(
        &self,
        tenant_id: TenantId,
        user_id: &str,
        text: &str,
    ) -> Result<(), BotfleetError> {
        let channel = self.running_channel(tenant_id).await?;
        channel.send(OutboundMessage::plain(user_id, text)).await?;
        self.storage
            .append_message(user_id, tenant_id, Role::Assistant, text)
            .await?;
        Ok(())
    }

    async fn running_channel(
        &self,
        tenant_id: TenantId,
    ) -> Result<Arc<dyn ChannelAdapter>, BotfleetError> {
        self.registry
            .channel(tenant_id)
            .await
            .ok_or_else(|| BotfleetError::Registry(format!("tenant {tenant_id} is not running")))
    }
}
