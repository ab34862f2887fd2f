// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `botfleet chat`: one conversation turn without Telegram.
//!
//! Prints `{reply, session, tenant_id}` as JSON for partner integrations
//! and scripting.

use std::sync::Arc;

use botfleet_agent::{Conversation, ConversationPipeline, OperatorNotifier};
use botfleet_config::model::BotfleetConfig;
use botfleet_core::types::TenantId;
use botfleet_core::{BotfleetError, StorageAdapter};
use botfleet_openrouter::OpenRouterProvider;
use botfleet_storage::SqliteStorage;

pub async fn run_chat(
    config: &BotfleetConfig,
    user: &str,
    tenant: Option<i64>,
    message: &str,
) -> Result<(), BotfleetError> {
    let provider = Arc::new(OpenRouterProvider::new(&config.inference)?);
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let pipeline = ConversationPipeline::new(
        storage.clone(),
        provider,
        OperatorNotifier::disabled(),
        config.pipeline.clone(),
    );
    let result = pipeline.converse(user, message, tenant.map(TenantId)).await;
    storage.close().await?;

    println!("{}", render(&result?)?);
    Ok(())
}

fn render(conversation: &Conversation) -> Result<String, BotfleetError> {
    serde_json::to_string_pretty(conversation)
        .map_err(|e| BotfleetError::Internal(format!("cannot render conversation: {e}")))
}
