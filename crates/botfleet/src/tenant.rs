// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline tenant management: `tenant list`, `tenant add` and `import-contexts`.
//!
//! These commands work directly on the store. A running `serve` process
//! picks up new tenants on its next start.

use std::path::Path;

use botfleet_agent::admin::{import_contexts_file, summarize};
use botfleet_config::model::BotfleetConfig;
use botfleet_core::types::{NewTenant, TenantId, TenantSummary};
use botfleet_core::{BotfleetError, StorageAdapter, TenantStore};
use botfleet_storage::SqliteStorage;

async fn open_storage(config: &BotfleetConfig) -> Result<SqliteStorage, BotfleetError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(storage)
}

/// Renders tenants as an aligned plain-text table.
fn render_table(tenants: &[TenantSummary]) -> String {
    let mut out = format!("{:<6} {:<24} {:<12} {:<8}\n", "ID", "NAME", "TOKEN", "ACTIVE");
    for t in tenants {
        out.push_str(&format!(
            "{:<6} {:<24} {:<12} {:<8}\n",
            t.id.0,
            t.name,
            t.token,
            if t.active { "yes" } else { "no" }
        ));
    }
    out
}

pub async fn run_list(config: &BotfleetConfig, json: bool) -> Result<(), BotfleetError> {
    let storage = open_storage(config).await?;
    let tenants: Vec<TenantSummary> = storage
        .list_tenants()
        .await?
        .into_iter()
        .map(|t| summarize(t, false))
        .collect();
    storage.close().await?;

    if json {
        let rendered = serde_json::to_string_pretty(&tenants)
            .map_err(|e| BotfleetError::Internal(format!("cannot render tenants: {e}")))?;
        println!("{rendered}");
    } else if tenants.is_empty() {
        println!("no tenants");
    } else {
        print!("{}", render_table(&tenants));
    }
    Ok(())
}

pub async fn run_add(
    config: &BotfleetConfig,
    name: String,
    token: String,
    base_prompt: String,
    active: bool,
) -> Result<(), BotfleetError> {
    if name.trim().is_empty() || token.trim().is_empty() {
        return Err(BotfleetError::Validation(
            "name and token must not be empty".into(),
        ));
    }
    let storage = open_storage(config).await?;
    let created = storage
        .create_tenant(&NewTenant {
            name,
            token,
            base_prompt,
            active,
        })
        .await;
    storage.close().await?;

    let tenant = created?;
    println!("created tenant {} ({})", tenant.id, tenant.name);
    Ok(())
}

pub async fn run_import(
    config: &BotfleetConfig,
    tenant_id: i64,
    file: &Path,
) -> Result<(), BotfleetError> {
    let storage = open_storage(config).await?;
    let imported = import_contexts_file(&storage, TenantId(tenant_id), file).await;
    storage.close().await?;

    let summary = imported?;
    println!(
        "imported {} contexts into tenant {tenant_id}{}",
        summary.contexts,
        if summary.base_prompt_updated {
            " (base prompt updated)"
        } else {
            ""
        }
    );
    Ok(())
}
