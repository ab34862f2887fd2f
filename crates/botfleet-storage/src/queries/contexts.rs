// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command context and base prompt operations.

use botfleet_core::BotfleetError;
use botfleet_core::types::{CommandContext, TenantId};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

fn context_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommandContext> {
    Ok(CommandContext {
        tenant_id: TenantId(row.get(0)?),
        command: row.get(1)?,
        classifier_prompt: row.get(2)?,
        response_prompt: row.get(3)?,
        section: row.get(4)?,
    })
}

/// Get the context for (tenant, command).
pub async fn get_context(
    db: &Database,
    tenant_id: TenantId,
    command: &str,
) -> Result<Option<CommandContext>, BotfleetError> {
    let command = command.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<CommandContext>, rusqlite::Error> {
            conn.query_row(
                "SELECT tenant_id, command, classifier_prompt, response_prompt, section
                 FROM command_contexts WHERE tenant_id = ?1 AND command = ?2",
                params![tenant_id.0, command],
                context_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// List a tenant's contexts grouped by section.
pub async fn list_contexts(
    db: &Database,
    tenant_id: TenantId,
) -> Result<Vec<CommandContext>, BotfleetError> {
    db.connection()
        .call(move |conn| -> Result<Vec<CommandContext>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT tenant_id, command, classifier_prompt, response_prompt, section
                 FROM command_contexts WHERE tenant_id = ?1 ORDER BY section, command",
            )?;
            let contexts = stmt
                .query_map(params![tenant_id.0], context_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(contexts)
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or replace the context keyed by (tenant, command).
pub async fn upsert_context(db: &Database, context: &CommandContext) -> Result<(), BotfleetError> {
    let context = context.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO command_contexts
                     (tenant_id, command, classifier_prompt, response_prompt, section)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (tenant_id, command) DO UPDATE SET
                     classifier_prompt = excluded.classifier_prompt,
                     response_prompt = excluded.response_prompt,
                     section = excluded.section",
                params![
                    context.tenant_id.0,
                    context.command,
                    context.classifier_prompt,
                    context.response_prompt,
                    context.section,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete the context for (tenant, command).
pub async fn delete_context(
    db: &Database,
    tenant_id: TenantId,
    command: &str,
) -> Result<bool, BotfleetError> {
    let command = command.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let deleted = conn.execute(
                "DELETE FROM command_contexts WHERE tenant_id = ?1 AND command = ?2",
                params![tenant_id.0, command],
            )?;
            Ok(deleted > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Read a tenant's base prompt.
pub async fn base_prompt(db: &Database, tenant_id: TenantId) -> Result<Option<String>, BotfleetError> {
    db.connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row(
                "SELECT base_prompt FROM tenants WHERE id = ?1",
                params![tenant_id.0],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Replace a tenant's base prompt.
pub async fn set_base_prompt(
    db: &Database,
    tenant_id: TenantId,
    prompt: &str,
) -> Result<bool, BotfleetError> {
    let prompt = prompt.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let updated = conn.execute(
                "UPDATE tenants SET base_prompt = ?1 WHERE id = ?2",
                params![prompt, tenant_id.0],
            )?;
            Ok(updated > 0)
        })
        .await
        .map_err(map_tr_err)
}
