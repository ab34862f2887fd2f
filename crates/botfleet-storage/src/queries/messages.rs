// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only message log.

use std::str::FromStr;

use botfleet_core::BotfleetError;
use botfleet_core::types::{Message, Role, TenantId};
use rusqlite::params;

use crate::database::{Database, map_tr_err, now_timestamp};

fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let role: String = row.get(3)?;
    let role = Role::from_str(&role).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Message {
        id: row.get(0)?,
        user_id: row.get(1)?,
        tenant_id: TenantId(row.get(2)?),
        role,
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Append one row and return its id.
pub async fn append_message(
    db: &Database,
    user_id: &str,
    tenant_id: TenantId,
    role: Role,
    content: &str,
) -> Result<i64, BotfleetError> {
    let user_id = user_id.to_string();
    let content = content.to_string();
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.execute(
                "INSERT INTO messages (user_id, tenant_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user_id,
                    tenant_id.0,
                    role.to_string(),
                    content,
                    now_timestamp()
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// A user's messages in creation order, across all tenants unless one is given.
pub async fn messages_for_user(
    db: &Database,
    user_id: &str,
    tenant_id: Option<TenantId>,
) -> Result<Vec<Message>, BotfleetError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, tenant_id, role, content, created_at FROM messages
                 WHERE user_id = ?1 AND (?2 IS NULL OR tenant_id = ?2)
                 ORDER BY created_at, id",
            )?;
            let messages = stmt
                .query_map(params![user_id, tenant_id.map(|t| t.0)], message_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}
