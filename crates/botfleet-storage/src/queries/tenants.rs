// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant CRUD operations.

use botfleet_core::BotfleetError;
use botfleet_core::types::{NewTenant, Tenant, TenantId, TenantUpdate};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err, now_timestamp};

const TENANT_COLUMNS: &str = "id, name, token, base_prompt, is_active, created_at";

fn tenant_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tenant> {
    Ok(Tenant {
        id: TenantId(row.get(0)?),
        name: row.get(1)?,
        token: row.get(2)?,
        base_prompt: row.get(3)?,
        active: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// True for a violation of the `tenants.token` UNIQUE constraint.
fn token_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn token_conflict() -> BotfleetError {
    BotfleetError::Validation("token must be unique".into())
}

/// List every tenant ordered by id.
pub async fn list_tenants(db: &Database) -> Result<Vec<Tenant>, BotfleetError> {
    db.connection()
        .call(|conn| -> Result<Vec<Tenant>, rusqlite::Error> {
            let mut stmt =
                conn.prepare(&format!("SELECT {TENANT_COLUMNS} FROM tenants ORDER BY id"))?;
            let tenants = stmt
                .query_map([], tenant_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tenants)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a tenant by id.
pub async fn get_tenant(db: &Database, id: TenantId) -> Result<Option<Tenant>, BotfleetError> {
    db.connection()
        .call(move |conn| -> Result<Option<Tenant>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = ?1"),
                params![id.0],
                tenant_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a tenant. Returns a validation error if the token is taken.
pub async fn create_tenant(db: &Database, tenant: &NewTenant) -> Result<Tenant, BotfleetError> {
    let tenant = tenant.clone();
    let created = db
        .connection()
        .call(move |conn| -> Result<Option<Tenant>, rusqlite::Error> {
            let created_at = now_timestamp();
            let inserted = conn.execute(
                "INSERT INTO tenants (name, token, base_prompt, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    tenant.name,
                    tenant.token,
                    tenant.base_prompt,
                    tenant.active,
                    created_at
                ],
            );
            match inserted {
                Err(e) if token_violation(&e) => return Ok(None),
                other => other?,
            };
            Ok(Some(Tenant {
                id: TenantId(conn.last_insert_rowid()),
                name: tenant.name,
                token: tenant.token,
                base_prompt: tenant.base_prompt,
                active: tenant.active,
                created_at,
            }))
        })
        .await
        .map_err(map_tr_err)?;
    created.ok_or_else(token_conflict)
}

enum UpdateOutcome {
    Missing,
    TokenTaken,
    Updated(Tenant),
}

/// Apply a partial update. `Ok(None)` when the tenant does not exist.
pub async fn update_tenant(
    db: &Database,
    id: TenantId,
    update: &TenantUpdate,
) -> Result<Option<Tenant>, BotfleetError> {
    let update = update.clone();
    let outcome = db
        .connection()
        .call(move |conn| -> Result<UpdateOutcome, rusqlite::Error> {
            let tx = conn.transaction()?;
            let current = tx
                .query_row(
                    &format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = ?1"),
                    params![id.0],
                    tenant_from_row,
                )
                .optional()?;
            let Some(mut tenant) = current else {
                return Ok(UpdateOutcome::Missing);
            };

            if let Some(token) = update.token {
                tenant.token = token;
            }
            if let Some(name) = update.name {
                tenant.name = name;
            }
            if let Some(base_prompt) = update.base_prompt {
                tenant.base_prompt = base_prompt;
            }
            if let Some(active) = update.active {
                tenant.active = active;
            }

            let updated = tx.execute(
                "UPDATE tenants SET name = ?1, token = ?2, base_prompt = ?3, is_active = ?4
                 WHERE id = ?5",
                params![
                    tenant.name,
                    tenant.token,
                    tenant.base_prompt,
                    tenant.active,
                    id.0
                ],
            );
            match updated {
                Err(e) if token_violation(&e) => return Ok(UpdateOutcome::TokenTaken),
                other => other?,
            };
            tx.commit()?;
            Ok(UpdateOutcome::Updated(tenant))
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        UpdateOutcome::Missing => Ok(None),
        UpdateOutcome::TokenTaken => Err(token_conflict()),
        UpdateOutcome::Updated(tenant) => Ok(Some(tenant)),
    }
}

/// Delete a tenant and everything keyed by it.
pub async fn delete_tenant(db: &Database, id: TenantId) -> Result<bool, BotfleetError> {
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM messages WHERE tenant_id = ?1", params![id.0])?;
            tx.execute("DELETE FROM sessions WHERE tenant_id = ?1", params![id.0])?;
            tx.execute(
                "DELETE FROM command_contexts WHERE tenant_id = ?1",
                params![id.0],
            )?;
            let deleted = tx.execute("DELETE FROM tenants WHERE id = ?1", params![id.0])?;
            tx.commit()?;
            Ok(deleted > 0)
        })
        .await
        .map_err(map_tr_err)
}
