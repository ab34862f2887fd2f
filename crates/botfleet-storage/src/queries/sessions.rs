// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session state operations.
//!
//! History is stored as a JSON array in the `history` column. A row that
//! fails to parse is treated as an empty history rather than an error.

use botfleet_core::BotfleetError;
use botfleet_core::types::{Exchange, HistoryEntry, Role, Session, TenantId};
use rusqlite::{OptionalExtension, params};
use tracing::warn;

use crate::database::{Database, map_tr_err, now_timestamp};

const UPSERT_SESSION: &str = "INSERT INTO sessions (user_id, tenant_id, last_command, history, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT (user_id, tenant_id) DO UPDATE SET
         last_command = excluded.last_command,
         history = excluded.history,
         updated_at = excluded.updated_at";

const INSERT_MESSAGE: &str = "INSERT INTO messages (user_id, tenant_id, role, content, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5)";

fn encode_history(history: &[HistoryEntry]) -> Result<String, BotfleetError> {
    serde_json::to_string(history).map_err(|e| BotfleetError::Storage {
        source: Box::new(e),
    })
}

fn decode_history(user_id: &str, tenant_id: TenantId, raw: &str) -> Vec<HistoryEntry> {
    match serde_json::from_str(raw) {
        Ok(history) => history,
        Err(e) => {
            warn!(user_id, %tenant_id, error = %e, "unreadable session history, starting empty");
            Vec::new()
        }
    }
}

/// Load the session for (user, tenant), or a fresh one if none is stored.
pub async fn get_session(
    db: &Database,
    user_id: &str,
    tenant_id: TenantId,
) -> Result<Session, BotfleetError> {
    let key = user_id.to_string();
    let row = db
        .connection()
        .call(move |conn| -> Result<Option<(String, String, String)>, rusqlite::Error> {
            conn.query_row(
                "SELECT last_command, history, updated_at FROM sessions
                 WHERE user_id = ?1 AND tenant_id = ?2",
                params![key, tenant_id.0],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    Ok(match row {
        Some((last_command, history, updated_at)) => Session {
            user_id: user_id.to_string(),
            tenant_id,
            last_command,
            history: decode_history(user_id, tenant_id, &history),
            updated_at: Some(updated_at),
        },
        None => Session::fresh(user_id, tenant_id),
    })
}

/// Upsert a session keyed on (user, tenant).
pub async fn save_session(db: &Database, session: &Session) -> Result<(), BotfleetError> {
    let history = encode_history(&session.history)?;
    let session = session.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                UPSERT_SESSION,
                params![
                    session.user_id,
                    session.tenant_id.0,
                    session.last_command,
                    history,
                    now_timestamp(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Persist one pipeline run: both log rows and the extended session, atomically.
pub async fn record_exchange(db: &Database, exchange: &Exchange) -> Result<(), BotfleetError> {
    let history = encode_history(&exchange.next_history())?;
    let exchange = exchange.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            let now = now_timestamp();
            tx.execute(
                INSERT_MESSAGE,
                params![
                    exchange.user_id,
                    exchange.tenant_id.0,
                    Role::User.to_string(),
                    exchange.user_text,
                    now,
                ],
            )?;
            tx.execute(
                INSERT_MESSAGE,
                params![
                    exchange.user_id,
                    exchange.tenant_id.0,
                    Role::Assistant.to_string(),
                    exchange.reply,
                    now,
                ],
            )?;
            tx.execute(
                UPSERT_SESSION,
                params![
                    exchange.user_id,
                    exchange.tenant_id.0,
                    exchange.new_command,
                    history,
                    now,
                ],
            )?;
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

/// Delete the session and message rows of exactly this (user, tenant) pair.
pub async fn reset_conversation(
    db: &Database,
    user_id: &str,
    tenant_id: TenantId,
) -> Result<(), BotfleetError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM sessions WHERE user_id = ?1 AND tenant_id = ?2",
                params![user_id, tenant_id.0],
            )?;
            tx.execute(
                "DELETE FROM messages WHERE user_id = ?1 AND tenant_id = ?2",
                params![user_id, tenant_id.0],
            )?;
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::messages::{append_message, messages_for_user};
    use crate::queries::tenants::create_tenant;
    use botfleet_core::START_COMMAND;
    use botfleet_core::types::NewTenant;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, TenantId, TenantId, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db").to_str().unwrap())
            .await
            .unwrap();
        let mut ids = Vec::new();
        for (name, token) in [("alpha", "111:aaa"), ("beta", "222:bbb")] {
            let t = create_tenant(
                &db,
                &NewTenant {
                    name: name.into(),
                    token: token.into(),
                    base_prompt: String::new(),
                    active: true,
                },
            )
            .await
            .unwrap();
            ids.push(t.id);
        }
        (db, ids[0], ids[1], dir)
    }

    fn exchange(tenant_id: TenantId, prior: Vec<HistoryEntry>, text: &str) -> Exchange {
        Exchange {
            user_id: "42".into(),
            tenant_id,
            new_command: "/plan".into(),
            prior_history: prior,
            user_text: text.into(),
            reply: format!("reply to {text}"),
        }
    }

    #[tokio::test]
    async fn missing_session_is_fresh() {
        let (db, alpha, _beta, _dir) = setup_db().await;
        let session = get_session(&db, "42", alpha).await.unwrap();
        assert_eq!(session.last_command, START_COMMAND);
        assert!(session.history.is_empty());
        assert!(session.updated_at.is_none());
    }

    #[tokio::test]
    async fn save_then_get_round_trips_history() {
        let (db, alpha, _beta, _dir) = setup_db().await;
        let mut session = Session::fresh("42", alpha);
        session.last_command = "/goLife".into();
        session.history = vec![HistoryEntry::user("hi"), HistoryEntry::assistant("hello")];
        save_session(&db, &session).await.unwrap();

        let loaded = get_session(&db, "42", alpha).await.unwrap();
        assert_eq!(loaded.last_command, "/goLife");
        assert_eq!(loaded.history, session.history);
        assert!(loaded.updated_at.is_some());
    }

    #[tokio::test]
    async fn record_exchange_writes_log_and_session() {
        let (db, alpha, _beta, _dir) = setup_db().await;
        record_exchange(&db, &exchange(alpha, Vec::new(), "hello"))
            .await
            .unwrap();

        let session = get_session(&db, "42", alpha).await.unwrap();
        assert_eq!(session.last_command, "/plan");
        assert_eq!(
            session.history,
            vec![
                HistoryEntry::user("hello"),
                HistoryEntry::assistant("reply to hello")
            ]
        );

        let messages = messages_for_user(&db, "42", Some(alpha)).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "hello");
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn record_exchange_is_atomic_on_failure() {
        let (db, _alpha, _beta, _dir) = setup_db().await;
        // Unknown tenant violates the foreign key on the first insert.
        let result = record_exchange(&db, &exchange(TenantId(999), Vec::new(), "x")).await;
        assert!(result.is_err());
        assert!(
            messages_for_user(&db, "42", None)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn reset_only_touches_one_tenant() {
        let (db, alpha, beta, _dir) = setup_db().await;
        record_exchange(&db, &exchange(alpha, Vec::new(), "a"))
            .await
            .unwrap();
        record_exchange(&db, &exchange(beta, Vec::new(), "b"))
            .await
            .unwrap();
        append_message(&db, "42", alpha, Role::Assistant, "extra")
            .await
            .unwrap();

        reset_conversation(&db, "42", alpha).await.unwrap();

        let alpha_session = get_session(&db, "42", alpha).await.unwrap();
        assert_eq!(alpha_session, Session::fresh("42", alpha));
        assert!(
            messages_for_user(&db, "42", Some(alpha))
                .await
                .unwrap()
                .is_empty()
        );

        let beta_session = get_session(&db, "42", beta).await.unwrap();
        assert_eq!(beta_session.history.len(), 2);
        assert_eq!(
            messages_for_user(&db, "42", Some(beta)).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn corrupt_history_reads_as_empty() {
        let (db, alpha, _beta, _dir) = setup_db().await;
        db.connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO sessions (user_id, tenant_id, last_command, history, updated_at)
                     VALUES ('42', ?1, '/plan', 'not json', '2026-01-01T00:00:00.000Z')",
                    params![alpha.0],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let session = get_session(&db, "42", alpha).await.unwrap();
        assert_eq!(session.last_command, "/plan");
        assert!(session.history.is_empty());
    }
}
