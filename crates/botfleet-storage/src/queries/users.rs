// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User registry operations.

use botfleet_core::BotfleetError;
use botfleet_core::types::User;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err, now_timestamp};

const USER_COLUMNS: &str =
    "user_id, nickname, username, user_context, registration_date, last_message_date";

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        user_id: row.get(0)?,
        nickname: row.get(1)?,
        username: row.get(2)?,
        user_context: row.get(3)?,
        registration_date: row.get(4)?,
        last_message_date: row.get(5)?,
    })
}

/// Create the user on first contact; refresh nickname and username otherwise.
pub async fn ensure_user(
    db: &Database,
    user_id: &str,
    nickname: &str,
    username: Option<&str>,
) -> Result<(), BotfleetError> {
    let user_id = user_id.to_string();
    let nickname = nickname.to_string();
    let username = username.map(str::to_string);
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO users (user_id, nickname, username, registration_date)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (user_id) DO UPDATE SET
                     nickname = excluded.nickname,
                     username = excluded.username",
                params![user_id, nickname, username, now_timestamp()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Stamp the user's last message date.
pub async fn touch_user(db: &Database, user_id: &str) -> Result<(), BotfleetError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "UPDATE users SET last_message_date = ?1 WHERE user_id = ?2",
                params![now_timestamp(), user_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_users(db: &Database) -> Result<Vec<User>, BotfleetError> {
    db.connection()
        .call(|conn| -> Result<Vec<User>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users ORDER BY registration_date DESC, user_id"
            ))?;
            let users = stmt
                .query_map([], user_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(users)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_user(db: &Database, user_id: &str) -> Result<Option<User>, BotfleetError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<User>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
                params![user_id],
                user_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Set or clear the per-user prompt layer. Returns false for an unknown user.
pub async fn set_user_context(
    db: &Database,
    user_id: &str,
    context: Option<&str>,
) -> Result<bool, BotfleetError> {
    let user_id = user_id.to_string();
    let context = context.map(str::to_string);
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let updated = conn.execute(
                "UPDATE users SET user_context = ?1 WHERE user_id = ?2",
                params![context, user_id],
            )?;
            Ok(updated > 0)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db").to_str().unwrap())
            .await
            .unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn ensure_user_creates_then_refreshes() {
        let (db, _dir) = setup_db().await;
        ensure_user(&db, "42", "Ann", Some("ann")).await.unwrap();
        let first = get_user(&db, "42").await.unwrap().unwrap();
        assert_eq!(first.nickname, "Ann");
        assert_eq!(first.username.as_deref(), Some("ann"));
        assert!(first.last_message_date.is_none());

        ensure_user(&db, "42", "Annie", None).await.unwrap();
        let second = get_user(&db, "42").await.unwrap().unwrap();
        assert_eq!(second.nickname, "Annie");
        assert!(second.username.is_none());
        assert_eq!(second.registration_date, first.registration_date);
        assert_eq!(list_users(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn touch_sets_last_message_date() {
        let (db, _dir) = setup_db().await;
        ensure_user(&db, "42", "Ann", None).await.unwrap();
        touch_user(&db, "42").await.unwrap();
        let user = get_user(&db, "42").await.unwrap().unwrap();
        assert!(user.last_message_date.is_some());
    }

    #[tokio::test]
    async fn user_context_set_and_clear() {
        let (db, _dir) = setup_db().await;
        ensure_user(&db, "42", "Ann", None).await.unwrap();

        assert!(set_user_context(&db, "42", Some("prefers short answers")).await.unwrap());
        let user = get_user(&db, "42").await.unwrap().unwrap();
        assert_eq!(user.user_context.as_deref(), Some("prefers short answers"));

        assert!(set_user_context(&db, "42", None).await.unwrap());
        let user = get_user(&db, "42").await.unwrap().unwrap();
        assert!(user.user_context.is_none());

        assert!(!set_user_context(&db, "nobody", Some("x")).await.unwrap());
    }

    #[tokio::test]
    async fn get_unknown_user_is_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_user(&db, "missing").await.unwrap().is_none());
    }
}
