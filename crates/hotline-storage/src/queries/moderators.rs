// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Moderator registry rows.

use hotline_core::{HotlineError, Moderator, UserId, UserProfile};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Register a moderator or refresh their names; always (re)activates.
pub async fn upsert_moderator(db: &Database, profile: &UserProfile) -> Result<(), HotlineError> {
    let profile = profile.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO moderators (user_id, username, first_name, is_active)
                 VALUES (?1, ?2, ?3, 1)
                 ON CONFLICT(user_id) DO UPDATE SET
                     username = excluded.username,
                     first_name = excluded.first_name,
                     is_active = 1",
                params![profile.user_id, profile.username, profile.first_name],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_active(db: &Database) -> Result<Vec<Moderator>, HotlineError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, username, first_name, is_active
                 FROM moderators WHERE is_active = 1 ORDER BY user_id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(Moderator {
                    user_id: row.get(0)?,
                    username: row.get(1)?,
                    first_name: row.get(2)?,
                    is_active: row.get(3)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn is_active(db: &Database, user_id: UserId) -> Result<bool, HotlineError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT is_active FROM moderators WHERE user_id = ?1",
                params![user_id],
                |row| row.get::<_, bool>(0),
            )
            .optional()
        })
        .await
        .map(|active| active.unwrap_or(false))
        .map_err(map_tr_err)
}
