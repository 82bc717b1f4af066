// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User profile rows.

use hotline_core::{HotlineError, UserProfile};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Insert the user, or refresh their names when they already exist.
pub async fn upsert_user(db: &Database, profile: &UserProfile) -> Result<(), HotlineError> {
    let profile = profile.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (user_id, username, first_name) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                     username = excluded.username,
                     first_name = excluded.first_name",
                params![profile.user_id, profile.username, profile.first_name],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
