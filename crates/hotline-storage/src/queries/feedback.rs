// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Free-form feedback entries. Stored only; nobody is notified.

use hotline_core::{HotlineError, UserId};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Store a feedback text. The user must already exist.
pub async fn add_feedback(db: &Database, user_id: UserId, text: &str) -> Result<i64, HotlineError> {
    let text = text.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO feedbacks (user_id, text) VALUES (?1, ?2)",
                params![user_id, text],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}
