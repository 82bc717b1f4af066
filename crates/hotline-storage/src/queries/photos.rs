// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Photos attached to questions.
//!
//! `kind = 'chat'` rows hold a platform file id (plus its unique id);
//! `kind = 'file'` rows hold a local path in `file_id`.

use std::path::PathBuf;

use hotline_core::{Attachment, HotlineError, QuestionId};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::queries::questions;

/// Append a photo to a question.
pub async fn attach_photo(
    db: &Database,
    question_id: QuestionId,
    photo: &Attachment,
) -> Result<(), HotlineError> {
    if !questions::exists(db, question_id).await? {
        return Err(HotlineError::QuestionNotFound(question_id));
    }
    let (kind, file_id, unique_id) = photo_columns(photo);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO question_photos (question_id, kind, file_id, unique_id)
                 VALUES (?1, ?2, ?3, ?4)",
                params![question_id, kind, file_id, unique_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// `(kind, file_id, unique_id)` column values for a photo row.
pub(crate) fn photo_columns(photo: &Attachment) -> (&'static str, String, Option<String>) {
    match photo {
        Attachment::ChatPhoto { file_id, unique_id } => {
            ("chat", file_id.clone(), Some(unique_id.clone()))
        }
        Attachment::StoredFile { path } => ("file", path.display().to_string(), None),
    }
}

/// Photos of a question in the order they were attached.
pub async fn list_photos(
    db: &Database,
    question_id: QuestionId,
) -> Result<Vec<Attachment>, HotlineError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT kind, file_id, unique_id FROM question_photos
                 WHERE question_id = ?1 ORDER BY id",
            )?;
            let rows = stmt.query_map(params![question_id], |row| {
                let kind: String = row.get(0)?;
                let file_id: String = row.get(1)?;
                let unique_id: Option<String> = row.get(2)?;
                Ok(match kind.as_str() {
                    "file" => Attachment::StoredFile {
                        path: PathBuf::from(file_id),
                    },
                    _ => Attachment::ChatPhoto {
                        unique_id: unique_id.unwrap_or_else(|| file_id.clone()),
                        file_id,
                    },
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotline_core::NewQuestion;

    fn chat_photo(n: u32) -> Attachment {
        Attachment::ChatPhoto {
            file_id: format!("file-{n}"),
            unique_id: format!("uniq-{n}"),
        }
    }

    #[tokio::test]
    async fn photos_come_back_in_attach_order() {
        let db = Database::open_in_memory().await.unwrap();
        let id = questions::create_question(&db, &NewQuestion::from_web(None, "q"))
            .await
            .unwrap();

        attach_photo(&db, id, &chat_photo(2)).await.unwrap();
        attach_photo(&db, id, &chat_photo(1)).await.unwrap();
        let stored = Attachment::StoredFile {
            path: PathBuf::from("uploads/web/x.png"),
        };
        attach_photo(&db, id, &stored).await.unwrap();

        let photos = list_photos(&db, id).await.unwrap();
        assert_eq!(photos, vec![chat_photo(2), chat_photo(1), stored]);
    }

    #[tokio::test]
    async fn attaching_to_missing_question_fails() {
        let db = Database::open_in_memory().await.unwrap();
        let err = attach_photo(&db, 77, &chat_photo(1)).await.unwrap_err();
        assert!(matches!(err, HotlineError::QuestionNotFound(77)));
    }

    #[tokio::test]
    async fn question_without_photos_lists_none() {
        let db = Database::open_in_memory().await.unwrap();
        let id = questions::create_question(&db, &NewQuestion::from_web(None, "q"))
            .await
            .unwrap();
        assert!(list_photos(&db, id).await.unwrap().is_empty());
    }
}
