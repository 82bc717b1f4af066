// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Question rows and the lock primitives built on conditional updates.
//!
//! Claim, release and finalize are each one `UPDATE ... WHERE <expected state>`
//! statement; the affected-row count says whether the transition happened.

use std::str::FromStr;

use hotline_core::{
    AnswerDelivery, Attachment, HotlineError, NewQuestion, Question, QuestionCounts, QuestionId,
    QuestionOrigin, QuestionStatus, UserId, UserProfile,
};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};
use crate::queries::photos;

const SELECT_QUESTION: &str = "SELECT q.id, q.origin, q.user_id, q.contact, q.text, q.status,
            q.moderator_id, q.created_at, u.username, u.first_name
     FROM questions q
     LEFT JOIN users u ON u.user_id = q.user_id";

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_question(row: &Row<'_>) -> rusqlite::Result<Question> {
    let user_id: Option<UserId> = row.get(2)?;
    let submitter = match user_id {
        Some(user_id) => Some(UserProfile {
            user_id,
            username: row.get(8)?,
            first_name: row.get(9)?,
        }),
        None => None,
    };
    Ok(Question {
        id: row.get(0)?,
        origin: parse_column::<QuestionOrigin>(row, 1)?,
        user_id,
        contact: row.get(3)?,
        text: row.get(4)?,
        status: parse_column::<QuestionStatus>(row, 5)?,
        moderator_id: row.get(6)?,
        created_at: row.get(7)?,
        submitter,
    })
}

/// Insert a question in status `new`. Returns the new id.
pub async fn create_question(
    db: &Database,
    question: &NewQuestion,
) -> Result<QuestionId, HotlineError> {
    let origin = question.origin.to_string();
    let user_id = question.user_id;
    let contact = question.contact.clone();
    let text = question.text.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO questions (origin, user_id, contact, text) VALUES (?1, ?2, ?3, ?4)",
                params![origin, user_id, contact, text],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a question and its photos in one transaction. Either every row
/// lands or none does.
pub async fn create_with_photos(
    db: &Database,
    question: &NewQuestion,
    photos: &[Attachment],
) -> Result<QuestionId, HotlineError> {
    let origin = question.origin.to_string();
    let user_id = question.user_id;
    let contact = question.contact.clone();
    let text = question.text.clone();
    let rows: Vec<_> = photos.iter().map(photos::photo_columns).collect();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO questions (origin, user_id, contact, text) VALUES (?1, ?2, ?3, ?4)",
                params![origin, user_id, contact, text],
            )?;
            let id = tx.last_insert_rowid();
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO question_photos (question_id, kind, file_id, unique_id)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for (kind, file_id, unique_id) in &rows {
                    stmt.execute(params![id, kind, file_id, unique_id])?;
                }
            }
            tx.commit()?;
            Ok(id)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_question(
    db: &Database,
    id: QuestionId,
) -> Result<Option<Question>, HotlineError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("{SELECT_QUESTION} WHERE q.id = ?1"),
                params![id],
                row_to_question,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Questions with the given status, oldest first.
pub async fn list_by_status(
    db: &Database,
    status: QuestionStatus,
) -> Result<Vec<Question>, HotlineError> {
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("{SELECT_QUESTION} WHERE q.status = ?1 ORDER BY q.id"))?;
            let rows = stmt.query_map(params![status], row_to_question)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Force a status. Clears the holder; `in_progress` must go through [`try_claim`].
pub async fn set_status(
    db: &Database,
    id: QuestionId,
    status: QuestionStatus,
) -> Result<(), HotlineError> {
    if status == QuestionStatus::InProgress {
        return Err(HotlineError::InvalidInput(
            "in_progress needs a holder; claim the question instead".to_string(),
        ));
    }
    let status = status.to_string();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE questions SET status = ?1, moderator_id = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![status, id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(HotlineError::QuestionNotFound(id));
    }
    Ok(())
}

/// `new -> in_progress(moderator_id)`, or a no-op success when already held by them.
pub async fn try_claim(
    db: &Database,
    id: QuestionId,
    moderator_id: UserId,
) -> Result<bool, HotlineError> {
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE questions SET status = 'in_progress', moderator_id = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2
                   AND (status = 'new' OR (status = 'in_progress' AND moderator_id = ?1))",
                params![moderator_id, id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed > 0)
}

/// `in_progress -> new`, optionally only when `holder` holds it.
pub async fn release(
    db: &Database,
    id: QuestionId,
    holder: Option<UserId>,
) -> Result<bool, HotlineError> {
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE questions SET status = 'new', moderator_id = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND status = 'in_progress'
                   AND (?2 IS NULL OR moderator_id = ?2)",
                params![id, holder],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed > 0)
}

pub async fn holder(db: &Database, id: QuestionId) -> Result<Option<UserId>, HotlineError> {
    let holder: Option<Option<UserId>> = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT moderator_id FROM questions WHERE id = ?1 AND status = 'in_progress'",
                params![id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    Ok(holder.flatten())
}

/// `in_progress(moderator_id) -> answered | error`, clearing the holder.
pub async fn finalize(
    db: &Database,
    id: QuestionId,
    moderator_id: UserId,
    delivery: AnswerDelivery,
) -> Result<bool, HotlineError> {
    let status = delivery.status().to_string();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE questions SET status = ?1, moderator_id = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2 AND status = 'in_progress' AND moderator_id = ?3",
                params![status, id, moderator_id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed > 0)
}

/// Totals per status plus the number of feedback entries.
pub async fn counts(db: &Database) -> Result<QuestionCounts, HotlineError> {
    let (per_status, feedback) = db
        .connection()
        .call(|conn| {
            let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM questions GROUP BY status")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            let feedback: i64 =
                conn.query_row("SELECT COUNT(*) FROM feedbacks", [], |row| row.get(0))?;
            Ok((rows, feedback))
        })
        .await
        .map_err(map_tr_err)?;

    let mut counts = QuestionCounts {
        feedback: feedback as u64,
        ..QuestionCounts::default()
    };
    for (status, n) in per_status {
        let n = n as u64;
        match QuestionStatus::from_str(&status) {
            Ok(QuestionStatus::New) => counts.new = n,
            Ok(QuestionStatus::InProgress) => counts.in_progress = n,
            Ok(QuestionStatus::Answered) => counts.answered = n,
            Ok(QuestionStatus::Error) => counts.error = n,
            Ok(QuestionStatus::Closed) => counts.closed = n,
            Err(_) => tracing::warn!(status, "ignoring unknown question status"),
        }
    }
    Ok(counts)
}

/// Whether a question row exists.
pub(crate) async fn exists(db: &Database, id: QuestionId) -> Result<bool, HotlineError> {
    db.connection()
        .call(move |conn| {
            conn.query_row("SELECT 1 FROM questions WHERE id = ?1", params![id], |_| Ok(()))
                .optional()
        })
        .await
        .map(|found| found.is_some())
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{moderators, users};

    async fn setup() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        for moderator in (100..120).chain([200]) {
            moderators::upsert_moderator(&db, &UserProfile::new(moderator))
                .await
                .unwrap();
        }
        db
    }

    async fn chat_question(db: &Database, user_id: UserId, text: &str) -> QuestionId {
        users::upsert_user(db, &UserProfile::new(user_id)).await.unwrap();
        create_question(db, &NewQuestion::from_chat(user_id, text))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_and_get_chat_question() {
        let db = setup().await;
        users::upsert_user(
            &db,
            &UserProfile {
                user_id: 10,
                username: Some("ann".into()),
                first_name: Some("Ann".into()),
            },
        )
        .await
        .unwrap();
        let id = create_question(&db, &NewQuestion::from_chat(10, "App crashes on login"))
            .await
            .unwrap();

        let q = get_question(&db, id).await.unwrap().unwrap();
        assert_eq!(q.text, "App crashes on login");
        assert_eq!(q.status, QuestionStatus::New);
        assert_eq!(q.origin, QuestionOrigin::Chat);
        assert_eq!(q.moderator_id, None);
        assert_eq!(q.submitter_name(), "@ann");
    }

    #[tokio::test]
    async fn web_question_has_no_user() {
        let db = setup().await;
        let id = create_question(
            &db,
            &NewQuestion::from_web(Some("a@b.c".into()), "Form crash"),
        )
        .await
        .unwrap();
        let q = get_question(&db, id).await.unwrap().unwrap();
        assert_eq!(q.origin, QuestionOrigin::Web);
        assert_eq!(q.user_id, None);
        assert!(q.submitter.is_none());
        assert_eq!(q.contact.as_deref(), Some("a@b.c"));
    }

    #[tokio::test]
    async fn missing_question_is_none() {
        let db = setup().await;
        assert!(get_question(&db, 404).await.unwrap().is_none());
        assert!(!exists(&db, 404).await.unwrap());
    }

    #[tokio::test]
    async fn ids_increase() {
        let db = setup().await;
        let a = chat_question(&db, 1, "a").await;
        let b = chat_question(&db, 1, "b").await;
        assert!(b > a);
    }

    #[tokio::test]
    async fn claim_then_second_claim_fails() {
        let db = setup().await;
        let id = chat_question(&db, 1, "q").await;

        assert!(try_claim(&db, id, 100).await.unwrap());
        assert!(!try_claim(&db, id, 200).await.unwrap());
        assert_eq!(holder(&db, id).await.unwrap(), Some(100));

        let q = get_question(&db, id).await.unwrap().unwrap();
        assert_eq!(q.status, QuestionStatus::InProgress);
        assert_eq!(q.moderator_id, Some(100));
    }

    #[tokio::test]
    async fn self_claim_is_idempotent() {
        let db = setup().await;
        let id = chat_question(&db, 1, "q").await;
        assert!(try_claim(&db, id, 100).await.unwrap());
        assert!(try_claim(&db, id, 100).await.unwrap());
        assert_eq!(holder(&db, id).await.unwrap(), Some(100));
    }

    #[tokio::test]
    async fn claim_of_missing_question_fails() {
        let db = setup().await;
        assert!(!try_claim(&db, 9, 100).await.unwrap());
    }

    #[tokio::test]
    async fn release_returns_question_to_new() {
        let db = setup().await;
        let id = chat_question(&db, 1, "q").await;
        try_claim(&db, id, 100).await.unwrap();

        assert!(release(&db, id, None).await.unwrap());
        let q = get_question(&db, id).await.unwrap().unwrap();
        assert_eq!(q.status, QuestionStatus::New);
        assert_eq!(q.moderator_id, None);
        assert_eq!(holder(&db, id).await.unwrap(), None);

        // Nothing to release any more.
        assert!(!release(&db, id, None).await.unwrap());
        // Claimable again by someone else.
        assert!(try_claim(&db, id, 200).await.unwrap());
    }

    #[tokio::test]
    async fn holder_checked_release_ignores_other_moderators() {
        let db = setup().await;
        let id = chat_question(&db, 1, "q").await;
        try_claim(&db, id, 100).await.unwrap();

        assert!(!release(&db, id, Some(200)).await.unwrap());
        assert_eq!(holder(&db, id).await.unwrap(), Some(100));
        assert!(release(&db, id, Some(100)).await.unwrap());
    }

    fn chat_photo(n: u32) -> Attachment {
        Attachment::ChatPhoto {
            file_id: format!("file-{n}"),
            unique_id: format!("uniq-{n}"),
        }
    }

    #[tokio::test]
    async fn question_and_photos_are_written_together() {
        let db = setup().await;
        let photos = vec![chat_photo(1), chat_photo(2)];
        let id = create_with_photos(&db, &NewQuestion::from_web(None, "two shots"), &photos)
            .await
            .unwrap();
        assert_eq!(photos::list_photos(&db, id).await.unwrap(), photos);
        assert_eq!(get_question(&db, id).await.unwrap().unwrap().text, "two shots");
    }

    #[tokio::test]
    async fn failed_photo_insert_leaves_no_question() {
        let db = setup().await;
        db.connection()
            .call(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER reject_photo BEFORE INSERT ON question_photos
                     WHEN NEW.file_id = 'file-2'
                     BEGIN SELECT RAISE(ABORT, 'photo rejected'); END;",
                )
            })
            .await
            .unwrap();

        let err = create_with_photos(
            &db,
            &NewQuestion::from_web(None, "half written"),
            &[chat_photo(1), chat_photo(2)],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, HotlineError::Storage { .. }));

        assert_eq!(counts(&db).await.unwrap().total_questions(), 0);
        assert!(list_by_status(&db, QuestionStatus::New).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn claim_by_unknown_moderator_is_refused() {
        let db = setup().await;
        let id = chat_question(&db, 1, "q").await;
        assert!(matches!(
            try_claim(&db, id, 999).await,
            Err(HotlineError::Storage { .. })
        ));
        assert_eq!(holder(&db, id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn finalize_requires_holder_and_clears_it() {
        let db = setup().await;
        let id = chat_question(&db, 1, "q").await;
        try_claim(&db, id, 100).await.unwrap();

        assert!(!finalize(&db, id, 200, AnswerDelivery::Delivered).await.unwrap());
        assert!(finalize(&db, id, 100, AnswerDelivery::Delivered).await.unwrap());

        let q = get_question(&db, id).await.unwrap().unwrap();
        assert_eq!(q.status, QuestionStatus::Answered);
        assert_eq!(q.moderator_id, None);

        // Terminal: neither claim nor release moves it.
        assert!(!try_claim(&db, id, 100).await.unwrap());
        assert!(!release(&db, id, None).await.unwrap());
    }

    #[tokio::test]
    async fn failed_delivery_finalizes_as_error() {
        let db = setup().await;
        let id = chat_question(&db, 1, "q").await;
        try_claim(&db, id, 100).await.unwrap();
        assert!(finalize(&db, id, 100, AnswerDelivery::Failed).await.unwrap());
        let q = get_question(&db, id).await.unwrap().unwrap();
        assert_eq!(q.status, QuestionStatus::Error);
    }

    #[tokio::test]
    async fn set_status_refuses_in_progress_and_unknown_ids() {
        let db = setup().await;
        let id = chat_question(&db, 1, "q").await;
        assert!(matches!(
            set_status(&db, id, QuestionStatus::InProgress).await,
            Err(HotlineError::InvalidInput(_))
        ));
        assert!(matches!(
            set_status(&db, 999, QuestionStatus::Closed).await,
            Err(HotlineError::QuestionNotFound(999))
        ));

        try_claim(&db, id, 100).await.unwrap();
        set_status(&db, id, QuestionStatus::Closed).await.unwrap();
        let q = get_question(&db, id).await.unwrap().unwrap();
        assert_eq!(q.status, QuestionStatus::Closed);
        assert_eq!(q.moderator_id, None);
    }

    #[tokio::test]
    async fn list_by_status_is_oldest_first() {
        let db = setup().await;
        let a = chat_question(&db, 1, "a").await;
        let b = chat_question(&db, 1, "b").await;
        let c = chat_question(&db, 1, "c").await;
        try_claim(&db, b, 100).await.unwrap();

        let new: Vec<_> = list_by_status(&db, QuestionStatus::New)
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(new, vec![a, c]);
        let held = list_by_status(&db, QuestionStatus::InProgress).await.unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].id, b);
    }

    #[tokio::test]
    async fn counts_cover_every_status() {
        let db = setup().await;
        let a = chat_question(&db, 1, "a").await;
        let b = chat_question(&db, 1, "b").await;
        chat_question(&db, 1, "c").await;
        try_claim(&db, a, 100).await.unwrap();
        try_claim(&db, b, 100).await.unwrap();
        finalize(&db, b, 100, AnswerDelivery::Delivered).await.unwrap();
        crate::queries::feedback::add_feedback(&db, 1, "nice").await.unwrap();

        let counts = counts(&db).await.unwrap();
        assert_eq!(counts.new, 1);
        assert_eq!(counts.in_progress, 1);
        assert_eq!(counts.answered, 1);
        assert_eq!(counts.error, 0);
        assert_eq!(counts.feedback, 1);
        assert_eq!(counts.total_questions(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_claims_have_exactly_one_winner() {
        let db = setup().await;
        let id = chat_question(&db, 1, "race").await;

        let mut handles = Vec::new();
        for moderator in 100..120 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                (moderator, try_claim(&db, id, moderator).await.unwrap())
            }));
        }

        let mut winners = Vec::new();
        for handle in handles {
            let (moderator, won) = handle.await.unwrap();
            if won {
                winners.push(moderator);
            }
        }
        assert_eq!(winners.len(), 1);
        assert_eq!(holder(&db, id).await.unwrap(), Some(winners[0]));
    }
}
