// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Moderator answers.

use hotline_core::{Answer, HotlineError, QuestionId, UserId, UserProfile};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::queries::questions;

/// Record an answer. Returns the answer id.
pub async fn add_answer(
    db: &Database,
    question_id: QuestionId,
    moderator_id: UserId,
    text: &str,
) -> Result<i64, HotlineError> {
    if !questions::exists(db, question_id).await? {
        return Err(HotlineError::QuestionNotFound(question_id));
    }
    let text = text.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO answers (question_id, moderator_id, text) VALUES (?1, ?2, ?3)",
                params![question_id, moderator_id, text],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Answers of a question, oldest first.
pub async fn list_answers(
    db: &Database,
    question_id: QuestionId,
) -> Result<Vec<Answer>, HotlineError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT a.id, a.question_id, a.moderator_id, a.text, a.created_at,
                        m.username, m.first_name
                 FROM answers a
                 LEFT JOIN moderators m ON m.user_id = a.moderator_id
                 WHERE a.question_id = ?1 ORDER BY a.id",
            )?;
            let rows = stmt.query_map(params![question_id], |row| {
                let moderator_id: UserId = row.get(2)?;
                let username: Option<String> = row.get(5)?;
                let first_name: Option<String> = row.get(6)?;
                let moderator_name = (username.is_some() || first_name.is_some()).then(|| {
                    UserProfile {
                        user_id: moderator_id,
                        username,
                        first_name,
                    }
                    .display_name()
                });
                Ok(Answer {
                    id: row.get(0)?,
                    question_id: row.get(1)?,
                    moderator_id,
                    moderator_name,
                    text: row.get(3)?,
                    created_at: row.get(4)?,
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

    #[tokio::test]
    async fn answers_are_listed_per_question() {
        let db = Database::open_in_memory().await.unwrap();
        let q1 = questions::create_question(&db, &NewQuestion::from_web(None, "a"))
            .await
            .unwrap();
        let q2 = questions::create_question(&db, &NewQuestion::from_web(None, "b"))
            .await
            .unwrap();

        crate::queries::moderators::upsert_moderator(
            &db,
            &UserProfile {
                user_id: 100,
                username: Some("support_lead".into()),
                first_name: None,
            },
        )
        .await
        .unwrap();
        crate::queries::moderators::upsert_moderator(&db, &UserProfile::new(200))
            .await
            .unwrap();
        add_answer(&db, q1, 100, "Please update to v2.1").await.unwrap();
        add_answer(&db, q2, 200, "other").await.unwrap();

        let answers = list_answers(&db, q1).await.unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].text, "Please update to v2.1");
        assert_eq!(answers[0].moderator_id, 100);
        assert_eq!(answers[0].question_id, q1);
        assert_eq!(answers[0].moderator_name.as_deref(), Some("@support_lead"));

        let nameless = list_answers(&db, q2).await.unwrap();
        assert_eq!(nameless[0].moderator_name, None);
    }

    #[tokio::test]
    async fn answer_by_unknown_moderator_fails() {
        let db = Database::open_in_memory().await.unwrap();
        let q = questions::create_question(&db, &NewQuestion::from_web(None, "a"))
            .await
            .unwrap();
        assert!(matches!(
            add_answer(&db, q, 404, "x").await,
            Err(HotlineError::Storage { .. })
        ));
        assert!(list_answers(&db, q).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn answer_to_missing_question_fails() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(matches!(
            add_answer(&db, 5, 100, "x").await,
            Err(HotlineError::QuestionNotFound(5))
        ));
    }
}
