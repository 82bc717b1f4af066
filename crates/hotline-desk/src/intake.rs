// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Question submission shared by the chat flow and the web gateway.

use std::sync::Arc;

use hotline_core::{Attachment, HotlineError, NewQuestion, QuestionId, StorageAdapter};
use tracing::{error, info, warn};

use crate::directory::ModeratorDirectory;
use crate::notify::{BroadcastReport, Notice, Notifier};

/// Persists questions and announces them to moderators.
#[derive(Clone)]
pub struct Intake {
    store: Arc<dyn StorageAdapter>,
    directory: ModeratorDirectory,
    notifier: Notifier,
    max_photos: usize,
}

/// What happened to a submitted question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    pub question_id: QuestionId,
    /// Photos persisted (after the cap).
    pub photos: usize,
    pub notified: BroadcastReport,
}

impl Intake {
    pub fn new(
        store: Arc<dyn StorageAdapter>,
        directory: ModeratorDirectory,
        notifier: Notifier,
        max_photos: usize,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            max_photos,
        }
    }

    pub fn max_photos(&self) -> usize {
        self.max_photos
    }

    /// Stores a question with at most `max_photos` attachments, then notifies
    /// every active moderator.
    ///
    /// Whitespace-only text is rejected before anything is written. Moderator
    /// notification happens after the rows are committed and cannot fail the
    /// submission.
    pub async fn submit(
        &self,
        question: NewQuestion,
        photos: Vec<Attachment>,
    ) -> Result<Submission, HotlineError> {
        if question.text.trim().is_empty() {
            return Err(HotlineError::InvalidInput(
                "question text must not be empty".into(),
            ));
        }

        let mut photos = photos;
        if photos.len() > self.max_photos {
            warn!(
                received = photos.len(),
                kept = self.max_photos,
                "dropping photos beyond the per-question cap"
            );
            photos.truncate(self.max_photos);
        }

        let question_id = self
            .store
            .create_question_with_photos(&question, &photos)
            .await?;
        metrics::counter!("hotline_questions_created_total", "origin" => question.origin.to_string())
            .increment(1);
        info!(
            question_id,
            origin = %question.origin,
            photos = photos.len(),
            "question created"
        );

        let notified = self.announce(question_id, photos.clone()).await;
        Ok(Submission {
            question_id,
            photos: photos.len(),
            notified,
        })
    }

    async fn announce(&self, question_id: QuestionId, photos: Vec<Attachment>) -> BroadcastReport {
        let lookup = async {
            let question = self
                .store
                .get_question(question_id)
                .await?
                .ok_or(HotlineError::QuestionNotFound(question_id))?;
            let moderators = self.directory.active().await?;
            Ok::<_, HotlineError>((question, moderators))
        };
        match lookup.await {
            Ok((question, moderators)) => {
                let notice = Notice::new_question(&question, photos);
                self.notifier.broadcast(&moderators, &notice).await
            }
            Err(e) => {
                error!(question_id, error = %e, "could not prepare new-question notice");
                BroadcastReport::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotline_core::{QuestionStatus, UserProfile};
    use hotline_storage::{Database, SqliteStorage};
    use hotline_test_utils::MockChannel;
    use proptest::prelude::*;

    async fn intake(cap: usize) -> (Arc<dyn StorageAdapter>, Arc<MockChannel>, Intake) {
        let db = Database::open_in_memory().await.unwrap();
        let store: Arc<dyn StorageAdapter> = Arc::new(SqliteStorage::from_database(db));
        let channel = Arc::new(MockChannel::new());
        let directory = ModeratorDirectory::new(store.clone(), [100, 200]);
        directory.register(&UserProfile::new(100)).await.unwrap();
        directory.register(&UserProfile::new(200)).await.unwrap();
        let intake = Intake::new(
            store.clone(),
            directory,
            Notifier::new(channel.clone()),
            cap,
        );
        (store, channel, intake)
    }

    fn photos(n: usize) -> Vec<Attachment> {
        (0..n)
            .map(|i| Attachment::ChatPhoto {
                file_id: format!("f{i}"),
                unique_id: format!("u{i}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn whitespace_text_creates_nothing() {
        let (store, channel, intake) = intake(3).await;
        let err = intake
            .submit(NewQuestion::from_web(None, "   "), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, HotlineError::InvalidInput(_)));
        assert_eq!(store.question_counts().await.unwrap().total_questions(), 0);
        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn submission_is_stored_then_announced() {
        let (store, channel, intake) = intake(3).await;
        let sub = intake
            .submit(NewQuestion::from_web(None, "App crashes on login"), vec![])
            .await
            .unwrap();

        let q = store.get_question(sub.question_id).await.unwrap().unwrap();
        assert_eq!(q.status, QuestionStatus::New);
        assert_eq!(sub.notified.delivered, 2);
        for moderator in [100, 200] {
            assert!(
                channel
                    .texts_to(moderator)
                    .iter()
                    .any(|t| t.contains(&format!("#Q{}", sub.question_id)))
            );
        }
    }

    #[tokio::test]
    async fn notify_failure_keeps_question() {
        let (store, channel, intake) = intake(3).await;
        channel.fail_chat(100);
        channel.fail_chat(200);
        let sub = intake
            .submit(NewQuestion::from_web(None, "still saved"), vec![])
            .await
            .unwrap();
        assert_eq!(sub.notified.failed, 2);
        assert!(store.get_question(sub.question_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn five_photos_are_capped_to_three() {
        let (store, _channel, intake) = intake(3).await;
        let sub = intake
            .submit(NewQuestion::from_web(None, "screens"), photos(5))
            .await
            .unwrap();
        assert_eq!(sub.photos, 3);
        assert_eq!(store.list_photos(sub.question_id).await.unwrap(), photos(3));
    }

    #[tokio::test]
    async fn rejected_photo_leaves_nothing_to_duplicate() {
        let db = Database::open_in_memory().await.unwrap();
        db.connection()
            .call(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER reject_photo BEFORE INSERT ON question_photos
                     WHEN NEW.file_id = 'f1'
                     BEGIN SELECT RAISE(ABORT, 'photo rejected'); END;",
                )
            })
            .await
            .unwrap();
        let store: Arc<dyn StorageAdapter> = Arc::new(SqliteStorage::from_database(db));
        let channel = Arc::new(MockChannel::new());
        let directory = ModeratorDirectory::new(store.clone(), [100]);
        directory.register(&UserProfile::new(100)).await.unwrap();
        let intake = Intake::new(store.clone(), directory, Notifier::new(channel.clone()), 3);

        let err = intake
            .submit(NewQuestion::from_web(None, "two screenshots"), photos(2))
            .await
            .unwrap_err();
        assert!(matches!(err, HotlineError::Storage { .. }));
        assert_eq!(store.question_counts().await.unwrap().total_questions(), 0);
        assert!(channel.sent().is_empty());

        // A retry without the bad photo stores exactly one question.
        intake
            .submit(NewQuestion::from_web(None, "one screenshot"), photos(1))
            .await
            .unwrap();
        assert_eq!(store.question_counts().await.unwrap().total_questions(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]
        #[test]
        fn stored_photos_never_exceed_cap(cap in 1usize..=5, count in 0usize..=10) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let stored = rt.block_on(async {
                let (store, _channel, intake) = intake(cap).await;
                let sub = intake
                    .submit(NewQuestion::from_web(None, "q"), photos(count))
                    .await
                    .unwrap();
                store.list_photos(sub.question_id).await.unwrap().len()
            });
            prop_assert_eq!(stored, count.min(cap));
        }
    }
}
