// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use hotline_config::model::StorageConfig;
use hotline_core::{
    AdapterType, Answer, AnswerDelivery, Attachment, HealthStatus, HotlineError, Moderator,
    NewQuestion, PluginAdapter, Question, QuestionCounts, QuestionId, QuestionStatus,
    StorageAdapter, UserId, UserProfile,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed question store.
///
/// The database is opened lazily by [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Storage for the configured file. Nothing is opened until `initialize`.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wraps an already-open database (e.g. [`Database::open_in_memory`]).
    pub fn from_database(db: Database) -> Self {
        Self {
            config: StorageConfig {
                database_path: ":memory:".to_string(),
                wal_mode: false,
            },
            db: OnceCell::new_with(Some(db)),
        }
    }

    fn db(&self) -> Result<&Database, HotlineError> {
        self.db.get().ok_or_else(|| HotlineError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, HotlineError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HotlineError> {
        if self.db.get().is_some() {
            self.close().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), HotlineError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| HotlineError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), HotlineError> {
        let db = self.db()?;
        if self.config.wal_mode {
            db.checkpoint().await?;
            debug!("WAL checkpoint complete");
        }
        Ok(())
    }

    async fn upsert_user(&self, profile: &UserProfile) -> Result<(), HotlineError> {
        queries::users::upsert_user(self.db()?, profile).await
    }

    async fn create_question(&self, question: &NewQuestion) -> Result<QuestionId, HotlineError> {
        queries::questions::create_question(self.db()?, question).await
    }

    async fn create_question_with_photos(
        &self,
        question: &NewQuestion,
        photos: &[Attachment],
    ) -> Result<QuestionId, HotlineError> {
        queries::questions::create_with_photos(self.db()?, question, photos).await
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, HotlineError> {
        queries::questions::get_question(self.db()?, id).await
    }

    async fn list_questions_by_status(
        &self,
        status: QuestionStatus,
    ) -> Result<Vec<Question>, HotlineError> {
        queries::questions::list_by_status(self.db()?, status).await
    }

    async fn set_status(
        &self,
        id: QuestionId,
        status: QuestionStatus,
    ) -> Result<(), HotlineError> {
        queries::questions::set_status(self.db()?, id, status).await
    }

    async fn attach_photo(&self, id: QuestionId, photo: &Attachment) -> Result<(), HotlineError> {
        queries::photos::attach_photo(self.db()?, id, photo).await
    }

    async fn list_photos(&self, id: QuestionId) -> Result<Vec<Attachment>, HotlineError> {
        queries::photos::list_photos(self.db()?, id).await
    }

    async fn try_claim(
        &self,
        id: QuestionId,
        moderator_id: UserId,
    ) -> Result<bool, HotlineError> {
        queries::questions::try_claim(self.db()?, id, moderator_id).await
    }

    async fn release_question(
        &self,
        id: QuestionId,
        holder: Option<UserId>,
    ) -> Result<bool, HotlineError> {
        queries::questions::release(self.db()?, id, holder).await
    }

    async fn question_holder(&self, id: QuestionId) -> Result<Option<UserId>, HotlineError> {
        queries::questions::holder(self.db()?, id).await
    }

    async fn finalize_question(
        &self,
        id: QuestionId,
        moderator_id: UserId,
        delivery: AnswerDelivery,
    ) -> Result<bool, HotlineError> {
        queries::questions::finalize(self.db()?, id, moderator_id, delivery).await
    }

    async fn add_answer(
        &self,
        question_id: QuestionId,
        moderator_id: UserId,
        text: &str,
    ) -> Result<i64, HotlineError> {
        queries::answers::add_answer(self.db()?, question_id, moderator_id, text).await
    }

    async fn list_answers(&self, question_id: QuestionId) -> Result<Vec<Answer>, HotlineError> {
        queries::answers::list_answers(self.db()?, question_id).await
    }

    async fn upsert_moderator(&self, profile: &UserProfile) -> Result<(), HotlineError> {
        queries::moderators::upsert_moderator(self.db()?, profile).await
    }

    async fn list_active_moderators(&self) -> Result<Vec<Moderator>, HotlineError> {
        queries::moderators::list_active(self.db()?).await
    }

    async fn is_active_moderator(&self, user_id: UserId) -> Result<bool, HotlineError> {
        queries::moderators::is_active(self.db()?, user_id).await
    }

    async fn add_feedback(&self, user_id: UserId, text: &str) -> Result<i64, HotlineError> {
        queries::feedback::add_feedback(self.db()?, user_id, text).await
    }

    async fn question_counts(&self) -> Result<QuestionCounts, HotlineError> {
        queries::questions::counts(self.db()?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let storage = SqliteStorage::new(make_config("unused.db"));
        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init_test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn operations_fail_before_initialize() {
        let storage = SqliteStorage::new(make_config("never-opened.db"));
        assert!(storage.health_check().await.is_err());
        assert!(storage.get_question(1).await.is_err());
        // Shutdown of an unopened store is a no-op.
        storage.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn question_lifecycle_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();

        storage.upsert_user(&UserProfile::new(1)).await.unwrap();
        storage.upsert_moderator(&UserProfile::new(100)).await.unwrap();
        let id = storage
            .create_question(&NewQuestion::from_chat(1, "App crashes on login"))
            .await
            .unwrap();

        assert!(storage.try_claim(id, 100).await.unwrap());
        assert_eq!(storage.question_holder(id).await.unwrap(), Some(100));
        storage.add_answer(id, 100, "Please update to v2.1").await.unwrap();
        assert!(
            storage
                .finalize_question(id, 100, AnswerDelivery::Delivered)
                .await
                .unwrap()
        );

        let q = storage.get_question(id).await.unwrap().unwrap();
        assert_eq!(q.status, QuestionStatus::Answered);
        assert_eq!(storage.list_answers(id).await.unwrap().len(), 1);
        assert_eq!(storage.question_counts().await.unwrap().answered, 1);

        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reopen.db");
        let path = db_path.to_str().unwrap();

        let id = {
            let storage = SqliteStorage::new(make_config(path));
            storage.initialize().await.unwrap();
            let id = storage
                .create_question(&NewQuestion::from_web(None, "persist me"))
                .await
                .unwrap();
            storage.shutdown().await.unwrap();
            id
        };

        let storage = SqliteStorage::new(make_config(path));
        storage.initialize().await.unwrap();
        let q = storage.get_question(id).await.unwrap().unwrap();
        assert_eq!(q.text, "persist me");
    }
}
