// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end conversation tests.
//!
//! `TestHarness` assembles a dispatcher over a temporary SQLite file and a
//! [`MockChannel`]. Messages are handled inline, so every reply is visible
//! as soon as the `send_*` call returns.

use std::sync::Arc;

use hotline_core::{HotlineError, InboundMessage, MessageContent, StorageAdapter, UserProfile};
use hotline_desk::dispatch::{BUTTON_FEEDBACK, BUTTON_QUESTION};
use hotline_desk::{Dispatcher, MemorySessionStore, ModeratorDirectory};
use hotline_storage::{Database, SqliteStorage};

use crate::mock_channel::{MockChannel, inbound, inbound_photos, inbound_text};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    admin_ids: Vec<i64>,
    max_photos: usize,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            admin_ids: Vec::new(),
            max_photos: 3,
        }
    }

    /// User ids allowed to register with `/moderator`.
    pub fn with_admins(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.admin_ids = ids.into_iter().collect();
        self
    }

    pub fn with_max_photos(mut self, cap: usize) -> Self {
        self.max_photos = cap;
        self
    }

    /// Creates the temp database and wires the dispatcher.
    pub async fn build(self) -> Result<TestHarness, HotlineError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| HotlineError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("hotline-test.db");

        let db = Database::open_with(&db_path.to_string_lossy(), true).await?;
        let store: Arc<dyn StorageAdapter> = Arc::new(SqliteStorage::from_database(db.clone()));

        let channel = Arc::new(MockChannel::new());
        let directory = ModeratorDirectory::new(store.clone(), self.admin_ids);
        let dispatcher = Dispatcher::new(
            store.clone(),
            channel.clone(),
            Arc::new(MemorySessionStore::new()),
            directory,
            self.max_photos,
        );

        Ok(TestHarness {
            db,
            store,
            channel,
            dispatcher,
            _temp_dir: temp_dir,
        })
    }
}

/// A dispatcher over a throwaway database and a mock channel.
pub struct TestHarness {
    /// Raw handle on the same database, for tests that bend the schema.
    pub db: Database,
    pub store: Arc<dyn StorageAdapter>,
    pub channel: Arc<MockChannel>,
    pub dispatcher: Dispatcher,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Handles one message and waits for the dispatcher to finish with it.
    pub async fn deliver(&self, msg: InboundMessage) {
        self.dispatcher.handle(msg).await;
    }

    pub async fn send_text(&self, user_id: i64, text: &str) {
        self.deliver(inbound_text(user_id, text)).await;
    }

    pub async fn send_text_as(&self, profile: &UserProfile, text: &str) {
        self.deliver(inbound(
            profile.clone(),
            MessageContent::Text(text.to_string()),
        ))
        .await;
    }

    pub async fn send_photos(&self, user_id: i64, count: usize, caption: Option<&str>) {
        self.deliver(inbound_photos(user_id, count, caption)).await;
    }

    /// `/moderator` from `user_id`.
    pub async fn register_moderator(&self, user_id: i64) {
        self.send_text(user_id, "/moderator").await;
    }

    /// Walks `user_id` to the question prompt.
    pub async fn open_question(&self, user_id: i64) {
        self.send_text(user_id, "/start").await;
        self.send_text(user_id, BUTTON_QUESTION).await;
    }

    /// Walks `user_id` to the feedback prompt.
    pub async fn open_feedback(&self, user_id: i64) {
        self.send_text(user_id, "/start").await;
        self.send_text(user_id, BUTTON_FEEDBACK).await;
    }

    /// Asks a text-only question and returns the id it was stored under.
    pub async fn ask(&self, user_id: i64, text: &str) -> Result<i64, HotlineError> {
        self.open_question(user_id).await;
        self.send_text(user_id, text).await;
        let newest = self
            .store
            .list_questions_by_status(hotline_core::QuestionStatus::New)
            .await?
            .into_iter()
            .filter(|q| q.user_id == Some(user_id))
            .map(|q| q.id)
            .max();
        newest.ok_or_else(|| HotlineError::Internal(format!("no question stored for {user_id}")))
    }

    pub fn last_reply(&self, chat_id: i64) -> String {
        self.channel.last_text_to(chat_id).unwrap_or_default()
    }
}
