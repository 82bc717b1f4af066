// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait: the durable question store.

use async_trait::async_trait;

use crate::error::HotlineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Answer, AnswerDelivery, Attachment, Moderator, NewQuestion, Question, QuestionCounts,
    QuestionId, QuestionStatus, UserId, UserProfile,
};

/// Durable store for users, questions, photos, answers, moderators and feedback.
///
/// The lock primitives (`try_claim`, `release_question`, `finalize_question`)
/// are each a single conditional write. Implementations must make them
/// atomic with respect to one another: of any number of concurrent
/// `try_claim` calls on a `new` question, exactly one returns `true`.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), HotlineError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), HotlineError>;

    // --- Users ---

    /// Creates the user on first contact, refreshes names otherwise.
    async fn upsert_user(&self, profile: &UserProfile) -> Result<(), HotlineError>;

    // --- Questions ---

    /// Inserts a question with status `new` and returns its id.
    async fn create_question(&self, question: &NewQuestion) -> Result<QuestionId, HotlineError>;

    /// Inserts a question and its photos atomically: on error nothing is stored.
    async fn create_question_with_photos(
        &self,
        question: &NewQuestion,
        photos: &[Attachment],
    ) -> Result<QuestionId, HotlineError>;

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, HotlineError>;

    /// Questions in the given status, oldest first.
    async fn list_questions_by_status(
        &self,
        status: QuestionStatus,
    ) -> Result<Vec<Question>, HotlineError>;

    /// Forces a status outside of the lock protocol. `InProgress` is refused
    /// because it needs a holder; every other status clears the holder.
    async fn set_status(&self, id: QuestionId, status: QuestionStatus)
    -> Result<(), HotlineError>;

    async fn attach_photo(&self, id: QuestionId, photo: &Attachment) -> Result<(), HotlineError>;

    /// Photos of a question in attach order.
    async fn list_photos(&self, id: QuestionId) -> Result<Vec<Attachment>, HotlineError>;

    // --- Lock primitives ---

    /// Atomically moves a `new` question to `in_progress` held by `moderator_id`.
    /// Also succeeds when `moderator_id` already holds it.
    async fn try_claim(&self, id: QuestionId, moderator_id: UserId)
    -> Result<bool, HotlineError>;

    /// Moves an `in_progress` question back to `new`. With `holder`, only
    /// when that moderator holds it. Returns whether anything changed.
    async fn release_question(
        &self,
        id: QuestionId,
        holder: Option<UserId>,
    ) -> Result<bool, HotlineError>;

    /// The moderator holding the question, if it is `in_progress`.
    async fn question_holder(&self, id: QuestionId) -> Result<Option<UserId>, HotlineError>;

    /// Moves a question held by `moderator_id` to its terminal status and
    /// clears the holder. Returns false when the caller is not the holder.
    async fn finalize_question(
        &self,
        id: QuestionId,
        moderator_id: UserId,
        delivery: AnswerDelivery,
    ) -> Result<bool, HotlineError>;

    // --- Answers ---

    async fn add_answer(
        &self,
        question_id: QuestionId,
        moderator_id: UserId,
        text: &str,
    ) -> Result<i64, HotlineError>;

    async fn list_answers(&self, question_id: QuestionId) -> Result<Vec<Answer>, HotlineError>;

    // --- Moderators ---

    /// Registers a moderator or refreshes their names. Always leaves them active.
    async fn upsert_moderator(&self, profile: &UserProfile) -> Result<(), HotlineError>;

    async fn list_active_moderators(&self) -> Result<Vec<Moderator>, HotlineError>;

    async fn is_active_moderator(&self, user_id: UserId) -> Result<bool, HotlineError>;

    // --- Feedback and reporting ---

    async fn add_feedback(&self, user_id: UserId, text: &str) -> Result<i64, HotlineError>;

    async fn question_counts(&self) -> Result<QuestionCounts, HotlineError>;
}
