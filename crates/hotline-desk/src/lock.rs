// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-owner claiming of questions by moderators.
//!
//! There is no in-process mutex here. Every transition is one conditional
//! write in the store, and its affected-row count decides the winner, so the
//! guarantees hold across tasks and across processes sharing the database.

use std::sync::Arc;

use hotline_core::{AnswerDelivery, HotlineError, QuestionId, StorageAdapter, UserId};
use tracing::{debug, info};

/// Result of a claim attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The caller now holds the question (or already did).
    Acquired,
    /// Another moderator holds it.
    HeldByOther(UserId),
    /// The question is terminal or does not exist.
    Unavailable,
}

impl ClaimOutcome {
    fn label(self) -> &'static str {
        match self {
            ClaimOutcome::Acquired => "acquired",
            ClaimOutcome::HeldByOther(_) => "contended",
            ClaimOutcome::Unavailable => "unavailable",
        }
    }
}

/// Claim, release and finalize on top of the store's conditional updates.
#[derive(Clone)]
pub struct QuestionLock {
    store: Arc<dyn StorageAdapter>,
}

impl QuestionLock {
    pub fn new(store: Arc<dyn StorageAdapter>) -> Self {
        Self { store }
    }

    /// Try to become the holder of `question_id`.
    ///
    /// Re-claiming a question already held by `moderator_id` succeeds without
    /// changing anything.
    pub async fn claim(
        &self,
        question_id: QuestionId,
        moderator_id: UserId,
    ) -> Result<ClaimOutcome, HotlineError> {
        let outcome = if self.store.try_claim(question_id, moderator_id).await? {
            ClaimOutcome::Acquired
        } else {
            // Only used to word the refusal; the claim itself already failed.
            match self.store.question_holder(question_id).await? {
                Some(holder) => ClaimOutcome::HeldByOther(holder),
                None => ClaimOutcome::Unavailable,
            }
        };

        metrics::counter!("hotline_claims_total", "outcome" => outcome.label()).increment(1);
        match outcome {
            ClaimOutcome::Acquired => {
                info!(question_id, moderator_id, "question claimed")
            }
            ClaimOutcome::HeldByOther(holder) => {
                info!(question_id, moderator_id, holder, "claim lost to another moderator")
            }
            ClaimOutcome::Unavailable => {
                info!(question_id, moderator_id, "claim refused: question closed or missing")
            }
        }
        Ok(outcome)
    }

    /// Return an `in_progress` question to `new`, whoever holds it.
    pub async fn release(&self, question_id: QuestionId) -> Result<bool, HotlineError> {
        let released = self.store.release_question(question_id, None).await?;
        debug!(question_id, released, "release");
        Ok(released)
    }

    /// Return the question to `new` only if `moderator_id` still holds it.
    pub async fn release_held(
        &self,
        question_id: QuestionId,
        moderator_id: UserId,
    ) -> Result<bool, HotlineError> {
        let released = self
            .store
            .release_question(question_id, Some(moderator_id))
            .await?;
        debug!(question_id, moderator_id, released, "holder release");
        Ok(released)
    }

    pub async fn current_holder(
        &self,
        question_id: QuestionId,
    ) -> Result<Option<UserId>, HotlineError> {
        self.store.question_holder(question_id).await
    }

    /// Move a held question to `answered` or `error`. False when `moderator_id`
    /// no longer holds it.
    pub async fn finalize(
        &self,
        question_id: QuestionId,
        moderator_id: UserId,
        delivery: AnswerDelivery,
    ) -> Result<bool, HotlineError> {
        let done = self
            .store
            .finalize_question(question_id, moderator_id, delivery)
            .await?;
        debug!(question_id, moderator_id, ?delivery, done, "finalize");
        Ok(done)
    }
}
