// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation state for end users and moderators.
//!
//! A conversation is either composing something (feedback or a question) or
//! waiting for a choice. Separately, a moderator conversation may carry an
//! `answering` marker naming the question they claimed; while it is set the
//! moderator flow owns every message in that conversation.
//!
//! State lives in memory only. A restart drops half-written questions and
//! open answer sessions; claimed questions stay claimed in the store.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use hotline_core::{Attachment, QuestionId};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Identifies one conversation: the channel name plus the chat id in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub channel: String,
    pub chat_id: i64,
}

impl SessionKey {
    pub fn new(channel: impl Into<String>, chat_id: i64) -> Self {
        Self {
            channel: channel.into(),
            chat_id,
        }
    }
}

/// A question being composed across several messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionDraft {
    pub photos: Vec<Attachment>,
}

impl QuestionDraft {
    /// Appends photos up to `cap` in total; returns how many were dropped.
    pub fn add_photos(&mut self, photos: impl IntoIterator<Item = Attachment>, cap: usize) -> usize {
        let mut dropped = 0;
        for photo in photos {
            if self.photos.len() < cap {
                self.photos.push(photo);
            } else {
                dropped += 1;
            }
        }
        dropped
    }

    pub fn is_full(&self, cap: usize) -> bool {
        self.photos.len() >= cap
    }
}

/// What the end-user side of the conversation is waiting for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UserState {
    #[default]
    AwaitingChoice,
    AwaitingFeedback,
    AwaitingQuestion(QuestionDraft),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    pub state: UserState,
    /// Question this moderator claimed and is writing an answer for.
    pub answering: Option<QuestionId>,
}

impl Conversation {
    /// Back to the choice menu, keeping any answer marker.
    pub fn reset(&mut self) {
        self.state = UserState::AwaitingChoice;
    }
}

/// Hands out exclusive access to one conversation at a time.
///
/// Two messages from the same chat are processed one after the other;
/// messages from different chats never wait on each other.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn acquire(&self, key: &SessionKey) -> SessionGuard;

    /// Number of conversations currently tracked.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

type Slots = DashMap<SessionKey, Arc<Mutex<Conversation>>>;

/// Exclusive access to one conversation.
///
/// When dropped in the default state with nobody else waiting, the
/// conversation is forgotten, so idle chats take no memory.
pub struct SessionGuard {
    key: SessionKey,
    guard: OwnedMutexGuard<Conversation>,
    slots: Arc<Slots>,
}

impl Deref for SessionGuard {
    type Target = Conversation;

    fn deref(&self) -> &Conversation {
        &self.guard
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Conversation {
        &mut self.guard
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if *self.guard != Conversation::default() {
            return;
        }
        // Still locked here: the map and this guard hold the only two
        // references unless another message is already queued on the slot.
        self.slots.remove_if(&self.key, |_, slot| Arc::strong_count(slot) == 2);
    }
}

/// Process-local session store.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Arc<Slots>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn acquire(&self, key: &SessionKey) -> SessionGuard {
        // Clone the Arc out so the shard lock is dropped before awaiting.
        let slot = self
            .sessions
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Conversation::default())))
            .clone();
        SessionGuard {
            key: key.clone(),
            guard: slot.lock_owned().await,
            slots: Arc::clone(&self.sessions),
        }
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}
