// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound messages,
//! captured outbound messages, and switches that make chosen chats fail or
//! make the platform refuse photo albums.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Notify;

use hotline_core::{
    AdapterType, Attachment, ChannelAdapter, ChannelCapabilities, HealthStatus, HotlineError,
    InboundMessage, MessageContent, MessageId, OutboundBody, OutboundMessage, PluginAdapter,
    UserProfile,
};

/// Error text used for chats registered with [`MockChannel::fail_chat`].
pub const BLOCKED_ERROR: &str = "Forbidden: bot was blocked by the user";

/// Builds a private-chat text message from `user_id`.
pub fn inbound_text(user_id: i64, text: &str) -> InboundMessage {
    inbound(UserProfile::new(user_id), MessageContent::Text(text.to_string()))
}

/// Builds a private-chat photo message from `user_id` with `count` photos.
pub fn inbound_photos(user_id: i64, count: usize, caption: Option<&str>) -> InboundMessage {
    let photos = (0..count)
        .map(|i| Attachment::ChatPhoto {
            file_id: format!("photo-{user_id}-{i}"),
            unique_id: format!("uniq-{user_id}-{i}"),
        })
        .collect();
    inbound(
        UserProfile::new(user_id),
        MessageContent::Photos {
            photos,
            caption: caption.map(str::to_string),
        },
    )
}

pub(crate) fn inbound(sender: UserProfile, content: MessageContent) -> InboundMessage {
    InboundMessage {
        id: format!("test-{}", uuid::Uuid::new_v4()),
        channel: "mock".to_string(),
        chat_id: sender.user_id,
        sender,
        content,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

fn guard<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A mock messaging channel for testing.
///
/// - **inbound**: messages queued with `push` are returned by `receive()`;
///   after `close()` an empty queue yields a "channel closed" error
/// - **sent**: successful `send()` calls are captured for assertions
pub struct MockChannel {
    inbound: Mutex<VecDeque<InboundMessage>>,
    sent: Mutex<Vec<OutboundMessage>>,
    failing: Mutex<HashSet<i64>>,
    reject_albums: AtomicBool,
    closed: AtomicBool,
    notify: Notify,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            inbound: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            reject_albums: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Queues an inbound message for `receive()`.
    pub fn push(&self, msg: InboundMessage) {
        guard(&self.inbound).push_back(msg);
        self.notify.notify_one();
    }

    pub fn push_text(&self, user_id: i64, text: &str) {
        self.push(inbound_text(user_id, text));
    }

    /// No further messages will arrive once the queue is drained.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Every send to `chat_id` fails as if the user blocked the bot.
    pub fn fail_chat(&self, chat_id: i64) {
        guard(&self.failing).insert(chat_id);
    }

    /// Album sends fail with [`HotlineError::MediaRejected`].
    pub fn reject_albums(&self, reject: bool) {
        self.reject_albums.store(reject, Ordering::SeqCst);
    }

    /// Everything delivered so far.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        guard(&self.sent).clone()
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<OutboundMessage> {
        guard(&self.sent)
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect()
    }

    /// Texts and captions delivered to `chat_id`, in order.
    pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
        self.sent_to(chat_id)
            .iter()
            .filter_map(|m| m.visible_text().map(str::to_string))
            .collect()
    }

    /// The most recent text or caption delivered to `chat_id`.
    pub fn last_text_to(&self, chat_id: i64) -> Option<String> {
        self.texts_to(chat_id).pop()
    }

    pub fn clear_sent(&self) {
        guard(&self.sent).clear();
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, HotlineError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HotlineError> {
        self.close();
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_albums: true,
            max_album_size: 10,
            max_message_length: Some(4096),
            max_caption_length: Some(1024),
        }
    }

    async fn connect(&mut self) -> Result<(), HotlineError> {
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, HotlineError> {
        if guard(&self.failing).contains(&msg.chat_id) {
            return Err(HotlineError::Channel {
                message: BLOCKED_ERROR.to_string(),
                source: None,
            });
        }
        if matches!(msg.body, OutboundBody::Album { .. })
            && self.reject_albums.load(Ordering::SeqCst)
        {
            return Err(HotlineError::MediaRejected {
                message: "MEDIA_GROUP_INVALID".to_string(),
            });
        }
        guard(&self.sent).push(msg);
        Ok(MessageId(format!("mock-msg-{}", uuid::Uuid::new_v4())))
    }

    async fn receive(&self) -> Result<InboundMessage, HotlineError> {
        loop {
            if let Some(msg) = guard(&self.inbound).pop_front() {
                return Ok(msg);
            }
            if self.closed.load(Ordering::SeqCst) {
                return Err(HotlineError::Channel {
                    message: "mock channel closed".to_string(),
                    source: None,
                });
            }
            self.notify.notified().await;
        }
    }
}
