// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the question store, the desk and the channel adapters.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a stored question. Rendered to people as `#Q{id}`.
pub type QuestionId = i64;

/// Identifier of a chat-platform user (submitter or moderator).
pub type UserId = i64;

/// Identifier of a delivered message, as reported by the channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
    Gateway,
}

// --- Questions ---

/// Lifecycle state of a question.
///
/// `New -> InProgress` via claim, `InProgress -> New` via release,
/// `InProgress -> Answered | Error` via finalize. `Closed` is reserved.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    New,
    InProgress,
    Answered,
    Error,
    Closed,
}

impl QuestionStatus {
    /// Terminal states can never be claimed again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            QuestionStatus::Answered | QuestionStatus::Error | QuestionStatus::Closed
        )
    }
}

/// Where a question entered the system.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuestionOrigin {
    /// Submitted through the chat bot; the submitter can be replied to.
    Chat,
    /// Submitted through the web form; there is no chat to reply into.
    Web,
}

/// Basic profile of a chat-platform user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl UserProfile {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            username: None,
            first_name: None,
        }
    }

    /// `@username` when known, otherwise the first name, otherwise the numeric id.
    pub fn display_name(&self) -> String {
        display_name(self.user_id, self.username.as_deref(), self.first_name.as_deref())
    }
}

pub(crate) fn display_name(
    user_id: UserId,
    username: Option<&str>,
    first_name: Option<&str>,
) -> String {
    match (username, first_name) {
        (Some(u), _) if !u.is_empty() => format!("@{u}"),
        (_, Some(f)) if !f.is_empty() => f.to_string(),
        _ => format!("id {user_id}"),
    }
}

/// Fields supplied when a question is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub origin: QuestionOrigin,
    /// Chat submitter. `None` for web questions.
    pub user_id: Option<UserId>,
    /// Free-form contact (e.g. an email address) for web questions.
    pub contact: Option<String>,
    pub text: String,
}

impl NewQuestion {
    pub fn from_chat(user_id: UserId, text: impl Into<String>) -> Self {
        Self {
            origin: QuestionOrigin::Chat,
            user_id: Some(user_id),
            contact: None,
            text: text.into(),
        }
    }

    pub fn from_web(contact: Option<String>, text: impl Into<String>) -> Self {
        Self {
            origin: QuestionOrigin::Web,
            user_id: None,
            contact,
            text: text.into(),
        }
    }
}

/// A stored question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: QuestionId,
    pub origin: QuestionOrigin,
    pub user_id: Option<UserId>,
    pub contact: Option<String>,
    pub text: String,
    pub status: QuestionStatus,
    /// Set exactly when `status` is `InProgress`.
    pub moderator_id: Option<UserId>,
    pub created_at: String,
    /// Submitter profile joined from the user table, when one exists.
    pub submitter: Option<UserProfile>,
}

impl Question {
    /// `#Q{id}` tag used in every human-facing message.
    pub fn tag(&self) -> String {
        question_tag(self.id)
    }

    /// Human name of whoever submitted the question.
    pub fn submitter_name(&self) -> String {
        match (&self.submitter, &self.contact) {
            (Some(profile), _) => profile.display_name(),
            (None, Some(contact)) if !contact.is_empty() => contact.clone(),
            (None, _) => match self.origin {
                QuestionOrigin::Web => "web form".to_string(),
                QuestionOrigin::Chat => "unknown user".to_string(),
            },
        }
    }
}

/// Formats a question id as `#Q{id}`.
pub fn question_tag(id: QuestionId) -> String {
    format!("#Q{id}")
}

/// How delivering an answer to the submitter ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerDelivery {
    Delivered,
    Failed,
}

impl AnswerDelivery {
    /// The terminal status a question takes for this delivery outcome.
    pub fn status(self) -> QuestionStatus {
        match self {
            AnswerDelivery::Delivered => QuestionStatus::Answered,
            AnswerDelivery::Failed => QuestionStatus::Error,
        }
    }
}

/// A moderator's reply to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub id: i64,
    pub question_id: QuestionId,
    pub moderator_id: UserId,
    /// Display name of the answering moderator, when they are registered.
    pub moderator_name: Option<String>,
    pub text: String,
    pub created_at: String,
}

/// A registered moderator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Moderator {
    pub user_id: UserId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub is_active: bool,
}

impl Moderator {
    pub fn display_name(&self) -> String {
        display_name(self.user_id, self.username.as_deref(), self.first_name.as_deref())
    }
}

/// Per-status question totals plus the feedback count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuestionCounts {
    pub new: u64,
    pub in_progress: u64,
    pub answered: u64,
    pub error: u64,
    pub closed: u64,
    pub feedback: u64,
}

impl QuestionCounts {
    pub fn total_questions(&self) -> u64 {
        self.new + self.in_progress + self.answered + self.error + self.closed
    }
}

// --- Attachments and messages ---

/// A photo attached to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attachment {
    /// A photo already hosted by the chat platform, re-sendable by id.
    ChatPhoto { file_id: String, unique_id: String },
    /// A photo stored on local disk (web uploads).
    StoredFile { path: PathBuf },
}

/// Payload of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    /// One or more photos, optionally captioned.
    Photos {
        photos: Vec<Attachment>,
        caption: Option<String>,
    },
    /// Anything the desk does not understand (stickers, voice, files...).
    Unsupported,
}

/// A message received from a channel adapter.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Channel-specific message id.
    pub id: String,
    /// Channel name the message arrived on (e.g. "telegram").
    pub channel: String,
    /// Conversation to reply into.
    pub chat_id: i64,
    pub sender: UserProfile,
    pub content: MessageContent,
    pub timestamp: String,
}

impl InboundMessage {
    /// Text body or photo caption, if any.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(t) => Some(t.as_str()),
            MessageContent::Photos { caption, .. } => caption.as_deref(),
            MessageContent::Unsupported => None,
        }
    }
}

/// Reply keyboard shown under an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Rows of button labels; a press sends the label back as text.
    Reply(Vec<Vec<String>>),
    /// Removes any keyboard currently shown.
    Remove,
}

/// Body of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundBody {
    Text(String),
    Photo {
        photo: Attachment,
        caption: Option<String>,
    },
    /// Several photos posted as one grouped message, caption on the first.
    Album {
        photos: Vec<Attachment>,
        caption: Option<String>,
    },
}

/// A message to deliver through a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub body: OutboundBody,
    pub keyboard: Option<Keyboard>,
}

impl OutboundMessage {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            body: OutboundBody::Text(text.into()),
            keyboard: None,
        }
    }

    pub fn photo(chat_id: i64, photo: Attachment, caption: Option<String>) -> Self {
        Self {
            chat_id,
            body: OutboundBody::Photo { photo, caption },
            keyboard: None,
        }
    }

    pub fn album(chat_id: i64, photos: Vec<Attachment>, caption: Option<String>) -> Self {
        Self {
            chat_id,
            body: OutboundBody::Album { photos, caption },
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    /// Text body or caption.
    pub fn visible_text(&self) -> Option<&str> {
        match &self.body {
            OutboundBody::Text(t) => Some(t.as_str()),
            OutboundBody::Photo { caption, .. } | OutboundBody::Album { caption, .. } => {
                caption.as_deref()
            }
        }
    }
}

/// Capabilities reported by a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelCapabilities {
    /// Whether several photos can be posted as one grouped message.
    pub supports_albums: bool,
    /// Maximum photos in one grouped message.
    pub max_album_size: usize,
    /// Maximum characters in a text message.
    pub max_message_length: Option<usize>,
    /// Maximum characters in a photo caption.
    pub max_caption_length: Option<usize>,
}
