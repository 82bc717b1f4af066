// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the hotline support desk.
//!
//! Provides the error type, the shared domain types (questions, moderators,
//! messages) and the adapter traits implemented by the storage and channel
//! crates.

pub mod error;
pub mod traits;
pub mod types;

pub use error::HotlineError;
pub use types::{
    AdapterType, Answer, AnswerDelivery, Attachment, ChannelCapabilities, HealthStatus,
    InboundMessage, Keyboard, MessageContent, MessageId, Moderator, NewQuestion,
    OutboundBody, OutboundMessage, Question, QuestionCounts, QuestionId, QuestionOrigin,
    QuestionStatus, UserId, UserProfile, question_tag,
};

pub use traits::{ChannelAdapter, PluginAdapter, StorageAdapter};
