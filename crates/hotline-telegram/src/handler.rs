// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of Telegram updates into channel-agnostic [`InboundMessage`]s.
//!
//! Only private chats are handled. Photos are passed on by file id; nothing
//! is downloaded, since moderators receive the same file ids back.

use hotline_core::{Attachment, InboundMessage, MessageContent, UserProfile};
use teloxide::types::{ChatKind, Message};

/// Channel name stamped on every inbound message.
pub const CHANNEL_NAME: &str = "telegram";

/// Checks whether the message is from a private (DM) chat.
///
/// Group, supergroup, and channel messages return `false`.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Profile of the sender, or `None` for messages without one (channel posts).
pub fn sender_profile(msg: &Message) -> Option<UserProfile> {
    let user = msg.from.as_ref()?;
    let user_id = i64::try_from(user.id.0).ok()?;
    Some(UserProfile {
        user_id,
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()).filter(|n| !n.is_empty()),
    })
}

/// Text, captioned or bare photos, or [`MessageContent::Unsupported`].
pub fn extract_content(msg: &Message) -> MessageContent {
    if let Some(text) = msg.text() {
        return MessageContent::Text(text.to_string());
    }

    if let Some(sizes) = msg.photo() {
        // Telegram lists every resolution of the same picture; the last is the largest.
        let photos = sizes
            .last()
            .map(|largest| Attachment::ChatPhoto {
                file_id: largest.file.id.to_string(),
                unique_id: largest.file.unique_id.to_string(),
            })
            .into_iter()
            .collect();
        return MessageContent::Photos {
            photos,
            caption: msg.caption().map(str::to_string),
        };
    }

    MessageContent::Unsupported
}

/// Converts a private-chat Telegram message into an [`InboundMessage`].
pub fn to_inbound_message(msg: &Message) -> Option<InboundMessage> {
    let sender = sender_profile(msg)?;
    Some(InboundMessage {
        id: msg.id.0.to_string(),
        channel: CHANNEL_NAME.to_string(),
        chat_id: msg.chat.id.0,
        sender,
        content: extract_content(msg),
        timestamp: msg.date.to_rfc3339(),
    })
}
