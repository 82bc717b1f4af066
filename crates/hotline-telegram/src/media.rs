// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of outbound photos and keyboards onto Bot API types.

use hotline_core::{Attachment, Keyboard};
use teloxide::types::{
    FileId, InputFile, InputMedia, InputMediaPhoto, KeyboardButton, KeyboardMarkup,
    KeyboardRemove, ReplyMarkup,
};

/// Bot API error fragments meaning "this batch of photos is not acceptable
/// as an album", as opposed to a chat-level failure.
const MEDIA_REJECTIONS: &[&str] = &[
    "MEDIA_GROUP_INVALID",
    "MEDIA_INVALID",
    "PHOTO_INVALID_DIMENSIONS",
    "IMAGE_PROCESS_FAILED",
    "WEBP_NOT_SUPPORTED",
    "wrong file identifier",
    "wrong type of the web page content",
    "failed to get HTTP URL content",
];

/// Telegram limit for photo captions, in characters.
pub const MAX_CAPTION_LENGTH: usize = 1024;

/// Maximum items in one media group.
pub const MAX_ALBUM_SIZE: usize = 10;

pub fn input_file(photo: &Attachment) -> InputFile {
    match photo {
        Attachment::ChatPhoto { file_id, .. } => InputFile::file_id(FileId(file_id.clone())),
        Attachment::StoredFile { path } => InputFile::file(path.clone()),
    }
}

/// Album items, caption on the first one only.
pub fn album(photos: &[Attachment], caption: Option<&str>) -> Vec<InputMedia> {
    photos
        .iter()
        .enumerate()
        .map(|(i, photo)| {
            let item = InputMediaPhoto::new(input_file(photo));
            let item = match caption {
                Some(c) if i == 0 => item.caption(c),
                _ => item,
            };
            InputMedia::Photo(item)
        })
        .collect()
}

pub fn reply_markup(keyboard: &Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Reply(rows) => {
            let rows = rows
                .iter()
                .map(|row| row.iter().map(KeyboardButton::new).collect::<Vec<_>>());
            ReplyMarkup::Keyboard(KeyboardMarkup::new(rows).resize_keyboard())
        }
        Keyboard::Remove => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
    }
}

/// True when a failed album send should be retried photo by photo.
pub fn is_media_rejection(error_text: &str) -> bool {
    MEDIA_REJECTIONS.iter().any(|needle| error_text.contains(needle))
}
