// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Web form payload: question text assembly and inline image extraction.
//!
//! The site posts screenshots as `<img src="data:image/<fmt>;base64,...">`
//! tags. They are decoded here and written under `<upload_dir>/web/` so the
//! rest of the desk only ever sees [`Attachment::StoredFile`].

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hotline_core::{Attachment, HotlineError};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

/// `src="data:image/<fmt>;base64,<payload>"` inside an img tag.
static DATA_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"src="data:image/([^;"]+);base64,([^"]+)""#).expect("data URL pattern is valid")
});

/// Body of `POST /api/v1/web-question`. Field names follow the site's form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebQuestionRequest {
    #[serde(rename = "Email", default)]
    pub email: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Steps", default)]
    pub steps: String,
    #[serde(rename = "DeviceInfo", default)]
    pub device_info: String,
    #[serde(rename = "ImgTags", default)]
    pub img_tags: Vec<String>,
}

impl WebQuestionRequest {
    /// Contact to store with the question, if the form carried one.
    pub fn contact(&self) -> Option<String> {
        Some(self.email.trim().to_string()).filter(|e| !e.is_empty())
    }

    /// The question body shown to moderators.
    pub fn compose_text(&self) -> Result<String, HotlineError> {
        if self.description.trim().is_empty() {
            return Err(HotlineError::InvalidInput(
                "Description must not be empty".into(),
            ));
        }
        let mut text = String::from("Question from the website\n");
        if let Some(email) = self.contact() {
            text.push_str(&format!("Email: {email}\n"));
        }
        text.push_str(&format!(
            "\nProblem description:\n{}",
            br_to_newline(&self.description)
        ));
        for (title, body) in [
            ("Steps to reproduce", &self.steps),
            ("Device information", &self.device_info),
        ] {
            if !body.trim().is_empty() {
                text.push_str(&format!("\n\n{title}:\n{}", br_to_newline(body)));
            }
        }
        Ok(text)
    }
}

fn br_to_newline(s: &str) -> String {
    s.replace("<br />", "\n")
        .replace("<br/>", "\n")
        .replace("<br>", "\n")
}

/// A decoded inline image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

fn extension_for(format: &str) -> &'static str {
    match format.to_ascii_lowercase().as_str() {
        "png" => "png",
        "gif" => "gif",
        "webp" => "webp",
        _ => "jpg",
    }
}

/// Decodes up to `limit` data-URL images from `img_tags`, skipping tags that
/// carry no data URL or whose payload does not decode.
pub fn extract_images(img_tags: &[String], limit: usize) -> Vec<InlineImage> {
    let mut images = Vec::new();
    for tag in img_tags {
        if images.len() >= limit {
            debug!(limit, "ignoring images beyond the per-question cap");
            break;
        }
        let Some(caps) = DATA_URL.captures(tag) else {
            warn!(tag = %tag.chars().take(80).collect::<String>(), "img tag without data URL");
            continue;
        };
        match STANDARD.decode(caps[2].trim()) {
            Ok(bytes) if !bytes.is_empty() => images.push(InlineImage {
                extension: extension_for(&caps[1]),
                bytes,
            }),
            Ok(_) => warn!("empty inline image skipped"),
            Err(e) => warn!(error = %e, "undecodable inline image skipped"),
        }
    }
    images
}

/// Writes images to `<upload_dir>/web/<uuid>.<ext>`.
pub async fn store_images(
    upload_dir: &Path,
    images: Vec<InlineImage>,
) -> Result<Vec<Attachment>, HotlineError> {
    if images.is_empty() {
        return Ok(Vec::new());
    }
    let dir = upload_dir.join("web");
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| HotlineError::Internal(format!("cannot create {}: {e}", dir.display())))?;

    let mut stored = Vec::with_capacity(images.len());
    for image in images {
        let path: PathBuf = dir.join(format!("{}.{}", uuid::Uuid::new_v4(), image.extension));
        tokio::fs::write(&path, &image.bytes)
            .await
            .map_err(|e| HotlineError::Internal(format!("cannot write {}: {e}", path.display())))?;
        debug!(path = %path.display(), size = image.bytes.len(), "stored web upload");
        stored.push(Attachment::StoredFile { path });
    }
    Ok(stored)
}
