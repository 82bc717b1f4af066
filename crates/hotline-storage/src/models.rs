// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types live in `hotline-core` so they can cross adapter
//! boundaries; they are re-exported here for convenience.

pub use hotline_core::types::{Answer, Attachment, Moderator, NewQuestion, Question, QuestionCounts};
