// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the hotline service.

use thiserror::Error;

/// The primary error type used across all hotline adapter traits and desk operations.
#[derive(Debug, Error)]
pub enum HotlineError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (connection failure, blocked chat, rate limiting).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The channel refused a batched photo post because of the attachments'
    /// format. Callers may degrade to sending the photos one by one.
    #[error("media group rejected: {message}")]
    MediaRejected { message: String },

    /// A question id did not resolve to a stored question.
    #[error("question #Q{0} not found")]
    QuestionNotFound(i64),

    /// The caller is not allowed to perform the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Input was rejected before any state was mutated.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HotlineError {
    /// Builds a [`HotlineError::Channel`] from any transport error.
    pub fn channel<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        HotlineError::Channel {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true when this error came from outbound delivery rather than storage.
    pub fn is_delivery_failure(&self) -> bool {
        matches!(
            self,
            HotlineError::Channel { .. } | HotlineError::MediaRejected { .. }
        )
    }
}
