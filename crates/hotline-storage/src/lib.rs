// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the hotline question store.
//!
//! WAL-mode SQLite with embedded migrations, a single connection driven by
//! `tokio-rusqlite`, and typed queries for users, questions, photos,
//! answers, moderators and feedback.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use models::*;
