// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for hotline integration tests.
//!
//! Provides a mock chat channel and a harness that wires it to a temporary
//! SQLite store and a real dispatcher, so conversations can be driven
//! without a chat platform.
//!
//! # Components
//!
//! - [`MockChannel`] - captures sends, queues inbound messages, injects delivery failures
//! - [`TestHarness`] - temp database + mock channel + dispatcher

pub mod harness;
pub mod mock_channel;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_channel::{MockChannel, inbound_photos, inbound_text};
