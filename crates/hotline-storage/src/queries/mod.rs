// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions, one module per table.

pub mod answers;
pub mod feedback;
pub mod moderators;
pub mod photos;
pub mod questions;
pub mod users;
