// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Moderator registration and lookup.

use std::collections::HashSet;
use std::sync::Arc;

use hotline_core::{HotlineError, Moderator, StorageAdapter, UserId, UserProfile};
use tracing::info;

/// Outcome of a `/moderator` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Registered,
    /// The caller is not on the configured admin allow-list.
    NotAllowed,
}

/// The set of moderators eligible for notifications and claims.
///
/// Reads go to the store every time; nothing is cached between broadcasts.
#[derive(Clone)]
pub struct ModeratorDirectory {
    store: Arc<dyn StorageAdapter>,
    admin_ids: Arc<HashSet<UserId>>,
}

impl ModeratorDirectory {
    pub fn new(store: Arc<dyn StorageAdapter>, admin_ids: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            store,
            admin_ids: Arc::new(admin_ids.into_iter().collect()),
        }
    }

    /// Whether `user_id` may register as a moderator.
    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.admin_ids.contains(&user_id)
    }

    /// Registers (or refreshes) the caller when they are on the allow-list.
    pub async fn register(&self, profile: &UserProfile) -> Result<Registration, HotlineError> {
        if !self.is_admin(profile.user_id) {
            info!(user_id = profile.user_id, "moderator registration refused");
            return Ok(Registration::NotAllowed);
        }
        self.store.upsert_moderator(profile).await?;
        info!(user_id = profile.user_id, "moderator registered");
        Ok(Registration::Registered)
    }

    pub async fn active(&self) -> Result<Vec<Moderator>, HotlineError> {
        self.store.list_active_moderators().await
    }

    pub async fn is_active(&self, user_id: UserId) -> Result<bool, HotlineError> {
        self.store.is_active_moderator(user_id).await
    }
}
