//! Admin allow-list
//!
//! With no ADMIN_IDS configured the bot is open to everyone; otherwise only
//! the listed users get past the guard.

use std::collections::HashSet;
use teloxide::types::UserId;

/// Returns true when `user_id` may use the bot under `admin_ids`.
pub fn is_authorized(user_id: UserId, admin_ids: &HashSet<UserId>) -> bool {
    admin_ids.is_empty() || admin_ids.contains(&user_id)
}

/// Configured allow-list, injected wherever access has to be checked
#[derive(Debug, Clone, Default)]
pub struct AccessGuard {
    admin_ids: HashSet<UserId>,
}

impl AccessGuard {
    pub fn new(admin_ids: HashSet<UserId>) -> Self {
        Self { admin_ids }
    }

    /// A guard that lets everyone through
    pub fn open() -> Self {
        Self::default()
    }

    pub fn is_authorized(&self, user_id: UserId) -> bool {
        is_authorized(user_id, &self.admin_ids)
    }

    /// True when no allow-list is configured
    pub fn is_open(&self) -> bool {
        self.admin_ids.is_empty()
    }

    pub fn admin_count(&self) -> usize {
        self.admin_ids.len()
    }
}
