// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key layout for pending history.
//!
//! Each family has its own fixed prefix and the user id always comes last,
//! so no user id (even one containing `:`) can land on another family's key.

/// Membership set of users with at least one pending entry.
pub const ACTIVE_USERS_KEY: &str = "history:active";

/// Pending entries for `user_id`, oldest first.
pub fn entries_key(user_id: &str) -> String {
    format!("history:entries:{user_id}")
}

/// Per-user sequence counter. Never expires and never resets, so sequence
/// numbers stay unique after earlier entries are flushed.
pub fn seq_key(user_id: &str) -> String {
    format!("history:seq:{user_id}")
}
