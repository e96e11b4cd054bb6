// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable history sink: the relational side of reconciliation.

use async_trait::async_trait;

use crate::error::EtymonError;
use crate::types::HistoryEntry;

/// Durable destination for migrated history entries.
///
/// Writes must be idempotent under re-delivery: persisting the same
/// `(user_id, entry.seq)` pair twice leaves exactly one durable record.
#[async_trait]
pub trait HistorySink: Send + Sync + 'static {
    /// Bulk-upserts `entries` for `user_id` in one unit of work.
    ///
    /// Returns the number of records that did not exist before the call.
    async fn persist(&self, user_id: &str, entries: &[HistoryEntry]) -> Result<u64, EtymonError>;

    /// Number of durable records held for `user_id`.
    async fn count_for_user(&self, user_id: &str) -> Result<u64, EtymonError>;
}
