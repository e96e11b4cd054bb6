// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ephemeral store capability interface.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::EtymonError;
use crate::types::HealthStatus;

/// Thin capability interface over a networked key-value / sorted-set store.
///
/// Implementations carry no business semantics and perform no retries: any
/// backend failure is returned to the caller as [`EtymonError::Store`] or
/// [`EtymonError::Timeout`]. Absent keys are never errors; they are reported
/// as `None`, empty collections, or zero counts.
///
/// Every method must be safe to call from arbitrarily many concurrent tasks.
#[async_trait]
pub trait EphemeralStore: Send + Sync + 'static {
    /// Returns a short backend name for logs and health output.
    fn backend(&self) -> &str;

    /// Round-trips to the backend to prove it is reachable.
    async fn ping(&self) -> Result<(), EtymonError>;

    /// Probe the backend and classify the result.
    async fn health_check(&self) -> HealthStatus {
        match self.ping().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }

    /// Reads the byte value stored at `key`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, EtymonError>;

    /// Stores `value` at `key` without expiry, replacing any previous value.
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), EtymonError>;

    /// Removes `key` of any type. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), EtymonError>;

    /// Atomically increments the counter at `key` by one without touching
    /// its expiry. Returns the new value.
    async fn increment(&self, key: &str) -> Result<i64, EtymonError>;

    /// Atomically increments the counter at `key` by one and, only when the
    /// key carries no expiry afterwards (it was just created), sets its
    /// time-to-live to `window`. Returns the new value.
    ///
    /// Both steps happen as one indivisible operation on the backend so that
    /// concurrent first requests of a window cannot renew the TTL.
    async fn increment_and_expire(&self, key: &str, window: Duration)
    -> Result<i64, EtymonError>;

    /// Remaining time-to-live of `key`; `None` when the key is absent or has
    /// no expiry.
    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>, EtymonError>;

    /// Inserts every member into the sorted set at `set_key` with score 0.
    /// Existing members are left untouched. One round trip for the batch.
    async fn sorted_set_add(&self, set_key: &str, members: &[String]) -> Result<(), EtymonError>;

    /// Members of the sorted set in the half-open lexicographic range
    /// `[prefix, prefix + 0xFF)`, ascending, at most `limit` of them.
    async fn sorted_set_range_by_prefix(
        &self,
        set_key: &str,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>, EtymonError>;

    /// Cardinality of the sorted set (0 when absent).
    async fn sorted_set_card(&self, set_key: &str) -> Result<u64, EtymonError>;

    /// Adds `member` to the unordered set at `set_key`.
    async fn set_add(&self, set_key: &str, member: &str) -> Result<(), EtymonError>;

    /// Removes `member` from the unordered set at `set_key`.
    async fn set_remove(&self, set_key: &str, member: &str) -> Result<(), EtymonError>;

    /// All members of the unordered set at `set_key`, in unspecified order.
    async fn set_members(&self, set_key: &str) -> Result<Vec<String>, EtymonError>;

    /// Appends `value` to the list at `key`. Returns the new length.
    async fn list_push(&self, key: &str, value: &[u8]) -> Result<u64, EtymonError>;

    /// Every element of the list at `key`, oldest first.
    async fn list_all(&self, key: &str) -> Result<Vec<Vec<u8>>, EtymonError>;

    /// Length of the list at `key` (0 when absent).
    async fn list_len(&self, key: &str) -> Result<u64, EtymonError>;

    /// Drops the first `count` elements of the list at `key`. Elements
    /// appended after they were read are preserved. A list trimmed to empty
    /// ceases to exist.
    async fn list_trim_front(&self, key: &str, count: u64) -> Result<(), EtymonError>;

    /// Deletes the whole list at `key`.
    async fn list_delete(&self, key: &str) -> Result<(), EtymonError>;
}
