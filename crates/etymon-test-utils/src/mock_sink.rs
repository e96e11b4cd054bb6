// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory history sink for deterministic reconciler tests.
//!
//! Keyed on `(user_id, seq)` exactly like the durable table, so repeated
//! delivery of the same entries is absorbed.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use etymon_core::{EtymonError, HistoryEntry, HistorySink};

use crate::lock;

/// A mock durable sink with per-user failure injection.
#[derive(Debug, Default)]
pub struct MockHistorySink {
    rows: Mutex<HashMap<String, BTreeMap<u64, HistoryEntry>>>,
    failing_users: Mutex<HashSet<String>>,
    persist_calls: AtomicUsize,
}

impl MockHistorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `persist` for `user_id` fail.
    pub fn fail_for(&self, user_id: &str) {
        lock(&self.failing_users).insert(user_id.to_string());
    }

    /// Undo [`fail_for`](Self::fail_for).
    pub fn recover(&self, user_id: &str) {
        lock(&self.failing_users).remove(user_id);
    }

    /// Durable entries for `user_id`, ordered by sequence number.
    pub fn entries_for(&self, user_id: &str) -> Vec<HistoryEntry> {
        lock(&self.rows)
            .get(user_id)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Total records across all users.
    pub fn total(&self) -> usize {
        lock(&self.rows).values().map(BTreeMap::len).sum()
    }

    /// How many times `persist` was invoked, failures included.
    pub fn persist_calls(&self) -> usize {
        self.persist_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistorySink for MockHistorySink {
    async fn persist(&self, user_id: &str, entries: &[HistoryEntry]) -> Result<u64, EtymonError> {
        self.persist_calls.fetch_add(1, Ordering::SeqCst);
        if lock(&self.failing_users).contains(user_id) {
            return Err(EtymonError::Storage {
                source: format!("injected sink failure for {user_id}").into(),
            });
        }

        let mut rows = lock(&self.rows);
        let user_rows = rows.entry(user_id.to_string()).or_default();
        let mut inserted = 0;
        for entry in entries {
            if !user_rows.contains_key(&entry.seq) {
                user_rows.insert(entry.seq, entry.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn count_for_user(&self, user_id: &str) -> Result<u64, EtymonError> {
        Ok(self.entries_for(user_id).len() as u64)
    }
}
