// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Write path for pending lookup history.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use etymon_core::{EphemeralStore, EtymonError, HistoryEntry};

use crate::keys::{ACTIVE_USERS_KEY, entries_key, seq_key};

/// Appends lookups to a user's pending history.
///
/// The entry is pushed before the user is marked active.
#[derive(Clone)]
pub struct HistoryRecorder {
    store: Arc<dyn EphemeralStore>,
}

impl HistoryRecorder {
    pub fn new(store: Arc<dyn EphemeralStore>) -> Self {
        Self { store }
    }

    /// Record one lookup for `user_id` and return the stored entry.
    pub async fn record(
        &self,
        user_id: &str,
        payload: serde_json::Value,
    ) -> Result<HistoryEntry, EtymonError> {
        let seq = self.store.increment(&seq_key(user_id)).await?;
        let entry = HistoryEntry {
            seq: u64::try_from(seq).map_err(|_| {
                EtymonError::store(format!("sequence counter for {user_id} is negative"))
            })?,
            recorded_at: Utc::now(),
            payload,
        };

        let pending = self
            .store
            .list_push(&entries_key(user_id), &entry.encode()?)
            .await?;
        self.store.set_add(ACTIVE_USERS_KEY, user_id).await?;

        debug!(user_id, seq = entry.seq, pending, "history entry recorded");
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etymon_ephemeral::MemoryStore;

    #[tokio::test]
    async fn record_appends_and_marks_active() {
        let store = Arc::new(MemoryStore::new());
        let recorder = HistoryRecorder::new(store.clone());

        let first = recorder
            .record("u1", serde_json::json!({"word": "etymon"}))
            .await
            .unwrap();
        let second = recorder
            .record("u1", serde_json::json!({"word": "logos"}))
            .await
            .unwrap();
        assert_eq!((first.seq, second.seq), (1, 2));

        let raw = store.list_all(&entries_key("u1")).await.unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(HistoryEntry::decode(&raw[1]).unwrap(), second);
        assert_eq!(
            store.set_members(ACTIVE_USERS_KEY).await.unwrap(),
            vec!["u1".to_string()]
        );
    }

    #[tokio::test]
    async fn sequence_survives_list_removal() {
        let store = Arc::new(MemoryStore::new());
        let recorder = HistoryRecorder::new(store.clone());
        recorder.record("u1", serde_json::json!(1)).await.unwrap();
        store.list_delete(&entries_key("u1")).await.unwrap();

        let next = recorder.record("u1", serde_json::json!(2)).await.unwrap();
        assert_eq!(next.seq, 2);
    }

    #[tokio::test]
    async fn user_ids_shaped_like_keys_do_not_interfere() {
        let store = Arc::new(MemoryStore::new());
        let recorder = HistoryRecorder::new(store.clone());

        for user in ["x:seq", "x", "active", "x:seq", "x"] {
            recorder.record(user, serde_json::json!(user)).await.unwrap();
        }

        assert_eq!(store.list_len(&entries_key("x:seq")).await.unwrap(), 2);
        assert_eq!(store.list_len(&entries_key("x")).await.unwrap(), 2);
        assert_eq!(store.list_len(&entries_key("active")).await.unwrap(), 1);
        let mut active = store.set_members(ACTIVE_USERS_KEY).await.unwrap();
        active.sort();
        assert_eq!(active, vec!["active", "x", "x:seq"]);
    }
}
