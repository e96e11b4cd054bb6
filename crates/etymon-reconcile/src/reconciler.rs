// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Migration of pending history into durable storage.
//!
//! One run snapshots the active-user set, then for each user fetches the
//! pending entries, persists them idempotently on `(user_id, seq)` and only
//! then clears exactly what was fetched. A failure for one user is recorded
//! in its outcome and the run moves on; that user stays active and is picked
//! up again next run. A crash between persist and clear is repaired by the
//! next run without duplicates because the durable write is idempotent.
//!
//! Only one run should be active at a time; scheduling is external.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use etymon_core::{EphemeralStore, EtymonError, HistoryEntry, HistorySink};

use crate::keys::{ACTIVE_USERS_KEY, entries_key};
use crate::summary::{RunMode, RunSummary, UserOutcome};

/// Moves pending history from the ephemeral store into a [`HistorySink`].
pub struct HistoryReconciler {
    store: Arc<dyn EphemeralStore>,
    sink: Arc<dyn HistorySink>,
}

impl HistoryReconciler {
    pub fn new(store: Arc<dyn EphemeralStore>, sink: Arc<dyn HistorySink>) -> Self {
        Self { store, sink }
    }

    /// Reconcile every currently active user.
    ///
    /// Returns an error only when the active-user set cannot be read; every
    /// per-user failure ends up in the summary instead.
    pub async fn run(&self, mode: RunMode) -> Result<RunSummary, EtymonError> {
        let started = Instant::now();

        let mut users = self.store.set_members(ACTIVE_USERS_KEY).await?;
        users.sort();
        info!(%mode, users = users.len(), "reconciliation started");

        let mut outcomes = Vec::with_capacity(users.len());
        for user_id in &users {
            let outcome = match mode {
                RunMode::DryRun => self.preview_user(user_id).await,
                RunMode::Live => self.flush_user(user_id).await,
            };
            if let Some(error) = &outcome.error {
                warn!(user_id = %user_id, entries = outcome.entries, error = %error, "user not flushed");
            }
            etymon_prometheus::record_reconcile_user(&outcome.status.to_string());
            outcomes.push(outcome);
        }

        let summary = RunSummary::from_outcomes(mode, outcomes, started.elapsed());
        if mode == RunMode::Live {
            etymon_prometheus::record_reconcile_entries(summary.entries_migrated);
        }
        etymon_prometheus::record_reconcile_duration(summary.elapsed.as_secs_f64());
        info!(
            %mode,
            users_seen = summary.users_seen,
            users_flushed = summary.users_flushed,
            users_failed = summary.users_failed,
            entries_migrated = summary.entries_migrated,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "reconciliation finished"
        );
        Ok(summary)
    }

    async fn preview_user(&self, user_id: &str) -> UserOutcome {
        match self.store.list_len(&entries_key(user_id)).await {
            Ok(pending) => UserOutcome::previewed(user_id, pending),
            Err(e) => UserOutcome::failed(user_id, 0, 0, e.to_string()),
        }
    }

    async fn flush_user(&self, user_id: &str) -> UserOutcome {
        let key = entries_key(user_id);

        let raw = match self.store.list_all(&key).await {
            Ok(raw) => raw,
            Err(e) => return UserOutcome::failed(user_id, 0, 0, e.to_string()),
        };
        let fetched = raw.len() as u64;

        let entries = match raw
            .iter()
            .map(|bytes| HistoryEntry::decode(bytes))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(entries) => entries,
            Err(e) => return UserOutcome::failed(user_id, fetched, 0, e.to_string()),
        };

        let inserted = if entries.is_empty() {
            0
        } else {
            match self.sink.persist(user_id, &entries).await {
                Ok(inserted) => inserted,
                Err(e) => return UserOutcome::failed(user_id, fetched, 0, e.to_string()),
            }
        };

        if let Err(e) = self.clear(user_id, &key, fetched).await {
            return UserOutcome::failed(user_id, fetched, inserted, e.to_string());
        }

        debug!(user_id, entries = fetched, inserted, "user flushed");
        UserOutcome::flushed(user_id, fetched, inserted)
    }

    /// Drop the `fetched` oldest entries and retire the user, keeping them
    /// active if the write path appended meanwhile.
    async fn clear(&self, user_id: &str, key: &str, fetched: u64) -> Result<(), EtymonError> {
        self.store.list_trim_front(key, fetched).await?;
        self.store.set_remove(ACTIVE_USERS_KEY, user_id).await?;
        if self.store.list_len(key).await? > 0 {
            self.store.set_add(ACTIVE_USERS_KEY, user_id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etymon_ephemeral::MemoryStore;
    use etymon_test_utils::{FaultyStore, MockHistorySink};

    use crate::recorder::HistoryRecorder;
    use crate::summary::FlushStatus;

    async fn seed(store: Arc<dyn EphemeralStore>, user: &str, n: usize) {
        let recorder = HistoryRecorder::new(store);
        for i in 0..n {
            recorder
                .record(user, serde_json::json!({ "word": format!("w{i}") }))
                .await
                .unwrap();
        }
    }

    async fn active(store: &dyn EphemeralStore) -> Vec<String> {
        let mut users = store.set_members(ACTIVE_USERS_KEY).await.unwrap();
        users.sort();
        users
    }

    #[tokio::test]
    async fn live_run_moves_everything() {
        let store: Arc<dyn EphemeralStore> = Arc::new(MemoryStore::new());
        let sink = Arc::new(MockHistorySink::new());
        seed(store.clone(), "u1", 3).await;
        seed(store.clone(), "u2", 2).await;

        let reconciler = HistoryReconciler::new(store.clone(), sink.clone());
        let summary = reconciler.run(RunMode::Live).await.unwrap();

        assert_eq!(summary.users_flushed, 2);
        assert_eq!(summary.entries_migrated, 5);
        assert_eq!(sink.entries_for("u1").len(), 3);
        assert_eq!(sink.entries_for("u2").len(), 2);
        assert_eq!(store.list_len("history:entries:u1").await.unwrap(), 0);
        assert!(active(store.as_ref()).await.is_empty());
    }

    #[tokio::test]
    async fn dry_run_changes_nothing() {
        let store: Arc<dyn EphemeralStore> = Arc::new(MemoryStore::new());
        let sink = Arc::new(MockHistorySink::new());
        seed(store.clone(), "u1", 4).await;

        let reconciler = HistoryReconciler::new(store.clone(), sink.clone());
        let summary = reconciler.run(RunMode::DryRun).await.unwrap();

        assert_eq!(summary.outcomes, vec![UserOutcome::previewed("u1", 4)]);
        assert_eq!(summary.entries_migrated, 0);
        assert_eq!(sink.persist_calls(), 0);
        assert_eq!(store.list_len("history:entries:u1").await.unwrap(), 4);
        assert_eq!(active(store.as_ref()).await, vec!["u1"]);
    }

    #[tokio::test]
    async fn sink_failure_is_isolated_to_one_user() {
        let store: Arc<dyn EphemeralStore> = Arc::new(MemoryStore::new());
        let sink = Arc::new(MockHistorySink::new());
        seed(store.clone(), "good", 2).await;
        seed(store.clone(), "bad", 3).await;
        sink.fail_for("bad");

        let reconciler = HistoryReconciler::new(store.clone(), sink.clone());
        let summary = reconciler.run(RunMode::Live).await.unwrap();

        assert_eq!(summary.users_flushed, 1);
        assert_eq!(summary.users_failed, 1);
        let bad = summary.outcomes.iter().find(|o| o.user_id == "bad").unwrap();
        assert_eq!(bad.status, FlushStatus::Failed);
        assert!(bad.error.as_deref().unwrap().contains("injected"));
        assert_eq!(store.list_len("history:entries:bad").await.unwrap(), 3);
        assert_eq!(active(store.as_ref()).await, vec!["bad"]);

        // Next run after recovery finishes the job.
        sink.recover("bad");
        let summary = reconciler.run(RunMode::Live).await.unwrap();
        assert_eq!(summary.users_seen, 1);
        assert_eq!(summary.entries_migrated, 3);
        assert!(active(store.as_ref()).await.is_empty());
    }

    #[tokio::test]
    async fn crash_between_persist_and_clear_is_repaired() {
        let store: Arc<dyn EphemeralStore> = Arc::new(MemoryStore::new());
        let sink = Arc::new(MockHistorySink::new());
        seed(store.clone(), "u1", 3).await;

        // Persist happened, clear never did.
        let raw = store.list_all("history:entries:u1").await.unwrap();
        let entries: Vec<HistoryEntry> = raw
            .iter()
            .map(|b| HistoryEntry::decode(b).unwrap())
            .collect();
        sink.persist("u1", &entries).await.unwrap();

        let reconciler = HistoryReconciler::new(store.clone(), sink.clone());
        let summary = reconciler.run(RunMode::Live).await.unwrap();

        assert_eq!(summary.outcomes, vec![UserOutcome::flushed("u1", 3, 0)]);
        assert_eq!(sink.count_for_user("u1").await.unwrap(), 3);
        assert!(active(store.as_ref()).await.is_empty());
    }

    #[tokio::test]
    async fn clear_failure_keeps_user_active_and_rerun_adds_no_duplicates() {
        let faulty = Arc::new(FaultyStore::new());
        let store: Arc<dyn EphemeralStore> = faulty.clone();
        let sink = Arc::new(MockHistorySink::new());
        seed(store.clone(), "u1", 2).await;

        faulty.fail_operation("list_trim_front");
        let reconciler = HistoryReconciler::new(store.clone(), sink.clone());
        let summary = reconciler.run(RunMode::Live).await.unwrap();
        let outcome = &summary.outcomes[0];
        assert_eq!(outcome.status, FlushStatus::Failed);
        assert_eq!((outcome.entries, outcome.inserted), (2, 2));
        assert_eq!(sink.total(), 2);
        assert_eq!(active(store.as_ref()).await, vec!["u1"]);

        faulty.heal();
        let summary = reconciler.run(RunMode::Live).await.unwrap();
        assert_eq!(summary.outcomes, vec![UserOutcome::flushed("u1", 2, 0)]);
        assert_eq!(sink.count_for_user("u1").await.unwrap(), 2);
        assert!(active(store.as_ref()).await.is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_skips_persist() {
        let faulty = Arc::new(FaultyStore::new());
        let store: Arc<dyn EphemeralStore> = faulty.clone();
        let sink = Arc::new(MockHistorySink::new());
        seed(store.clone(), "u1", 2).await;
        seed(store.clone(), "u2", 1).await;

        faulty.fail_keys_containing("history:entries:u1");
        let summary = HistoryReconciler::new(store.clone(), sink.clone())
            .run(RunMode::Live)
            .await
            .unwrap();
        assert_eq!(summary.users_failed, 1);
        assert_eq!(summary.users_flushed, 1);
        assert!(sink.entries_for("u1").is_empty());
        assert_eq!(sink.entries_for("u2").len(), 1);
    }

    #[tokio::test]
    async fn entries_appended_during_flush_survive() {
        let store: Arc<dyn EphemeralStore> = Arc::new(MemoryStore::new());
        seed(store.clone(), "u1", 2).await;

        let reconciler = HistoryReconciler::new(store.clone(), Arc::new(MockHistorySink::new()));
        // Simulate the race by calling clear with the pre-append count.
        seed(store.clone(), "u1", 1).await;
        reconciler.clear("u1", "history:entries:u1", 2).await.unwrap();

        let left = store.list_all("history:entries:u1").await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(HistoryEntry::decode(&left[0]).unwrap().seq, 3);
        assert_eq!(active(store.as_ref()).await, vec!["u1"]);
    }

    #[tokio::test]
    async fn corrupt_entry_fails_only_that_user() {
        let store: Arc<dyn EphemeralStore> = Arc::new(MemoryStore::new());
        let sink = Arc::new(MockHistorySink::new());
        seed(store.clone(), "ok", 1).await;
        store.list_push("history:entries:broken", b"{not json").await.unwrap();
        store.set_add(ACTIVE_USERS_KEY, "broken").await.unwrap();

        let summary = HistoryReconciler::new(store.clone(), sink.clone())
            .run(RunMode::Live)
            .await
            .unwrap();
        let broken = summary
            .outcomes
            .iter()
            .find(|o| o.user_id == "broken")
            .unwrap();
        assert_eq!(broken.status, FlushStatus::Failed);
        assert_eq!(broken.entries, 1);
        assert_eq!(summary.users_flushed, 1);
        assert_eq!(store.list_len("history:entries:broken").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn active_user_without_entries_is_retired() {
        let store: Arc<dyn EphemeralStore> = Arc::new(MemoryStore::new());
        store.set_add(ACTIVE_USERS_KEY, "ghost").await.unwrap();

        let summary = HistoryReconciler::new(store.clone(), Arc::new(MockHistorySink::new()))
            .run(RunMode::Live)
            .await
            .unwrap();
        assert_eq!(summary.outcomes, vec![UserOutcome::flushed("ghost", 0, 0)]);
        assert!(active(store.as_ref()).await.is_empty());
    }

    #[tokio::test]
    async fn unreadable_active_set_fails_the_run() {
        let faulty = Arc::new(FaultyStore::new());
        faulty.fail_all(true);
        let reconciler = HistoryReconciler::new(faulty, Arc::new(MockHistorySink::new()));
        assert!(reconciler.run(RunMode::Live).await.is_err());
    }
}
