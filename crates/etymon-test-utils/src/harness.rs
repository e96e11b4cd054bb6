// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness wiring an in-memory store to a throwaway SQLite sink.

use std::sync::Arc;

use chrono::Utc;
use etymon_core::{EphemeralStore, EtymonError, HistoryEntry};
use etymon_ephemeral::MemoryStore;
use etymon_storage::{Database, SqliteHistoryStore};
use tempfile::TempDir;

use crate::faulty_store::FaultyStore;

/// Builder for [`TestHarness`].
#[derive(Debug, Default)]
pub struct TestHarnessBuilder {
    faulty: bool,
}

impl TestHarnessBuilder {
    /// Put a [`FaultyStore`] in front of the memory store.
    pub fn with_faults(mut self) -> Self {
        self.faulty = true;
        self
    }

    pub async fn build(self) -> Result<TestHarness, EtymonError> {
        let dir = tempfile::tempdir().map_err(|e| EtymonError::Storage {
            source: Box::new(e),
        })?;
        let db = Database::open(&dir.path().join("history.db"), true).await?;
        let memory = Arc::new(MemoryStore::new());
        let faulty = self
            .faulty
            .then(|| Arc::new(FaultyStore::wrapping(Arc::clone(&memory))));
        let store: Arc<dyn EphemeralStore> = match &faulty {
            Some(f) => Arc::clone(f) as Arc<dyn EphemeralStore>,
            None => Arc::clone(&memory) as Arc<dyn EphemeralStore>,
        };
        Ok(TestHarness {
            store,
            memory,
            faulty,
            sink: Arc::new(SqliteHistoryStore::new(db)),
            _dir: dir,
        })
    }
}

/// Store and sink pair for end-to-end tests. The database lives in a
/// temporary directory removed on drop.
pub struct TestHarness {
    /// What components under test should talk to.
    pub store: Arc<dyn EphemeralStore>,
    /// Direct access to the backing memory store.
    pub memory: Arc<MemoryStore>,
    /// Present when built with [`TestHarnessBuilder::with_faults`].
    pub faulty: Option<Arc<FaultyStore>>,
    pub sink: Arc<SqliteHistoryStore>,
    _dir: TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::default()
    }

    /// Build a history entry with a `{"word": ...}` payload.
    pub fn entry(seq: u64, word: &str) -> HistoryEntry {
        HistoryEntry {
            seq,
            recorded_at: Utc::now(),
            payload: serde_json::json!({ "word": word }),
        }
    }
}
