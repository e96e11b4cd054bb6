// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Failure-injecting store wrapper.
//!
//! Delegates to an in-memory store but fails any operation whose key
//! contains one of the registered fragments, any operation registered by
//! name, or every operation once [`FaultyStore::fail_all`] is switched on.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use etymon_core::{EphemeralStore, EtymonError};
use etymon_ephemeral::MemoryStore;

use crate::lock;

/// An [`EphemeralStore`] that can be told to break.
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: Arc<MemoryStore>,
    poisoned_fragments: Mutex<Vec<String>>,
    poisoned_ops: Mutex<Vec<&'static str>>,
    fail_all: AtomicBool,
    hide_ttls: AtomicBool,
    /// Number of operations that have been failed deliberately.
    injected: AtomicUsize,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing memory store so the test can seed or inspect it
    /// directly.
    pub fn wrapping(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Handle on the underlying store, bypassing injection.
    pub fn inner(&self) -> Arc<MemoryStore> {
        Arc::clone(&self.inner)
    }

    /// Fail operations on any key containing `fragment`.
    pub fn fail_keys_containing(&self, fragment: &str) {
        lock(&self.poisoned_fragments).push(fragment.to_string());
    }

    /// Fail every call of the named trait method, e.g. `"list_trim_front"`.
    pub fn fail_operation(&self, op: &'static str) {
        lock(&self.poisoned_ops).push(op);
    }

    /// Fail every operation (including `ping`) while `on` is true.
    pub fn fail_all(&self, on: bool) {
        self.fail_all.store(on, Ordering::SeqCst);
    }

    /// Report every key as having no expiry while `on` is true, as a
    /// server might for a counter whose TTL was lost.
    pub fn hide_ttls(&self, on: bool) {
        self.hide_ttls.store(on, Ordering::SeqCst);
    }

    /// Remove every injected fault.
    pub fn heal(&self) {
        self.fail_all(false);
        self.hide_ttls(false);
        lock(&self.poisoned_fragments).clear();
        lock(&self.poisoned_ops).clear();
    }

    pub fn injected_failures(&self) -> usize {
        self.injected.load(Ordering::SeqCst)
    }

    fn check(&self, op: &'static str, key: &str) -> Result<(), EtymonError> {
        let poisoned = self.fail_all.load(Ordering::SeqCst)
            || lock(&self.poisoned_ops).contains(&op)
            || lock(&self.poisoned_fragments)
                .iter()
                .any(|f| key.contains(f.as_str()));
        if poisoned {
            self.injected.fetch_add(1, Ordering::SeqCst);
            return Err(EtymonError::store(format!("injected {op} failure on {key:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl EphemeralStore for FaultyStore {
    fn backend(&self) -> &str {
        "faulty"
    }

    async fn ping(&self) -> Result<(), EtymonError> {
        self.check("ping", "")?;
        self.inner.ping().await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, EtymonError> {
        self.check("get", key)?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), EtymonError> {
        self.check("set", key)?;
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), EtymonError> {
        self.check("delete", key)?;
        self.inner.delete(key).await
    }

    async fn increment(&self, key: &str) -> Result<i64, EtymonError> {
        self.check("increment", key)?;
        self.inner.increment(key).await
    }

    async fn increment_and_expire(
        &self,
        key: &str,
        window: Duration,
    ) -> Result<i64, EtymonError> {
        self.check("increment_and_expire", key)?;
        self.inner.increment_and_expire(key, window).await
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>, EtymonError> {
        self.check("time_to_live", key)?;
        if self.hide_ttls.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.time_to_live(key).await
    }

    async fn sorted_set_add(&self, set_key: &str, members: &[String]) -> Result<(), EtymonError> {
        self.check("sorted_set_add", set_key)?;
        self.inner.sorted_set_add(set_key, members).await
    }

    async fn sorted_set_range_by_prefix(
        &self,
        set_key: &str,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>, EtymonError> {
        self.check("sorted_set_range_by_prefix", set_key)?;
        self.inner
            .sorted_set_range_by_prefix(set_key, prefix, limit)
            .await
    }

    async fn sorted_set_card(&self, set_key: &str) -> Result<u64, EtymonError> {
        self.check("sorted_set_card", set_key)?;
        self.inner.sorted_set_card(set_key).await
    }

    async fn set_add(&self, set_key: &str, member: &str) -> Result<(), EtymonError> {
        self.check("set_add", set_key)?;
        self.inner.set_add(set_key, member).await
    }

    async fn set_remove(&self, set_key: &str, member: &str) -> Result<(), EtymonError> {
        self.check("set_remove", set_key)?;
        self.inner.set_remove(set_key, member).await
    }

    async fn set_members(&self, set_key: &str) -> Result<Vec<String>, EtymonError> {
        self.check("set_members", set_key)?;
        self.inner.set_members(set_key).await
    }

    async fn list_push(&self, key: &str, value: &[u8]) -> Result<u64, EtymonError> {
        self.check("list_push", key)?;
        self.inner.list_push(key, value).await
    }

    async fn list_all(&self, key: &str) -> Result<Vec<Vec<u8>>, EtymonError> {
        self.check("list_all", key)?;
        self.inner.list_all(key).await
    }

    async fn list_len(&self, key: &str) -> Result<u64, EtymonError> {
        self.check("list_len", key)?;
        self.inner.list_len(key).await
    }

    async fn list_trim_front(&self, key: &str, count: u64) -> Result<(), EtymonError> {
        self.check("list_trim_front", key)?;
        self.inner.list_trim_front(key, count).await
    }

    async fn list_delete(&self, key: &str) -> Result<(), EtymonError> {
        self.check("list_delete", key)?;
        self.inner.list_delete(key).await
    }
}
