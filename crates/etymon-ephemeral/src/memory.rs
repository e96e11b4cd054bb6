// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process implementation of the ephemeral store.
//!
//! All state lives behind one mutex, so every operation (including the
//! increment-and-expire pair) is atomic with respect to every other. Expiry
//! is lazy: an expired key is dropped the next time anything touches it.
//! Deadlines are measured on `tokio::time::Instant`, which lets tests pause
//! and advance the clock.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::ops::Bound;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use etymon_core::{EphemeralStore, EtymonError};

const WRONG_TYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

#[derive(Debug)]
enum Value {
    Bytes(Vec<u8>),
    SortedSet(BTreeSet<String>),
    Set(HashSet<String>),
    List(VecDeque<Vec<u8>>),
}

#[derive(Debug)]
struct Slot {
    value: Value,
    expires_at: Option<Instant>,
}

impl Slot {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }
}

#[derive(Debug, Default)]
struct Keyspace {
    slots: HashMap<String, Slot>,
}

impl Keyspace {
    fn evict_expired(&mut self, key: &str, now: Instant) {
        let expired = self
            .slots
            .get(key)
            .and_then(|slot| slot.expires_at)
            .is_some_and(|at| at <= now);
        if expired {
            self.slots.remove(key);
        }
    }

    /// Returns the live slot at `key`, evicting it first if it has expired.
    fn live(&mut self, key: &str, now: Instant) -> Option<&mut Slot> {
        self.evict_expired(key, now);
        self.slots.get_mut(key)
    }

    fn live_or_insert(&mut self, key: &str, now: Instant, empty: fn() -> Value) -> &mut Slot {
        self.evict_expired(key, now);
        self.slots
            .entry(key.to_string())
            .or_insert_with(|| Slot::new(empty()))
    }
}

/// Single-process [`EphemeralStore`] backed by a mutex-guarded keyspace.
///
/// Suitable for tests and single-node development; state is lost when the
/// process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    keyspace: Mutex<Keyspace>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Keyspace>, EtymonError> {
        self.keyspace
            .lock()
            .map_err(|_| EtymonError::Internal("memory store mutex poisoned".to_string()))
    }

    fn incr(keyspace: &mut Keyspace, key: &str, now: Instant) -> Result<i64, EtymonError> {
        let slot = keyspace.live_or_insert(key, now, || Value::Bytes(b"0".to_vec()));
        let Value::Bytes(bytes) = &mut slot.value else {
            return Err(EtymonError::store(WRONG_TYPE));
        };
        let current: i64 = std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| EtymonError::store("ERR value is not an integer or out of range"))?;
        let next = current
            .checked_add(1)
            .ok_or_else(|| EtymonError::store("ERR increment or decrement would overflow"))?;
        *bytes = next.to_string().into_bytes();
        Ok(next)
    }
}

#[async_trait]
impl EphemeralStore for MemoryStore {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn ping(&self) -> Result<(), EtymonError> {
        self.lock().map(|_| ())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, EtymonError> {
        let mut ks = self.lock()?;
        match ks.live(key, Instant::now()) {
            None => Ok(None),
            Some(Slot {
                value: Value::Bytes(bytes),
                ..
            }) => Ok(Some(bytes.clone())),
            Some(_) => Err(EtymonError::store(WRONG_TYPE)),
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), EtymonError> {
        let mut ks = self.lock()?;
        ks.slots
            .insert(key.to_string(), Slot::new(Value::Bytes(value.to_vec())));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), EtymonError> {
        self.lock()?.slots.remove(key);
        Ok(())
    }

    async fn increment(&self, key: &str) -> Result<i64, EtymonError> {
        let mut ks = self.lock()?;
        Self::incr(&mut ks, key, Instant::now())
    }

    async fn increment_and_expire(
        &self,
        key: &str,
        window: Duration,
    ) -> Result<i64, EtymonError> {
        let now = Instant::now();
        let mut ks = self.lock()?;
        let count = Self::incr(&mut ks, key, now)?;
        if let Some(slot) = ks.slots.get_mut(key) {
            slot.expires_at.get_or_insert(now + window);
        }
        Ok(count)
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>, EtymonError> {
        let now = Instant::now();
        let mut ks = self.lock()?;
        Ok(ks
            .live(key, now)
            .and_then(|slot| slot.expires_at)
            .map(|at| at.saturating_duration_since(now)))
    }

    async fn sorted_set_add(&self, set_key: &str, members: &[String]) -> Result<(), EtymonError> {
        if members.is_empty() {
            return Ok(());
        }
        let mut ks = self.lock()?;
        let slot = ks.live_or_insert(set_key, Instant::now(), || {
            Value::SortedSet(BTreeSet::new())
        });
        let Value::SortedSet(set) = &mut slot.value else {
            return Err(EtymonError::store(WRONG_TYPE));
        };
        set.extend(members.iter().cloned());
        Ok(())
    }

    async fn sorted_set_range_by_prefix(
        &self,
        set_key: &str,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>, EtymonError> {
        let mut ks = self.lock()?;
        match ks.live(set_key, Instant::now()) {
            None => Ok(Vec::new()),
            Some(Slot {
                value: Value::SortedSet(set),
                ..
            }) => Ok(set
                .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
                .take_while(|m| m.starts_with(prefix))
                .take(limit)
                .cloned()
                .collect()),
            Some(_) => Err(EtymonError::store(WRONG_TYPE)),
        }
    }

    async fn sorted_set_card(&self, set_key: &str) -> Result<u64, EtymonError> {
        let mut ks = self.lock()?;
        match ks.live(set_key, Instant::now()) {
            None => Ok(0),
            Some(Slot {
                value: Value::SortedSet(set),
                ..
            }) => Ok(set.len() as u64),
            Some(_) => Err(EtymonError::store(WRONG_TYPE)),
        }
    }

    async fn set_add(&self, set_key: &str, member: &str) -> Result<(), EtymonError> {
        let mut ks = self.lock()?;
        let slot = ks.live_or_insert(set_key, Instant::now(), || Value::Set(HashSet::new()));
        let Value::Set(set) = &mut slot.value else {
            return Err(EtymonError::store(WRONG_TYPE));
        };
        set.insert(member.to_string());
        Ok(())
    }

    async fn set_remove(&self, set_key: &str, member: &str) -> Result<(), EtymonError> {
        let mut ks = self.lock()?;
        let now_empty = match ks.live(set_key, Instant::now()) {
            None => return Ok(()),
            Some(Slot {
                value: Value::Set(set),
                ..
            }) => {
                set.remove(member);
                set.is_empty()
            }
            Some(_) => return Err(EtymonError::store(WRONG_TYPE)),
        };
        if now_empty {
            ks.slots.remove(set_key);
        }
        Ok(())
    }

    async fn set_members(&self, set_key: &str) -> Result<Vec<String>, EtymonError> {
        let mut ks = self.lock()?;
        match ks.live(set_key, Instant::now()) {
            None => Ok(Vec::new()),
            Some(Slot {
                value: Value::Set(set),
                ..
            }) => Ok(set.iter().cloned().collect()),
            Some(_) => Err(EtymonError::store(WRONG_TYPE)),
        }
    }

    async fn list_push(&self, key: &str, value: &[u8]) -> Result<u64, EtymonError> {
        let mut ks = self.lock()?;
        let slot = ks.live_or_insert(key, Instant::now(), || Value::List(VecDeque::new()));
        let Value::List(list) = &mut slot.value else {
            return Err(EtymonError::store(WRONG_TYPE));
        };
        list.push_back(value.to_vec());
        Ok(list.len() as u64)
    }

    async fn list_all(&self, key: &str) -> Result<Vec<Vec<u8>>, EtymonError> {
        let mut ks = self.lock()?;
        match ks.live(key, Instant::now()) {
            None => Ok(Vec::new()),
            Some(Slot {
                value: Value::List(list),
                ..
            }) => Ok(list.iter().cloned().collect()),
            Some(_) => Err(EtymonError::store(WRONG_TYPE)),
        }
    }

    async fn list_len(&self, key: &str) -> Result<u64, EtymonError> {
        let mut ks = self.lock()?;
        match ks.live(key, Instant::now()) {
            None => Ok(0),
            Some(Slot {
                value: Value::List(list),
                ..
            }) => Ok(list.len() as u64),
            Some(_) => Err(EtymonError::store(WRONG_TYPE)),
        }
    }

    async fn list_trim_front(&self, key: &str, count: u64) -> Result<(), EtymonError> {
        let mut ks = self.lock()?;
        let now_empty = match ks.live(key, Instant::now()) {
            None => return Ok(()),
            Some(Slot {
                value: Value::List(list),
                ..
            }) => {
                let n = usize::try_from(count).unwrap_or(usize::MAX).min(list.len());
                list.drain(..n);
                list.is_empty()
            }
            Some(_) => return Err(EtymonError::store(WRONG_TYPE)),
        };
        if now_empty {
            ks.slots.remove(key);
        }
        Ok(())
    }

    async fn list_delete(&self, key: &str) -> Result<(), EtymonError> {
        let mut ks = self.lock()?;
        match ks.live(key, Instant::now()) {
            None => Ok(()),
            Some(Slot {
                value: Value::List(_),
                ..
            }) => {
                ks.slots.remove(key);
                Ok(())
            }
            Some(_) => Err(EtymonError::store(WRONG_TYPE)),
        }
    }
}
