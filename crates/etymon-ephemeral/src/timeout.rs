// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-operation deadline decorator.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use etymon_core::{EphemeralStore, EtymonError, HealthStatus};

/// Wraps any [`EphemeralStore`] and fails each operation with
/// [`EtymonError::Timeout`] once `deadline` has elapsed.
///
/// The abandoned operation may still complete on the backend.
#[derive(Debug)]
pub struct TimeoutStore<S> {
    inner: S,
    deadline: Duration,
}

impl<S: EphemeralStore> TimeoutStore<S> {
    pub fn new(inner: S, deadline: Duration) -> Self {
        Self { inner, deadline }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn guard<T>(
        &self,
        fut: impl Future<Output = Result<T, EtymonError>>,
    ) -> Result<T, EtymonError> {
        tokio::time::timeout(self.deadline, fut)
            .await
            .map_err(|_| EtymonError::Timeout {
                duration: self.deadline,
            })?
    }
}

#[async_trait]
impl<S: EphemeralStore> EphemeralStore for TimeoutStore<S> {
    fn backend(&self) -> &str {
        self.inner.backend()
    }

    async fn ping(&self) -> Result<(), EtymonError> {
        self.guard(self.inner.ping()).await
    }

    /// A ping that answers but eats more than half the deadline is reported
    /// as degraded.
    async fn health_check(&self) -> HealthStatus {
        let started = tokio::time::Instant::now();
        match self.ping().await {
            Ok(()) if started.elapsed() > self.deadline / 2 => {
                HealthStatus::Degraded(format!("ping took {:?}", started.elapsed()))
            }
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, EtymonError> {
        self.guard(self.inner.get(key)).await
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), EtymonError> {
        self.guard(self.inner.set(key, value)).await
    }

    async fn delete(&self, key: &str) -> Result<(), EtymonError> {
        self.guard(self.inner.delete(key)).await
    }

    async fn increment(&self, key: &str) -> Result<i64, EtymonError> {
        self.guard(self.inner.increment(key)).await
    }

    async fn increment_and_expire(
        &self,
        key: &str,
        window: Duration,
    ) -> Result<i64, EtymonError> {
        self.guard(self.inner.increment_and_expire(key, window))
            .await
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>, EtymonError> {
        self.guard(self.inner.time_to_live(key)).await
    }

    async fn sorted_set_add(&self, set_key: &str, members: &[String]) -> Result<(), EtymonError> {
        self.guard(self.inner.sorted_set_add(set_key, members))
            .await
    }

    async fn sorted_set_range_by_prefix(
        &self,
        set_key: &str,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>, EtymonError> {
        self.guard(self.inner.sorted_set_range_by_prefix(set_key, prefix, limit))
            .await
    }

    async fn sorted_set_card(&self, set_key: &str) -> Result<u64, EtymonError> {
        self.guard(self.inner.sorted_set_card(set_key)).await
    }

    async fn set_add(&self, set_key: &str, member: &str) -> Result<(), EtymonError> {
        self.guard(self.inner.set_add(set_key, member)).await
    }

    async fn set_remove(&self, set_key: &str, member: &str) -> Result<(), EtymonError> {
        self.guard(self.inner.set_remove(set_key, member)).await
    }

    async fn set_members(&self, set_key: &str) -> Result<Vec<String>, EtymonError> {
        self.guard(self.inner.set_members(set_key)).await
    }

    async fn list_push(&self, key: &str, value: &[u8]) -> Result<u64, EtymonError> {
        self.guard(self.inner.list_push(key, value)).await
    }

    async fn list_all(&self, key: &str) -> Result<Vec<Vec<u8>>, EtymonError> {
        self.guard(self.inner.list_all(key)).await
    }

    async fn list_len(&self, key: &str) -> Result<u64, EtymonError> {
        self.guard(self.inner.list_len(key)).await
    }

    async fn list_trim_front(&self, key: &str, count: u64) -> Result<(), EtymonError> {
        self.guard(self.inner.list_trim_front(key, count)).await
    }

    async fn list_delete(&self, key: &str) -> Result<(), EtymonError> {
        self.guard(self.inner.list_delete(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    /// Store whose every operation sleeps longer than any sane deadline.
    struct Stalled;

    #[async_trait]
    impl EphemeralStore for Stalled {
        fn backend(&self) -> &str {
            "stalled"
        }
        async fn ping(&self) -> Result<(), EtymonError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
        async fn get(&self, _: &str) -> Result<Option<Vec<u8>>, EtymonError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(None)
        }
        async fn set(&self, _: &str, _: &[u8]) -> Result<(), EtymonError> {
            unimplemented!()
        }
        async fn delete(&self, _: &str) -> Result<(), EtymonError> {
            unimplemented!()
        }
        async fn increment(&self, _: &str) -> Result<i64, EtymonError> {
            unimplemented!()
        }
        async fn increment_and_expire(&self, _: &str, _: Duration) -> Result<i64, EtymonError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(1)
        }
        async fn time_to_live(&self, _: &str) -> Result<Option<Duration>, EtymonError> {
            unimplemented!()
        }
        async fn sorted_set_add(&self, _: &str, _: &[String]) -> Result<(), EtymonError> {
            unimplemented!()
        }
        async fn sorted_set_range_by_prefix(
            &self,
            _: &str,
            _: &str,
            _: usize,
        ) -> Result<Vec<String>, EtymonError> {
            unimplemented!()
        }
        async fn sorted_set_card(&self, _: &str) -> Result<u64, EtymonError> {
            unimplemented!()
        }
        async fn set_add(&self, _: &str, _: &str) -> Result<(), EtymonError> {
            unimplemented!()
        }
        async fn set_remove(&self, _: &str, _: &str) -> Result<(), EtymonError> {
            unimplemented!()
        }
        async fn set_members(&self, _: &str) -> Result<Vec<String>, EtymonError> {
            unimplemented!()
        }
        async fn list_push(&self, _: &str, _: &[u8]) -> Result<u64, EtymonError> {
            unimplemented!()
        }
        async fn list_all(&self, _: &str) -> Result<Vec<Vec<u8>>, EtymonError> {
            unimplemented!()
        }
        async fn list_len(&self, _: &str) -> Result<u64, EtymonError> {
            unimplemented!()
        }
        async fn list_trim_front(&self, _: &str, _: u64) -> Result<(), EtymonError> {
            unimplemented!()
        }
        async fn list_delete(&self, _: &str) -> Result<(), EtymonError> {
            unimplemented!()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_operation_becomes_timeout() {
        let store = TimeoutStore::new(Stalled, Duration::from_millis(250));
        let err = store.get("k").await.unwrap_err();
        match err {
            EtymonError::Timeout { duration } => assert_eq!(duration, Duration::from_millis(250)),
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(store.ping().await.unwrap_err().is_transient());
        assert!(
            store
                .increment_and_expire("k", Duration::from_secs(1))
                .await
                .is_err()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn health_check_classifies_latency() {
        let stalled = TimeoutStore::new(Stalled, Duration::from_millis(100));
        assert!(matches!(
            stalled.health_check().await,
            HealthStatus::Unhealthy(_)
        ));

        let fast = TimeoutStore::new(MemoryStore::new(), Duration::from_millis(100));
        assert_eq!(fast.health_check().await, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn fast_operations_pass_through() {
        let store = TimeoutStore::new(MemoryStore::new(), Duration::from_secs(1));
        assert_eq!(store.backend(), "memory");
        store.set("k", b"v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.inner().get("k").await.unwrap(), Some(b"v".to_vec()));
    }
}
