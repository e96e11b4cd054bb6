// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ephemeral store backends.
//!
//! [`RedisStore`] is the production backend, [`MemoryStore`] an in-process
//! stand-in for tests and single-node development. [`TimeoutStore`] adds a
//! per-operation deadline in front of either.

pub mod memory;
pub mod redis_store;
pub mod timeout;

use std::sync::Arc;
use std::time::Duration;

use etymon_config::model::{StoreBackend, StoreConfig};
use etymon_core::{EphemeralStore, EtymonError};
use tracing::info;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use timeout::TimeoutStore;

/// Open the configured backend, wrapped in the per-operation deadline.
///
/// For Redis this connects and pings before returning, so an unreachable
/// server fails here with [`EtymonError::Config`].
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn EphemeralStore>, EtymonError> {
    let deadline = Duration::from_millis(config.op_timeout_ms);
    let store: Arc<dyn EphemeralStore> = match config.backend {
        StoreBackend::Redis => {
            let connect_timeout = Duration::from_millis(config.connect_timeout_ms);
            let redis = RedisStore::connect(&config.url, connect_timeout).await?;
            Arc::new(TimeoutStore::new(redis, deadline))
        }
        StoreBackend::Memory => Arc::new(TimeoutStore::new(MemoryStore::new(), deadline)),
    };
    info!(
        backend = store.backend(),
        op_timeout_ms = config.op_timeout_ms,
        "ephemeral store ready"
    );
    Ok(store)
}
