// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for etymon integration tests.
//!
//! Provides mock sinks, fault injection and a small harness so tests run
//! without a Redis server.
//!
//! # Components
//!
//! - [`MockHistorySink`] - Idempotent in-memory sink with per-user failures
//! - [`FaultyStore`] - Store wrapper that fails selected keys on demand
//! - [`TestHarness`] - Memory store plus a temporary SQLite sink

pub mod faulty_store;
pub mod harness;
pub mod mock_sink;

pub use faulty_store::FaultyStore;
pub use harness::TestHarness;
pub use mock_sink::MockHistorySink;

/// Lock a mutex, recovering the data if a panicking test poisoned it.
pub(crate) fn lock<T>(mutex: &std::sync::Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
