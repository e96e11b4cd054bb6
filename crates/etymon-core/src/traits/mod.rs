// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits at the boundaries of the subsystem.
//!
//! Both traits use `#[async_trait]` so implementations can be held as
//! `Arc<dyn ...>` and shared between request handlers and batch jobs.

pub mod sink;
pub mod store;

pub use sink::HistorySink;
pub use store::EphemeralStore;
