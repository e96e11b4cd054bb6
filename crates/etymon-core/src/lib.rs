// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the etymon ephemeral-state subsystem.
//!
//! This crate provides the capability traits ([`EphemeralStore`],
//! [`HistorySink`]), the shared error type, and the small value types that
//! cross crate boundaries. The rate limiter, autocomplete index and history
//! reconciler are all written against these traits only.

pub mod error;
pub mod traits;
pub mod types;

pub use error::EtymonError;
pub use traits::{EphemeralStore, HistorySink};
pub use types::{HealthStatus, HistoryEntry, RateDecision};
