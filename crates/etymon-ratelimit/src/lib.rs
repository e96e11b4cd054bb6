// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-window rate limiting keyed by client and action.
//!
//! The limiter holds no state of its own: counters live in the shared
//! ephemeral store under `rate:{client}:{action}` and expire with their
//! window.

pub mod limiter;
pub mod limits;

pub use limiter::{RateLimiter, rate_key};
pub use limits::{ActionLimit, LimitTable, LimitView, OTHER_ACTION_LABEL};
