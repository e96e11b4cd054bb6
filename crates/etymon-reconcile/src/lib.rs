// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending lookup history: the write path that fills it and the
//! reconciler that drains it into durable storage.

pub mod keys;
pub mod reconciler;
pub mod recorder;
pub mod summary;

pub use keys::{ACTIVE_USERS_KEY, entries_key, seq_key};
pub use reconciler::HistoryReconciler;
pub use recorder::HistoryRecorder;
pub use summary::{FlushStatus, RunMode, RunSummary, UserOutcome};
