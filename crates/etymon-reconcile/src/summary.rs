// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user outcomes and the run summary.

use std::time::Duration;

use serde::Serialize;
use strum::Display;

/// How a reconciliation run treats the pending history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RunMode {
    /// Persist and clear.
    Live,
    /// Count only; nothing is written or removed.
    DryRun,
}

/// Final state of one user after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FlushStatus {
    /// Entries persisted and cleared; the user left the active set
    /// unless new entries arrived meanwhile.
    Flushed,
    /// Dry run: entries counted only.
    Previewed,
    /// Something failed; the user stays active for the next run.
    Failed,
}

/// Result for one active user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserOutcome {
    pub user_id: String,
    pub status: FlushStatus,
    /// Pending entries fetched for the user.
    pub entries: u64,
    /// Durable rows that did not exist before this run. Lower than
    /// `entries` when a previous run persisted but never cleared.
    pub inserted: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UserOutcome {
    pub fn flushed(user_id: &str, entries: u64, inserted: u64) -> Self {
        Self {
            user_id: user_id.to_string(),
            status: FlushStatus::Flushed,
            entries,
            inserted,
            error: None,
        }
    }

    pub fn previewed(user_id: &str, entries: u64) -> Self {
        Self {
            user_id: user_id.to_string(),
            status: FlushStatus::Previewed,
            entries,
            inserted: 0,
            error: None,
        }
    }

    pub fn failed(user_id: &str, entries: u64, inserted: u64, error: String) -> Self {
        Self {
            user_id: user_id.to_string(),
            status: FlushStatus::Failed,
            entries,
            inserted,
            error: Some(error),
        }
    }
}

/// Aggregate result of one reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub mode: RunMode,
    pub users_seen: usize,
    pub users_flushed: usize,
    pub users_failed: usize,
    /// Entries persisted and cleared by this run.
    pub entries_migrated: u64,
    pub outcomes: Vec<UserOutcome>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

impl RunSummary {
    /// Fold per-user outcomes into totals.
    pub fn from_outcomes(mode: RunMode, outcomes: Vec<UserOutcome>, elapsed: Duration) -> Self {
        let users_flushed = outcomes
            .iter()
            .filter(|o| o.status == FlushStatus::Flushed)
            .count();
        let users_failed = outcomes
            .iter()
            .filter(|o| o.status == FlushStatus::Failed)
            .count();
        let entries_migrated = outcomes
            .iter()
            .filter(|o| o.status == FlushStatus::Flushed)
            .map(|o| o.entries)
            .sum();
        Self {
            mode,
            users_seen: outcomes.len(),
            users_flushed,
            users_failed,
            entries_migrated,
            outcomes,
            elapsed,
        }
    }

    /// Total pending entries across all users, as counted this run.
    pub fn entries_pending(&self) -> u64 {
        self.outcomes.iter().map(|o| o.entries).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.users_failed > 0
    }
}
