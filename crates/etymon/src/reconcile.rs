// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `etymon reconcile` command implementation.
//!
//! One pass of the history reconciler. Both stores are opened up front, in
//! dry-run mode too, so an unreachable store fails the command.

use std::fmt;
use std::sync::Arc;

use etymon_config::EtymonConfig;
use etymon_core::EtymonError;
use etymon_reconcile::{FlushStatus, HistoryReconciler, RunMode, RunSummary};
use etymon_storage::{Database, SqliteHistoryStore};
use tracing::warn;

/// Run one reconciliation pass and print its summary to stdout.
pub async fn run_reconcile(
    config: EtymonConfig,
    dry_run: bool,
    json: bool,
) -> Result<RunSummary, EtymonError> {
    let store = etymon_ephemeral::open_store(&config.store).await?;
    let db = Database::open_with_config(&config.storage).await?;
    let sink = Arc::new(SqliteHistoryStore::new(db));

    let mode = if dry_run { RunMode::DryRun } else { RunMode::Live };
    let summary = HistoryReconciler::new(store, sink.clone()).run(mode).await?;

    if mode == RunMode::Live {
        if let Err(e) = sink.database().checkpoint().await {
            warn!(error = %e, "wal checkpoint after reconciliation failed");
        }
    }

    if json {
        let out = serde_json::to_string_pretty(&summary)
            .map_err(|e| EtymonError::Internal(format!("failed to encode summary: {e}")))?;
        println!("{out}");
    } else {
        print!("{}", render_summary(&summary));
    }
    Ok(summary)
}

/// Human-readable summary, one line per user.
pub fn render_summary(summary: &RunSummary) -> String {
    SummaryReport(summary).to_string()
}

struct SummaryReport<'a>(&'a RunSummary);

impl fmt::Display for SummaryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.0;
        match summary.mode {
            RunMode::DryRun => {
                writeln!(
                    f,
                    "dry run: {} users with {} pending entries (no changes made)",
                    summary.users_seen,
                    summary.entries_pending()
                )?;
                for o in &summary.outcomes {
                    match &o.error {
                        None => writeln!(f, "  {:<24} {:>6} pending", o.user_id, o.entries)?,
                        Some(e) => writeln!(f, "  {:<24} error: {e}", o.user_id)?,
                    }
                }
            }
            RunMode::Live => {
                writeln!(
                    f,
                    "flushed {} of {} users, {} entries migrated in {:.2?}",
                    summary.users_flushed,
                    summary.users_seen,
                    summary.entries_migrated,
                    summary.elapsed
                )?;
                for o in &summary.outcomes {
                    write!(
                        f,
                        "  {:<24} {:<8} entries={} inserted={}",
                        o.user_id, o.status, o.entries, o.inserted
                    )?;
                    if o.status == FlushStatus::Failed {
                        write!(f, " error: {}", o.error.as_deref().unwrap_or("unknown"))?;
                    }
                    writeln!(f)?;
                }
                if summary.has_failures() {
                    writeln!(
                        f,
                        "{} users left pending for the next run",
                        summary.users_failed
                    )?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use etymon_reconcile::UserOutcome;

    #[test]
    fn live_summary_lists_every_user() {
        let summary = RunSummary::from_outcomes(
            RunMode::Live,
            vec![
                UserOutcome::flushed("alice", 3, 3),
                UserOutcome::failed("bob", 2, 0, "storage error: disk full".into()),
            ],
            Duration::from_millis(40),
        );
        let text = render_summary(&summary);
        assert!(text.starts_with("flushed 1 of 2 users, 3 entries migrated"));
        assert!(text.contains("alice"));
        assert!(text.contains("bob"));
        assert!(text.contains("disk full"));
        assert!(text.contains("1 users left pending"));
    }

    #[test]
    fn dry_run_summary_reports_pending_counts() {
        let summary = RunSummary::from_outcomes(
            RunMode::DryRun,
            vec![UserOutcome::previewed("alice", 4), UserOutcome::previewed("bob", 1)],
            Duration::from_millis(5),
        );
        let text = render_summary(&summary);
        assert!(text.starts_with("dry run: 2 users with 5 pending entries"));
        assert!(text.contains("no changes made"));
        assert_eq!(text.lines().count(), 3);
    }
}
