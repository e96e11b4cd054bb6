// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics. Without an installed recorder every call is
//! a no-op.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all etymon metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "etymon_ratelimit_checks_total",
        "Rate-limit checks by action and outcome"
    );
    describe_counter!(
        "etymon_autocomplete_queries_total",
        "Autocomplete suggestion queries served"
    );
    describe_gauge!(
        "etymon_autocomplete_vocabulary_size",
        "Distinct words in the autocomplete index"
    );
    describe_counter!(
        "etymon_reconcile_users_total",
        "Users processed by the history reconciler, by status"
    );
    describe_counter!(
        "etymon_reconcile_entries_total",
        "History entries migrated to durable storage"
    );
    describe_histogram!(
        "etymon_reconcile_run_seconds",
        "Wall-clock duration of a reconciliation run"
    );
}

/// Record one rate-limit decision.
pub fn record_rate_check(action: &str, allowed: bool) {
    let outcome = if allowed { "allowed" } else { "denied" };
    metrics::counter!(
        "etymon_ratelimit_checks_total",
        "action" => action.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a rate-limit check that failed on the store.
pub fn record_rate_check_error(action: &str) {
    metrics::counter!(
        "etymon_ratelimit_checks_total",
        "action" => action.to_string(),
        "outcome" => "error"
    )
    .increment(1);
}

/// Record a served autocomplete query.
pub fn record_autocomplete_query() {
    metrics::counter!("etymon_autocomplete_queries_total").increment(1);
}

/// Set the indexed vocabulary size.
pub fn set_vocabulary_size(words: u64) {
    metrics::gauge!("etymon_autocomplete_vocabulary_size").set(words as f64);
}

/// Record one reconciled user with its final status label.
pub fn record_reconcile_user(status: &str) {
    metrics::counter!("etymon_reconcile_users_total", "status" => status.to_string())
        .increment(1);
}

/// Record migrated entries.
pub fn record_reconcile_entries(count: u64) {
    metrics::counter!("etymon_reconcile_entries_total").increment(count);
}

/// Record the duration of a reconciliation run.
pub fn record_reconcile_duration(seconds: f64) {
    metrics::histogram!("etymon_reconcile_run_seconds").record(seconds);
}
