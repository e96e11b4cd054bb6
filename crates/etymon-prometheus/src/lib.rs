// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics for etymon.
//!
//! Uses the metrics-rs facade with the Prometheus exporter. Metrics are
//! rendered as Prometheus text format via [`PrometheusExporter::render`],
//! which the gateway exposes at `/metrics`.

pub mod recording;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use etymon_core::EtymonError;

pub use recording::{
    record_autocomplete_query, record_rate_check, record_rate_check_error,
    record_reconcile_duration, record_reconcile_entries, record_reconcile_user,
    register_metrics, set_vocabulary_size,
};

/// Installed Prometheus recorder.
#[derive(Clone)]
pub struct PrometheusExporter {
    handle: PrometheusHandle,
}

impl std::fmt::Debug for PrometheusExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusExporter").finish_non_exhaustive()
    }
}

impl PrometheusExporter {
    /// Install the Prometheus recorder globally.
    ///
    /// Only one recorder can be installed per process; a second call fails.
    pub fn install() -> Result<Self, EtymonError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            EtymonError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        register_metrics();
        tracing::info!("prometheus metrics recorder installed");
        Ok(Self { handle })
    }

    /// Wrap a handle from a recorder built elsewhere (tests build a
    /// recorder without installing it globally).
    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_counters_render_with_labels() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let exporter = PrometheusExporter::from_handle(recorder.handle());

        metrics::with_local_recorder(&recorder, || {
            record_rate_check("search", true);
            record_rate_check("search", false);
            record_reconcile_entries(3);
        });

        let text = exporter.render();
        assert!(text.contains("etymon_ratelimit_checks_total"));
        assert!(text.contains("outcome=\"denied\""));
        assert!(text.contains("etymon_reconcile_entries_total 3"));
    }

    #[test]
    fn helpers_are_noops_without_recorder() {
        record_autocomplete_query();
        set_vocabulary_size(10);
        record_reconcile_user("flushed");
        record_reconcile_duration(0.25);
    }
}
