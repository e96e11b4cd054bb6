// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the store-backed components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EtymonError;

/// Health status reported by store health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Backend is fully operational.
    Healthy,
    /// Backend is operational but experiencing issues.
    Degraded(String),
    /// Backend is not operational.
    Unhealthy(String),
}

/// Outcome of one fixed-window admission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateDecision {
    /// Whether the request is admitted.
    pub allowed: bool,
    /// Requests left in the current window, never negative.
    pub remaining: i64,
    /// When the current window expires.
    pub reset_at: DateTime<Utc>,
    /// The limit that applied to the action.
    pub limit: i64,
}

/// One pending history record as framed in the ephemeral store.
///
/// `seq` is allocated per user by the write path and never reused, so
/// `(user_id, seq)` is the natural key of the durable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Per-user sequence number, starting at 1.
    pub seq: u64,
    /// When the write path recorded the entry.
    pub recorded_at: DateTime<Utc>,
    /// Opaque body supplied by the writer.
    pub payload: serde_json::Value,
}

impl HistoryEntry {
    /// Serialize into the byte form stored in the per-user list.
    pub fn encode(&self) -> Result<Vec<u8>, EtymonError> {
        serde_json::to_vec(self).map_err(|e| EtymonError::Codec {
            message: format!("failed to encode history entry {}: {e}", self.seq),
        })
    }

    /// Parse a record read back from the per-user list.
    pub fn decode(bytes: &[u8]) -> Result<Self, EtymonError> {
        serde_json::from_slice(bytes).map_err(|e| EtymonError::Codec {
            message: format!("malformed history entry: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_entry_survives_store_framing() {
        let entry = HistoryEntry {
            seq: 7,
            recorded_at: "2026-01-01T00:00:00Z".parse().unwrap(),
            payload: serde_json::json!({"word": "etymology"}),
        };
        let bytes = entry.encode().unwrap();
        assert_eq!(HistoryEntry::decode(&bytes).unwrap(), entry);
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = HistoryEntry::decode(b"not json").unwrap_err();
        assert!(matches!(err, EtymonError::Codec { .. }));
    }

    #[test]
    fn rate_decision_serializes_reset_at_as_rfc3339() {
        let decision = RateDecision {
            allowed: false,
            remaining: 0,
            reset_at: "2026-03-01T12:00:30Z".parse().unwrap(),
            limit: 50,
        };
        let json = serde_json::to_string(&decision).unwrap();
        assert!(json.contains("\"allowed\":false"));
        assert!(json.contains("\"reset_at\":\"2026-03-01T12:00:30Z\""));
        assert!(json.contains("\"limit\":50"));
    }

    #[test]
    fn health_status_variants() {
        assert_eq!(HealthStatus::Healthy, HealthStatus::Healthy);
        assert_ne!(HealthStatus::Degraded("slow".into()), HealthStatus::Healthy);
        assert_ne!(HealthStatus::Unhealthy("down".into()), HealthStatus::Healthy);
    }
}
