// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-window admission control.
//!
//! Every check increments the window counter first and compares after, so a
//! concurrent burst at a window boundary can over-admit by a few requests.
//! That approximation is accepted; the counter never double-counts and the
//! window TTL is never renewed by a later request.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, warn};

use etymon_core::{EphemeralStore, EtymonError, RateDecision};

use crate::limits::LimitTable;

/// Store key for one client's counter on one action.
pub fn rate_key(client_id: &str, action: &str) -> String {
    format!("rate:{client_id}:{action}")
}

/// Stateless rate limiter; clone freely across request workers.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn EphemeralStore>,
    limits: Arc<LimitTable>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn EphemeralStore>, limits: Arc<LimitTable>) -> Self {
        Self { store, limits }
    }

    pub fn limits(&self) -> &LimitTable {
        &self.limits
    }

    /// Count one request by `client_id` for `action` and decide whether to
    /// admit it. Store failures are returned unchanged; nothing is retried.
    pub async fn check(&self, client_id: &str, action: &str) -> Result<RateDecision, EtymonError> {
        let limit = self.limits.resolve(action);
        let label = self.limits.metric_label(action);
        let key = rate_key(client_id, action);

        let counted = async {
            let count = self.store.increment_and_expire(&key, limit.window).await?;
            let ttl = self.store.time_to_live(&key).await?;
            Ok::<_, EtymonError>((count, ttl))
        }
        .await;

        let (count, ttl) = match counted {
            Ok(v) => v,
            Err(e) => {
                warn!(client_id, action, error = %e, "rate limit check failed");
                etymon_prometheus::record_rate_check_error(label);
                return Err(e);
            }
        };

        // No TTL: the window was created a moment ago.
        let remaining_window = ttl.unwrap_or(limit.window);
        let now = Utc::now();
        let reset_at = TimeDelta::from_std(remaining_window)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let decision = RateDecision {
            allowed: count <= limit.limit,
            remaining: (limit.limit - count).max(0),
            reset_at,
            limit: limit.limit,
        };

        debug!(
            client_id,
            action,
            count,
            allowed = decision.allowed,
            remaining = decision.remaining,
            "rate limit checked"
        );
        etymon_prometheus::record_rate_check(label, decision.allowed);
        Ok(decision)
    }
}
