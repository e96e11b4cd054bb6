// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Immutable per-action limit table.

use std::collections::BTreeMap;
use std::time::Duration;

use etymon_config::model::{LimitSpec, LimitsConfig};
use serde::Serialize;

/// At most `limit` requests per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionLimit {
    pub limit: i64,
    pub window: Duration,
}

impl ActionLimit {
    pub fn new(limit: i64, window: Duration) -> Self {
        Self { limit, window }
    }

    pub fn window_seconds(&self) -> u64 {
        self.window.as_secs()
    }
}

impl From<LimitSpec> for ActionLimit {
    fn from(spec: LimitSpec) -> Self {
        Self::new(spec.limit, Duration::from_secs(spec.window_secs))
    }
}

/// Wire form of one table row: `{limit, window_seconds}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LimitView {
    pub limit: i64,
    pub window_seconds: u64,
}

impl From<&ActionLimit> for LimitView {
    fn from(limit: &ActionLimit) -> Self {
        Self {
            limit: limit.limit,
            window_seconds: limit.window_seconds(),
        }
    }
}

/// Metrics label shared by every action without its own table row.
pub const OTHER_ACTION_LABEL: &str = "other";

/// Known actions and the fallback for everything else.
///
/// Built once at startup and shared by reference; never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitTable {
    actions: BTreeMap<String, ActionLimit>,
    fallback: ActionLimit,
}

impl LimitTable {
    pub fn new(actions: BTreeMap<String, ActionLimit>, fallback: ActionLimit) -> Self {
        Self { actions, fallback }
    }

    pub fn from_config(config: &LimitsConfig) -> Self {
        let actions = config
            .actions
            .iter()
            .map(|(name, spec)| (name.clone(), ActionLimit::from(*spec)))
            .collect();
        Self::new(actions, ActionLimit::from(config.default))
    }

    /// Limit for `action`, falling back to the default for unknown actions.
    pub fn resolve(&self, action: &str) -> ActionLimit {
        self.actions.get(action).copied().unwrap_or(self.fallback)
    }

    /// Metrics label for `action`: its configured name, or
    /// [`OTHER_ACTION_LABEL`]. Keeps label cardinality bounded by the table
    /// no matter what callers send.
    pub fn metric_label(&self, action: &str) -> &str {
        self.actions
            .get_key_value(action)
            .map_or(OTHER_ACTION_LABEL, |(name, _)| name.as_str())
    }

    pub fn fallback(&self) -> ActionLimit {
        self.fallback
    }

    /// Known actions in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ActionLimit)> {
        self.actions.iter().map(|(name, limit)| (name.as_str(), limit))
    }

    /// The `{action: {limit, window_seconds}}` map served to clients.
    pub fn view(&self) -> BTreeMap<String, LimitView> {
        self.iter()
            .map(|(name, limit)| (name.to_string(), LimitView::from(limit)))
            .collect()
    }
}

impl Default for LimitTable {
    fn default() -> Self {
        Self::from_config(&LimitsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_action_uses_default() {
        let table = LimitTable::default();
        assert_eq!(
            table.resolve("no-such-action"),
            ActionLimit::new(100, Duration::from_secs(60))
        );
    }

    #[test]
    fn metric_label_collapses_unknown_actions() {
        let table = LimitTable::default();
        assert_eq!(table.metric_label("search"), "search");
        assert_eq!(table.metric_label("junk-17"), OTHER_ACTION_LABEL);
        assert_eq!(table.metric_label(""), OTHER_ACTION_LABEL);
    }

    #[test]
    fn configured_action_resolves() {
        let table = LimitTable::default();
        assert_eq!(table.resolve("search").limit, 50);
        assert_eq!(table.resolve("search").window_seconds(), 60);
    }

    #[test]
    fn view_lists_every_known_action() {
        let mut config = LimitsConfig::default();
        config.actions.insert(
            "export".to_string(),
            LimitSpec {
                limit: 5,
                window_secs: 3600,
            },
        );
        let view = LimitTable::from_config(&config).view();
        assert_eq!(
            view["export"],
            LimitView {
                limit: 5,
                window_seconds: 3600
            }
        );
        assert_eq!(view.len(), config.actions.len());
    }
}
