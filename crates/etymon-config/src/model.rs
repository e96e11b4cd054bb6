// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level etymon configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EtymonConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Ephemeral store connection settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Durable history database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP surface settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Per-action request limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Autocomplete query settings.
    #[serde(default)]
    pub autocomplete: AutocompleteConfig,

    /// Prometheus exporter settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

/// Process-wide configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Which ephemeral store implementation to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Networked Redis-compatible server.
    #[default]
    Redis,
    /// In-process store; state dies with the process.
    Memory,
}

/// Ephemeral store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Backend implementation.
    #[serde(default)]
    pub backend: StoreBackend,

    /// Connection URL (`redis://`, `rediss://` or `unix://`).
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Deadline applied to every individual store operation.
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,

    /// Deadline for establishing the initial connection.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: default_store_url(),
            op_timeout_ms: default_op_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

fn default_store_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_op_timeout_ms() -> u64 {
    500
}

fn default_connect_timeout_ms() -> u64 {
    3000
}

/// Durable history database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("etymon").join("history.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("history.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3000
}

/// A single limit: at most `limit` requests per `window_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LimitSpec {
    /// Requests admitted per window.
    pub limit: i64,
    /// Window length in seconds.
    pub window_secs: u64,
}

/// Per-action request limits.
///
/// Actions not listed under `actions` fall back to `default`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Limit applied to unknown actions.
    #[serde(default = "default_limit")]
    pub default: LimitSpec,

    /// Known actions and their limits.
    #[serde(default = "default_actions")]
    pub actions: BTreeMap<String, LimitSpec>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default: default_limit(),
            actions: default_actions(),
        }
    }
}

fn default_limit() -> LimitSpec {
    LimitSpec {
        limit: 100,
        window_secs: 60,
    }
}

fn default_actions() -> BTreeMap<String, LimitSpec> {
    BTreeMap::from([
        (
            "search".to_string(),
            LimitSpec {
                limit: 50,
                window_secs: 60,
            },
        ),
        (
            "etymology".to_string(),
            LimitSpec {
                limit: 20,
                window_secs: 60,
            },
        ),
        (
            "autocomplete".to_string(),
            LimitSpec {
                limit: 300,
                window_secs: 60,
            },
        ),
    ])
}

/// Autocomplete query configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AutocompleteConfig {
    /// Default and maximum number of suggestions returned per query.
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

impl Default for AutocompleteConfig {
    fn default() -> Self {
        Self {
            max_suggestions: default_max_suggestions(),
        }
    }
}

fn default_max_suggestions() -> usize {
    10
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    /// Serve `/metrics` from the gateway.
    #[serde(default)]
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limit_is_one_hundred_per_minute() {
        let limits = LimitsConfig::default();
        assert_eq!(limits.default.limit, 100);
        assert_eq!(limits.default.window_secs, 60);
    }

    #[test]
    fn backend_parses_lowercase() {
        let config: StoreConfig = toml::from_str("backend = \"memory\"").unwrap();
        assert_eq!(config.backend, StoreBackend::Memory);
        assert_eq!(config.url, "redis://127.0.0.1:6379");
    }

    #[test]
    fn limit_spec_rejects_unknown_fields() {
        let result = toml::from_str::<LimitSpec>("limit = 5\nwindow_secs = 1\nburst = 2");
        assert!(result.is_err());
    }

    #[test]
    fn actions_table_deserializes() {
        let toml_str = r#"
[actions.search]
limit = 50
window_secs = 60

[actions.export]
limit = 2
window_secs = 3600
"#;
        let limits: LimitsConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(limits.actions.len(), 2);
        assert_eq!(limits.actions["export"].limit, 2);
        assert_eq!(limits.actions["export"].window_secs, 3600);
        assert_eq!(limits.default.limit, 100);
    }
}
