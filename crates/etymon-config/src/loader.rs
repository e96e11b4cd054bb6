// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./etymon.toml` > `~/.config/etymon/etymon.toml`
//! > `/etc/etymon/etymon.toml`, with environment variable overrides via the
//! `ETYMON_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::EtymonConfig;

/// Sections that may be addressed through `ETYMON_<SECTION>_<KEY>` variables.
///
/// `[limits]` is nested (`limits.actions.<name>.limit`) and is only read
/// from TOML files.
const ENV_SECTIONS: &[&str] = &[
    "service",
    "store",
    "storage",
    "gateway",
    "autocomplete",
    "prometheus",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/etymon/etymon.toml` (system-wide)
/// 3. `~/.config/etymon/etymon.toml` (user XDG config)
/// 4. `./etymon.toml` (local directory)
/// 5. `ETYMON_*` environment variables
pub fn load_config() -> Result<EtymonConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<EtymonConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EtymonConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<EtymonConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EtymonConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(EtymonConfig::default()))
        .merge(Toml::file("/etc/etymon/etymon.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("etymon/etymon.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("etymon.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `ETYMON_STORE_OP_TIMEOUT_MS` must map to
/// `store.op_timeout_ms`, not `store.op.timeout.ms`.
fn env_provider() -> Env {
    Env::prefixed("ETYMON_")
        .map(|key| env_key_to_path(&key.as_str().to_ascii_lowercase()).into())
}

/// Map a lowercased, prefix-stripped env key onto a dotted config path.
///
/// figment hands `map` the key in its original case, so callers lower it
/// first.
pub(crate) fn env_key_to_path(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
