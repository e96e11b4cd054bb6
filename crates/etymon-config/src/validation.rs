// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as store URL schemes, positive limits and timeouts.

use crate::diagnostic::ConfigError;
use crate::model::{EtymonConfig, LimitSpec, StoreBackend};

/// URL schemes the Redis backend accepts.
const STORE_SCHEMES: &[&str] = &["redis://", "rediss://", "unix://", "redis+unix://"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &EtymonConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.store.backend == StoreBackend::Redis {
        let url = config.store.url.trim();
        if url.is_empty() {
            errors.push(ConfigError::Validation {
                message: "store.url must not be empty when store.backend = \"redis\"".to_string(),
            });
        } else if !STORE_SCHEMES.iter().any(|s| url.starts_with(s)) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "store.url `{url}` must start with one of: {}",
                    STORE_SCHEMES.join(", ")
                ),
            });
        }
    }

    if config.store.op_timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "store.op_timeout_ms must be greater than 0".to_string(),
        });
    }

    if config.store.connect_timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "store.connect_timeout_ms must be greater than 0".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    check_limit("limits.default", &config.limits.default, &mut errors);
    for (action, spec) in &config.limits.actions {
        if action.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "limits.actions keys must not be empty".to_string(),
            });
            continue;
        }
        if action.contains(':') || action.chars().any(char::is_whitespace) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "limits.actions.{action}: action names must not contain `:` or whitespace"
                ),
            });
        }
        check_limit(&format!("limits.actions.{action}"), spec, &mut errors);
    }

    if config.autocomplete.max_suggestions == 0 {
        errors.push(ConfigError::Validation {
            message: "autocomplete.max_suggestions must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_limit(path: &str, spec: &LimitSpec, errors: &mut Vec<ConfigError>) {
    if spec.limit <= 0 {
        errors.push(ConfigError::Validation {
            message: format!("{path}.limit must be positive, got {}", spec.limit),
        });
    }
    if spec.window_secs == 0 {
        errors.push(ConfigError::Validation {
            message: format!("{path}.window_secs must be at least 1"),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = EtymonConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn malformed_store_url_fails_validation() {
        let mut config = EtymonConfig::default();
        config.store.url = "http://localhost:6379".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "store.url"));
    }

    #[test]
    fn memory_backend_ignores_url() {
        let mut config = EtymonConfig::default();
        config.store.backend = StoreBackend::Memory;
        config.store.url = String::new();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let mut config = EtymonConfig::default();
        config.store.op_timeout_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "op_timeout_ms"));
    }

    #[test]
    fn non_positive_limits_fail_validation() {
        let mut config = EtymonConfig::default();
        config.limits.actions.insert(
            "export".to_string(),
            LimitSpec {
                limit: 0,
                window_secs: 0,
            },
        );
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "limits.actions.export.limit"));
        assert!(has_message(&errors, "limits.actions.export.window_secs"));
    }

    #[test]
    fn action_names_cannot_contain_separator() {
        let mut config = EtymonConfig::default();
        config.limits.actions.insert(
            "a:b".to_string(),
            LimitSpec {
                limit: 1,
                window_secs: 1,
            },
        );
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "must not contain"));
    }

    #[test]
    fn collects_every_error() {
        let mut config = EtymonConfig::default();
        config.storage.database_path = " ".to_string();
        config.autocomplete.max_suggestions = 0;
        config.gateway.host = "bad host!".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
