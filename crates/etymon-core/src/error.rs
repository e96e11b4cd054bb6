// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the etymon ephemeral-state subsystem.

use thiserror::Error;

/// The primary error type used across the store traits and every component
/// built on them.
#[derive(Debug, Error)]
pub enum EtymonError {
    /// Configuration errors (malformed store address, store unreachable at startup).
    #[error("configuration error: {0}")]
    Config(String),

    /// Ephemeral store failure during a single operation (connection reset,
    /// protocol error, wrong value type).
    #[error("store error: {message}")]
    Store {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A store operation did not complete before its deadline.
    #[error("store operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Durable storage errors (database open, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A pending history record could not be decoded.
    #[error("codec error: {message}")]
    Codec { message: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EtymonError {
    /// Build a [`EtymonError::Store`] from a message alone.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            source: None,
        }
    }

    /// Whether the failure is scoped to a single operation and may succeed
    /// when the caller tries again later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store { .. } | Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn store_and_timeout_are_transient() {
        assert!(EtymonError::store("connection reset").is_transient());
        assert!(
            EtymonError::Timeout {
                duration: Duration::from_millis(250)
            }
            .is_transient()
        );
    }

    #[test]
    fn config_and_storage_are_not_transient() {
        assert!(!EtymonError::Config("bad url".into()).is_transient());
        assert!(
            !EtymonError::Storage {
                source: Box::new(std::io::Error::other("disk full")),
            }
            .is_transient()
        );
        assert!(!EtymonError::Codec { message: "eof".into() }.is_transient());
    }

    #[test]
    fn display_includes_detail() {
        let err = EtymonError::Timeout {
            duration: Duration::from_millis(500),
        };
        assert_eq!(err.to_string(), "store operation timed out after 500ms");

        let err = EtymonError::store("WRONGTYPE");
        assert_eq!(err.to_string(), "store error: WRONGTYPE");
    }
}
