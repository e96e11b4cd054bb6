// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::{Path, PathBuf};

use etymon_config::model::StorageConfig;
use etymon_core::EtymonError;
use tracing::{debug, info};

use crate::migrations::run_migrations;

/// Convert a tokio-rusqlite error into EtymonError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> EtymonError {
    EtymonError::Storage {
        source: Box::new(e),
    }
}

fn storage_err(e: impl std::error::Error + Send + Sync + 'static) -> EtymonError {
    EtymonError::Storage {
        source: Box::new(e),
    }
}

/// Handle on the durable history database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
    path: PathBuf,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.path).finish()
    }
}

impl Database {
    /// Open the database described by `config`.
    pub async fn open_with_config(config: &StorageConfig) -> Result<Self, EtymonError> {
        Self::open(Path::new(&config.database_path), config.wal_mode).await
    }

    /// Open (creating if needed) the database at `path` and bring its
    /// schema up to date.
    ///
    /// Migrations run on a blocking thread with a short-lived synchronous
    /// connection before the long-lived async connection is handed out.
    pub async fn open(path: &Path, wal_mode: bool) -> Result<Self, EtymonError> {
        let path = path.to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(storage_err)?;
        }

        let prep_path = path.clone();
        tokio::task::spawn_blocking(move || prepare(&prep_path, wal_mode))
            .await
            .map_err(|e| EtymonError::Internal(format!("database setup task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(storage_err)?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "PRAGMA busy_timeout = 5000;
                 PRAGMA synchronous = NORMAL;",
            )
        })
        .await
        .map_err(map_tr_err)?;

        info!(path = %path.display(), wal_mode, "history database opened");
        Ok(Self { conn, path })
    }

    /// The underlying single-writer connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cheap liveness probe.
    pub async fn ping(&self) -> Result<(), EtymonError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint the WAL into the main file before shutdown.
    pub async fn checkpoint(&self) -> Result<(), EtymonError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!(path = %self.path.display(), "wal checkpoint complete");
        Ok(())
    }
}

fn prepare(path: &Path, wal_mode: bool) -> Result<(), EtymonError> {
    let mut conn = rusqlite::Connection::open(path).map_err(storage_err)?;
    if wal_mode {
        // journal_mode returns the resulting mode as a row.
        let mode: String = conn
            .query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))
            .map_err(storage_err)?;
        debug!(mode, "journal mode set");
    }
    run_migrations(&mut conn)
}
