// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`HistorySink`] trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::params;
use rusqlite::types::Type;
use tracing::debug;

use etymon_core::{EtymonError, HistoryEntry, HistorySink};

use crate::database::{Database, map_tr_err};

/// Durable lookup history backed by the `lookup_history` table.
#[derive(Debug)]
pub struct SqliteHistoryStore {
    db: Database,
}

impl SqliteHistoryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Every durable entry for `user_id`, ordered by sequence number.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<HistoryEntry>, EtymonError> {
        let user_id = user_id.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<Vec<HistoryEntry>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT seq, recorded_at, payload FROM lookup_history
                     WHERE user_id = ?1 ORDER BY seq ASC",
                )?;
                let rows = stmt.query_map(params![user_id], |row| {
                    let seq: i64 = row.get(0)?;
                    let recorded_at: String = row.get(1)?;
                    let payload: String = row.get(2)?;
                    Ok(HistoryEntry {
                        seq: u64::try_from(seq).map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(e))
                        })?,
                        recorded_at: DateTime::parse_from_rfc3339(&recorded_at)
                            .map_err(|e| {
                                rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e))
                            })?
                            .with_timezone(&Utc),
                        payload: serde_json::from_str(&payload).map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e))
                        })?,
                    })
                })?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)
    }

    /// Number of distinct users with durable history.
    pub async fn user_count(&self) -> Result<u64, EtymonError> {
        self.db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COUNT(DISTINCT user_id) FROM lookup_history",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .map_err(map_tr_err)
            .map(|n| n.max(0) as u64)
    }
}

#[async_trait]
impl HistorySink for SqliteHistoryStore {
    async fn persist(&self, user_id: &str, entries: &[HistoryEntry]) -> Result<u64, EtymonError> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut rows = Vec::with_capacity(entries.len());
        for entry in entries {
            let seq = i64::try_from(entry.seq).map_err(|_| EtymonError::Codec {
                message: format!("sequence number {} out of range", entry.seq),
            })?;
            let payload = serde_json::to_string(&entry.payload).map_err(|e| EtymonError::Codec {
                message: format!("failed to encode payload of entry {}: {e}", entry.seq),
            })?;
            rows.push((seq, entry.recorded_at.to_rfc3339(), payload));
        }

        let user = user_id.to_string();
        let inserted = self
            .db
            .connection()
            .call(move |conn| -> Result<u64, rusqlite::Error> {
                let tx = conn.transaction()?;
                let mut inserted = 0u64;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO lookup_history (user_id, seq, recorded_at, payload)
                         VALUES (?1, ?2, ?3, ?4)
                         ON CONFLICT (user_id, seq) DO NOTHING",
                    )?;
                    for (seq, recorded_at, payload) in &rows {
                        inserted += stmt.execute(params![user, seq, recorded_at, payload])? as u64;
                    }
                }
                tx.commit()?;
                Ok(inserted)
            })
            .await
            .map_err(map_tr_err)?;

        debug!(
            user_id,
            batch = entries.len(),
            inserted,
            "history batch persisted"
        );
        Ok(inserted)
    }

    async fn count_for_user(&self, user_id: &str) -> Result<u64, EtymonError> {
        let user_id = user_id.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<i64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COUNT(*) FROM lookup_history WHERE user_id = ?1",
                    params![user_id],
                    |row| row.get(0),
                )
            })
            .await
            .map_err(map_tr_err)
            .map(|n| n.max(0) as u64)
    }
}
