// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for migrated lookup history.
//!
//! Provides a WAL-mode database with embedded migrations and a single-writer
//! concurrency model via `tokio-rusqlite`, plus the [`SqliteHistoryStore`]
//! sink the reconciler writes into.

pub mod database;
pub mod history;
pub mod migrations;

pub use database::Database;
pub use history::SqliteHistoryStore;
