// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the Hive Auction engine.
//!
//! This crate provides the durable auction store and the notification
//! job repository, built on Diesel over `SQLite`.
//!
//! ## Shape
//!
//! - [`Database`] owns the `SQLite` connection, runs embedded
//!   migrations at open, and verifies foreign-key enforcement.
//! - [`AuctionStore`] is the single source of truth for auction state:
//!   an in-memory registry serialized per auction, mirrored to the
//!   database and recovered from it at startup.
//! - [`JobStore`] persists outbound notification jobs so the mail
//!   queue survives restarts.
//!
//! ## Testing
//!
//! In-memory databases get a unique shared-cache name per open via an
//! atomic counter, so tests are isolated without time-based collisions.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod jobs;
mod mutations;
mod queries;
mod store;

#[cfg(test)]
mod tests;

pub use data_models::{
    JOB_STATUS_DELIVERED, JOB_STATUS_FAILED, JOB_STATUS_QUEUED, NewJob, QueueCounts, StoredJob,
};
pub use error::{PersistenceError, StoreError};
pub use jobs::JobStore;
pub use store::{AuctionStore, VersionedAuction};

/// Atomic counter for generating unique in-memory database names.
///
/// This ensures deterministic test isolation by eliminating time-based
/// collisions. Each call to `new_in_memory()` receives a unique
/// sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Owner of the `SQLite` connection.
///
/// Shared behind `Arc<tokio::sync::Mutex<_>>` between the auction
/// store and the job repository; each holds the lock only for the
/// duration of a single query or transaction.
pub struct Database {
    conn: SqliteConnection,
}

impl Database {
    /// Opens a unique in-memory database and runs migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let db_name: String = format!("hive_auction_mem_{db_id}");
        let shared_memory_url: String = format!("file:{db_name}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::initialize_database(&shared_memory_url)?;
        backend::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Opens a file-based database, enabling WAL, and runs migrations.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::initialize_database(path_str)?;
        backend::enable_wal_mode(&mut conn)?;
        backend::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Returns the underlying connection for query modules.
    pub(crate) fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}
