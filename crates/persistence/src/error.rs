// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use hive_auction_domain::{Auction, AuctionStatus, DomainError};

/// Errors that can occur during database operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// A database error occurred.
    DatabaseError(String),
    /// Database connection failed.
    DatabaseConnectionFailed(String),
    /// Database migration failed.
    MigrationFailed(String),
    /// Initialization error.
    InitializationError(String),
    /// Foreign key enforcement is not enabled.
    ForeignKeyEnforcementNotEnabled,
    /// A stored row could not be converted back into a domain value.
    CorruptRow {
        /// The table the row came from.
        table: String,
        /// Why the conversion failed.
        reason: String,
    },
    /// A timestamp could not be converted at the storage boundary.
    InvalidTimestamp(String),
    /// The requested row was not found.
    NotFound(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::DatabaseConnectionFailed(msg) => {
                write!(f, "Database connection failed: {msg}")
            }
            Self::MigrationFailed(msg) => write!(f, "Migration failed: {msg}"),
            Self::InitializationError(msg) => write!(f, "Initialization error: {msg}"),
            Self::ForeignKeyEnforcementNotEnabled => {
                write!(f, "Foreign key enforcement is not enabled")
            }
            Self::CorruptRow { table, reason } => {
                write!(f, "Corrupt row in table '{table}': {reason}")
            }
            Self::InvalidTimestamp(msg) => write!(f, "Invalid timestamp: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<diesel::result::Error> for PersistenceError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Self::NotFound("Record not found".to_string()),
            _ => Self::DatabaseError(err.to_string()),
        }
    }
}

impl From<diesel::ConnectionError> for PersistenceError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::DatabaseConnectionFailed(err.to_string())
    }
}

/// Errors returned by the auction store.
///
/// Conflicts are ordinary outcomes of the concurrency design, not
/// failures: a `VersionConflict` carries the fresh state so the caller
/// can re-validate and retry, and a `TransitionConflict` means another
/// trigger already applied the transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No auction with the given id exists.
    AuctionNotFound(i64),
    /// The auction changed since the caller's snapshot was taken.
    VersionConflict {
        /// The auction as currently committed.
        current: Box<Auction>,
        /// The current version counter.
        version: u64,
    },
    /// The auction was not in the expected status.
    TransitionConflict {
        /// The status the caller expected.
        expected: AuctionStatus,
        /// The status actually committed.
        actual: AuctionStatus,
    },
    /// A domain rule was violated at commit time.
    DomainViolation(DomainError),
    /// The underlying database failed.
    Persistence(PersistenceError),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuctionNotFound(id) => write!(f, "Auction {id} not found"),
            Self::VersionConflict { version, .. } => {
                write!(f, "Auction changed underneath (now at version {version})")
            }
            Self::TransitionConflict { expected, actual } => {
                write!(
                    f,
                    "Status transition conflict: expected '{expected}', found '{actual}'"
                )
            }
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::Persistence(err) => write!(f, "Persistence failure: {err}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}

impl From<PersistenceError> for StoreError {
    fn from(err: PersistenceError) -> Self {
        Self::Persistence(err)
    }
}
