// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Durable storage for outbound notification jobs.
//!
//! The notification layer owns job semantics (kinds, retry schedule);
//! this repository only guarantees that jobs survive restarts and that
//! status changes are recorded. Job kind and status travel as strings
//! so the persistence layer stays agnostic of notification vocabulary.

use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::data_models::{NewJob, QueueCounts, StoredJob};
use crate::error::PersistenceError;
use crate::{Database, mutations, queries};
use hive_auction_domain::format_timestamp;

fn timestamp(now: OffsetDateTime) -> Result<String, PersistenceError> {
    format_timestamp(now).map_err(|e| PersistenceError::InvalidTimestamp(e.to_string()))
}

/// Repository for notification job rows.
#[derive(Clone)]
pub struct JobStore {
    db: Arc<Mutex<Database>>,
}

impl JobStore {
    /// Creates a repository over an existing database.
    #[must_use]
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    /// Persists a new job in the `queued` state.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert(
        &self,
        job: NewJob,
        now: OffsetDateTime,
    ) -> Result<StoredJob, PersistenceError> {
        let now_text: String = timestamp(now)?;
        let mut db = self.db.lock().await;
        let job_id: i64 = mutations::insert_job(db.conn(), &job, &now_text)?;
        queries::get_job(db.conn(), job_id)
    }

    /// Records the outcome of a delivery attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn record_attempt(
        &self,
        job_id: i64,
        attempts: i32,
        status: &str,
        last_error: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<(), PersistenceError> {
        let now_text: String = timestamp(now)?;
        let mut db = self.db.lock().await;
        mutations::update_job(db.conn(), job_id, attempts, status, last_error, &now_text)
    }

    /// Loads all jobs still waiting for delivery, oldest first.
    ///
    /// Used at startup so queued work survives a process restart.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn load_queued(&self) -> Result<Vec<StoredJob>, PersistenceError> {
        let mut db = self.db.lock().await;
        queries::load_queued_jobs(db.conn())
    }

    /// Returns job counts by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the counts cannot be read.
    pub async fn counts(&self) -> Result<QueueCounts, PersistenceError> {
        let mut db = self.db.lock().await;
        queries::count_jobs(db.conn())
    }

    /// Returns the most recently failed jobs for operator inspection.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn recent_failures(&self, limit: i64) -> Result<Vec<StoredJob>, PersistenceError> {
        let mut db = self.db.lock().await;
        queries::recent_failed_jobs(db.conn(), limit)
    }

    /// Moves every terminally failed job back to `queued` and returns
    /// the re-queued jobs so they can be scheduled immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the update or reload fails.
    pub async fn requeue_failed(
        &self,
        now: OffsetDateTime,
    ) -> Result<Vec<StoredJob>, PersistenceError> {
        let now_text: String = timestamp(now)?;
        let mut db = self.db.lock().await;
        let mut failed: Vec<StoredJob> = queries::load_failed_jobs(db.conn())?;
        if failed.is_empty() {
            return Ok(Vec::new());
        }
        mutations::requeue_failed_jobs(db.conn(), &now_text)?;

        for job in &mut failed {
            job.status = crate::data_models::JOB_STATUS_QUEUED.to_string();
            job.attempts = 0;
            job.updated_at.clone_from(&now_text);
        }
        Ok(failed)
    }
}
