// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The durable outbound mail queue.
//!
//! Jobs are persisted before they are scheduled, so enqueue-then-crash
//! never loses a notification; at startup [`MailQueue::start`] reloads
//! every job still marked `queued`. A bounded pool of workers pops jobs
//! by priority (then enqueue order) and hands them to the injected
//! [`Mailer`]. Failures retry with exponential backoff and jitter up to
//! an attempt cap, after which the job is terminally failed and only an
//! operator can re-queue it.
//!
//! Delivery is at-least-once: a crash between a successful send and
//! recording it redelivers the message on restart.

use crate::compose::MailContent;
use crate::job::JobKind;
use hive_auction_persistence::{
    JOB_STATUS_DELIVERED, JOB_STATUS_FAILED, JOB_STATUS_QUEUED, JobStore, NewJob,
    PersistenceError, QueueCounts, StoredJob,
};
use rand::RngExt;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, error, info, warn};

/// Errors a mail transport can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailerError {
    /// The transport could not deliver the message; retryable.
    #[error("Transport failure: {0}")]
    Transport(String),
}

/// A message handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    /// Destination address.
    pub recipient: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// A pluggable mail transport.
///
/// Implementations may block (SMTP clients usually do); the queue
/// invokes them on the blocking thread pool.
pub trait Mailer: Send + Sync {
    /// Delivers one message.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails; the queue will retry.
    fn send(&self, email: &OutboundEmail) -> Result<(), MailerError>;
}

/// A transport that logs instead of sending.
///
/// The default for development and tests; deployments inject a real
/// transport.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: &OutboundEmail) -> Result<(), MailerError> {
        info!(
            recipient = %email.recipient,
            subject = %email.subject,
            "Outbound mail (log transport)"
        );
        Ok(())
    }
}

/// Tuning knobs for the mail queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Number of delivery workers.
    pub workers: usize,
    /// Attempts before a job is terminally failed.
    pub max_attempts: i32,
    /// Base delay for the first retry; doubles per attempt.
    pub backoff_base: Duration,
    /// Upper bound on any single retry delay.
    pub backoff_cap: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            max_attempts: 3,
            backoff_base: Duration::from_secs(2),
            backoff_cap: Duration::from_secs(60),
        }
    }
}

/// Operator-facing queue snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStatus {
    /// Job counts by status.
    pub counts: QueueCounts,
    /// The most recently failed jobs.
    pub recent_failures: Vec<StoredJob>,
}

/// Heap entry ordering: priority first, then enqueue order.
struct PendingJob {
    job: StoredJob,
    seq: u64,
}

impl PartialEq for PendingJob {
    fn eq(&self, other: &Self) -> bool {
        self.job.priority == other.job.priority && self.seq == other.seq
    }
}

impl Eq for PendingJob {}

impl PartialOrd for PendingJob {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingJob {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // BinaryHeap pops the greatest entry: higher priority wins,
        // then the earlier sequence number.
        self.job
            .priority
            .cmp(&other.job.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// The durable outbound notification queue.
pub struct MailQueue {
    jobs: JobStore,
    mailer: Arc<dyn Mailer>,
    config: QueueConfig,
    heap: Mutex<BinaryHeap<PendingJob>>,
    seq: AtomicU64,
    notify: Notify,
    closed: AtomicBool,
}

impl MailQueue {
    /// Creates a queue over a job repository and transport.
    ///
    /// Workers are not running until [`MailQueue::start`] is called.
    #[must_use]
    pub fn new(jobs: JobStore, mailer: Arc<dyn Mailer>, config: QueueConfig) -> Arc<Self> {
        Arc::new(Self {
            jobs,
            mailer,
            config,
            heap: Mutex::new(BinaryHeap::new()),
            seq: AtomicU64::new(0),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
        })
    }

    /// Recovers persisted queued jobs and starts the worker pool.
    ///
    /// Returns the number of jobs recovered from the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the recovery query fails.
    pub async fn start(self: &Arc<Self>) -> Result<usize, PersistenceError> {
        let recovered: Vec<StoredJob> = self.jobs.load_queued().await?;
        let count: usize = recovered.len();
        for job in recovered {
            self.push(job).await;
        }

        for worker_id in 0..self.config.workers {
            let queue: Arc<Self> = Arc::clone(self);
            tokio::spawn(queue.worker_loop(worker_id));
        }

        info!(
            workers = self.config.workers,
            recovered = count,
            "Mail queue started"
        );
        Ok(count)
    }

    /// Persists and schedules a notification job.
    ///
    /// The job is durably recorded before this returns; delivery is
    /// asynchronous and never blocks the caller beyond the insert.
    ///
    /// # Errors
    ///
    /// Returns an error if the job cannot be persisted.
    pub async fn enqueue(
        &self,
        kind: JobKind,
        recipient: &str,
        content: MailContent,
    ) -> Result<StoredJob, PersistenceError> {
        let job: StoredJob = self
            .jobs
            .insert(
                NewJob {
                    recipient: recipient.to_string(),
                    subject: content.subject,
                    body: content.body,
                    kind: kind.as_str().to_string(),
                    priority: kind.default_priority(),
                },
                OffsetDateTime::now_utc(),
            )
            .await?;

        debug!(job_id = job.id, kind = %kind, recipient, "Queued notification job");
        self.push(job.clone()).await;
        Ok(job)
    }

    /// Returns counts and recent failures for operator inspection.
    ///
    /// # Errors
    ///
    /// Returns an error if the queries fail.
    pub async fn status(&self) -> Result<QueueStatus, PersistenceError> {
        Ok(QueueStatus {
            counts: self.jobs.counts().await?,
            recent_failures: self.jobs.recent_failures(5).await?,
        })
    }

    /// Re-queues every terminally failed job with a fresh attempt
    /// budget. Returns the number of jobs re-queued.
    ///
    /// # Errors
    ///
    /// Returns an error if the re-queue fails.
    pub async fn retry_failed(&self) -> Result<usize, PersistenceError> {
        let requeued: Vec<StoredJob> = self.jobs.requeue_failed(OffsetDateTime::now_utc()).await?;
        let count: usize = requeued.len();
        for job in requeued {
            self.push(job).await;
        }
        if count > 0 {
            info!(count, "Re-queued failed notification jobs");
        }
        Ok(count)
    }

    /// Stops the worker pool. In-flight deliveries finish; nothing new
    /// is picked up.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
        info!("Mail queue shutting down");
    }

    async fn push(&self, job: StoredJob) {
        let seq: u64 = self.seq.fetch_add(1, Ordering::SeqCst);
        self.heap.lock().await.push(PendingJob { job, seq });
        self.notify.notify_one();
    }

    async fn worker_loop(self: Arc<Self>, worker_id: usize) {
        debug!(worker_id, "Notification worker started");
        loop {
            if self.closed.load(Ordering::SeqCst) {
                break;
            }

            let next: Option<PendingJob> = {
                let mut heap = self.heap.lock().await;
                let popped = heap.pop();
                // Wake a sibling if there is more work than one of us
                if !heap.is_empty() {
                    self.notify.notify_one();
                }
                popped
            };

            match next {
                Some(pending) => Arc::clone(&self).process(pending.job).await,
                None => self.notify.notified().await,
            }
        }
        debug!(worker_id, "Notification worker stopped");
    }

    async fn process(self: Arc<Self>, job: StoredJob) {
        let email: OutboundEmail = OutboundEmail {
            recipient: job.recipient.clone(),
            subject: job.subject.clone(),
            body: job.body.clone(),
        };
        let mailer: Arc<dyn Mailer> = Arc::clone(&self.mailer);

        let outcome = tokio::task::spawn_blocking(move || mailer.send(&email)).await;
        let send_result: Result<(), MailerError> = match outcome {
            Ok(result) => result,
            Err(join_error) => Err(MailerError::Transport(format!(
                "send task failed: {join_error}"
            ))),
        };

        let attempts: i32 = job.attempts + 1;
        let now: OffsetDateTime = OffsetDateTime::now_utc();

        match send_result {
            Ok(()) => {
                if let Err(e) = self
                    .jobs
                    .record_attempt(job.id, attempts, JOB_STATUS_DELIVERED, None, now)
                    .await
                {
                    error!(job_id = job.id, error = %e, "Failed to record delivery");
                }
                info!(
                    job_id = job.id,
                    recipient = %job.recipient,
                    kind = %job.kind,
                    "Delivered notification"
                );
            }
            Err(send_error) => {
                if attempts >= self.config.max_attempts {
                    if let Err(e) = self
                        .jobs
                        .record_attempt(
                            job.id,
                            attempts,
                            JOB_STATUS_FAILED,
                            Some(&send_error.to_string()),
                            now,
                        )
                        .await
                    {
                        error!(job_id = job.id, error = %e, "Failed to record terminal failure");
                    }
                    warn!(
                        job_id = job.id,
                        attempts,
                        error = %send_error,
                        "Notification permanently failed; operator retry required"
                    );
                } else {
                    if let Err(e) = self
                        .jobs
                        .record_attempt(
                            job.id,
                            attempts,
                            JOB_STATUS_QUEUED,
                            Some(&send_error.to_string()),
                            now,
                        )
                        .await
                    {
                        error!(job_id = job.id, error = %e, "Failed to record attempt");
                    }

                    let delay: Duration = self.backoff_delay(attempts);
                    warn!(
                        job_id = job.id,
                        attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %send_error,
                        "Delivery failed, scheduling retry"
                    );

                    let mut retry_job: StoredJob = job;
                    retry_job.attempts = attempts;
                    let queue: Arc<Self> = Arc::clone(&self);
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        if !queue.closed.load(Ordering::SeqCst) {
                            queue.push(retry_job).await;
                        }
                    });
                }
            }
        }
    }

    fn backoff_delay(&self, attempts: i32) -> Duration {
        let exponent: u32 = u32::try_from(attempts.saturating_sub(1)).unwrap_or(0).min(16);
        let scaled: Duration = self
            .config
            .backoff_base
            .checked_mul(2_u32.saturating_pow(exponent))
            .unwrap_or(self.config.backoff_cap);
        let capped: Duration = scaled.min(self.config.backoff_cap);
        let jitter_ms: u64 = rand::rng().random_range(0..250);
        capped + Duration::from_millis(jitter_ms)
    }
}
