// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Plain data carriers crossing the persistence boundary.

/// Status string for a job waiting to be delivered.
pub const JOB_STATUS_QUEUED: &str = "queued";
/// Status string for a successfully delivered job.
pub const JOB_STATUS_DELIVERED: &str = "delivered";
/// Status string for a job that exhausted its attempts.
pub const JOB_STATUS_FAILED: &str = "failed";

/// A notification job to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    /// Destination address.
    pub recipient: String,
    /// Message subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
    /// Job kind tag (owned by the notification layer).
    pub kind: String,
    /// Delivery priority; higher is processed first.
    pub priority: i32,
}

/// A notification job as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredJob {
    /// Store-assigned job id.
    pub id: i64,
    /// Destination address.
    pub recipient: String,
    /// Message subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
    /// Job kind tag.
    pub kind: String,
    /// Delivery priority; higher is processed first.
    pub priority: i32,
    /// Delivery attempts made so far.
    pub attempts: i32,
    /// Current status string (`queued`, `delivered`, or `failed`).
    pub status: String,
    /// The most recent delivery error, if any.
    pub last_error: Option<String>,
    /// Creation timestamp (ISO 8601).
    pub created_at: String,
    /// Last update timestamp (ISO 8601).
    pub updated_at: String,
}

/// Job counts by status for operator inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueCounts {
    /// Jobs waiting for delivery.
    pub queued: i64,
    /// Jobs delivered successfully.
    pub delivered: i64,
    /// Jobs that exhausted their attempts.
    pub failed: i64,
}
