// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Request and response types for the service boundary.
//!
//! Timestamps cross this boundary as ISO 8601 strings; identifiers as
//! their raw representations.

use hive_auction_domain::{Auction, AuctionStatus, format_timestamp};
use hive_auction_notify::LeaderboardData;
use hive_auction_persistence::StoredJob;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

fn timestamp_text(timestamp: OffsetDateTime) -> String {
    format_timestamp(timestamp).unwrap_or_else(|_| String::from("unknown"))
}

/// Request to register event/host metadata.
///
/// A stand-in for the external event catalog feeding the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterEventRequest {
    /// The event id.
    pub event_id: String,
    /// Display title used in notification text.
    pub title: String,
    /// The bidder identity of the event host.
    pub host_id: String,
    /// Host display name.
    pub host_name: String,
    /// Host contact address.
    pub host_email: String,
}

/// Request to create an auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuctionRequest {
    /// The owning event.
    pub event_id: String,
    /// Display name of the sponsored item.
    pub item_name: String,
    /// Description shown to sponsors.
    pub item_description: String,
    /// Minimum amount for the first bid.
    pub starting_bid: i64,
    /// Minimum amount by which a new bid must exceed the current highest.
    pub bid_increment: i64,
    /// Auction duration in minutes.
    pub duration_minutes: i64,
}

/// Request to place a bid. The auction id travels in the URL path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBidRequest {
    /// The verified bidder identity.
    pub bidder_id: String,
    /// The offered amount.
    pub amount: i64,
}

/// An auction snapshot as it crosses the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionInfo {
    /// The auction id.
    pub auction_id: i64,
    /// The owning event.
    pub event_id: String,
    /// Display name of the sponsored item.
    pub item_name: String,
    /// Description shown to sponsors.
    pub item_description: String,
    /// Minimum amount for the first bid.
    pub starting_bid: i64,
    /// Minimum bid-over-bid increment.
    pub bid_increment: i64,
    /// Auction duration in minutes.
    pub duration_minutes: i64,
    /// Current lifecycle status.
    pub status: AuctionStatus,
    /// The current highest amount, 0 with no bids.
    pub current_highest_bid: i64,
    /// Total committed bids.
    pub total_bids: usize,
    /// Creation time (ISO 8601).
    pub created_at: String,
    /// When bidding closes (ISO 8601).
    pub end_time: String,
}

impl From<&Auction> for AuctionInfo {
    fn from(auction: &Auction) -> Self {
        Self {
            auction_id: auction.id.value(),
            event_id: auction.event_id.value().to_string(),
            item_name: auction.terms.item_name.clone(),
            item_description: auction.terms.item_description.clone(),
            starting_bid: auction.terms.starting_bid,
            bid_increment: auction.terms.bid_increment,
            duration_minutes: auction.terms.duration_minutes,
            status: auction.status,
            current_highest_bid: auction.current_highest_bid,
            total_bids: auction.bids.len(),
            created_at: timestamp_text(auction.created_at),
            end_time: timestamp_text(auction.end_time()),
        }
    }
}

/// Response to a successful bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBidResponse {
    /// The auction after the bid committed.
    pub auction: AuctionInfo,
    /// The recomputed leaderboard.
    pub leaderboard: LeaderboardData,
    /// Server time at commit (ISO 8601).
    pub server_time: String,
    /// A success message.
    pub message: String,
}

/// Response to an auction fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetAuctionResponse {
    /// The auction snapshot, including derived status.
    pub auction: AuctionInfo,
    /// The current leaderboard.
    pub leaderboard: LeaderboardData,
    /// Server time at fetch (ISO 8601).
    pub server_time: String,
    /// When bidding closes (ISO 8601).
    pub end_time: String,
}

/// A failed job as shown to operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedJobInfo {
    /// The job id.
    pub job_id: i64,
    /// Destination address.
    pub recipient: String,
    /// Job kind tag.
    pub kind: String,
    /// Attempts made before giving up.
    pub attempts: i32,
    /// The final delivery error.
    pub last_error: Option<String>,
}

impl From<&StoredJob> for FailedJobInfo {
    fn from(job: &StoredJob) -> Self {
        Self {
            job_id: job.id,
            recipient: job.recipient.clone(),
            kind: job.kind.clone(),
            attempts: job.attempts,
            last_error: job.last_error.clone(),
        }
    }
}

/// Operator-facing queue status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatusResponse {
    /// Jobs waiting for delivery.
    pub queued: i64,
    /// Jobs delivered successfully.
    pub delivered: i64,
    /// Jobs that exhausted their attempts.
    pub failed: i64,
    /// The most recently failed jobs.
    pub recent_failures: Vec<FailedJobInfo>,
}

/// Result of an operator retry of failed jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryFailedResponse {
    /// How many jobs were re-queued.
    pub retried: usize,
    /// A human-readable summary.
    pub message: String,
}
