// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live state streaming to watching clients.
//!
//! Updates are informational, never authoritative: they mirror state
//! the store has already committed, and a client can always fetch the
//! canonical snapshot over HTTP. Subscriptions are keyed by topic
//! (auction, event, or bidder); each topic gets its own broadcast
//! channel, so a busy auction never fans out to watchers of a quiet
//! one. Dropping the receiver unsubscribes; a slow receiver lags and
//! drops old updates rather than applying backpressure.

use hive_auction::Leaderboard;
use hive_auction_domain::{
    Auction, AuctionId, AuctionStatus, BidderId, EventId, format_timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::OffsetDateTime;
use tokio::sync::{RwLock, broadcast};
use tracing::debug;

/// Maximum number of updates buffered per topic.
/// If a subscriber cannot keep up, older updates are dropped.
const TOPIC_BUFFER_SIZE: usize = 100;

/// A subscription key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// All updates about one auction.
    Auction(AuctionId),
    /// Summaries of every auction under one event.
    Event(EventId),
    /// Updates addressed to one bidder.
    Bidder(BidderId),
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auction(id) => write!(f, "auction_{id}"),
            Self::Event(id) => write!(f, "event_{id}"),
            Self::Bidder(id) => write!(f, "bidder_{id}"),
        }
    }
}

/// Why a leaderboard update was pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    /// A bid was committed.
    NewBid,
    /// The auction finished.
    AuctionEnded,
    /// First push after a client connected.
    InitialLoad,
    /// A client asked for a fresh snapshot.
    ManualRefresh,
}

/// One ranked bid as it crosses the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedBidData {
    /// 1-based rank.
    pub rank: u32,
    /// The bid amount.
    pub amount: i64,
    /// The sponsor who placed the bid.
    pub bidder_id: String,
    /// Commit timestamp (ISO 8601).
    pub timestamp: String,
    /// True only for rank 1.
    pub is_winning: bool,
}

/// A leaderboard as it crosses the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardData {
    /// Ranked top bids, highest first.
    pub top_bids: Vec<RankedBidData>,
    /// Total committed bids.
    pub total_bids: usize,
    /// Number of distinct bidders.
    pub unique_bidders: usize,
    /// The current leader, if any.
    pub current_leader: Option<String>,
    /// The current highest amount.
    pub current_highest_bid: i64,
    /// The minimum acceptable next bid.
    pub minimum_next_bid: i64,
}

impl From<&Leaderboard> for LeaderboardData {
    fn from(board: &Leaderboard) -> Self {
        Self {
            top_bids: board
                .top_bids
                .iter()
                .map(|bid| RankedBidData {
                    rank: bid.rank,
                    amount: bid.amount,
                    bidder_id: bid.bidder.value().to_string(),
                    timestamp: format_timestamp(bid.placed_at)
                        .unwrap_or_else(|_| String::from("unknown")),
                    is_winning: bid.is_winning,
                })
                .collect(),
            total_bids: board.total_bids,
            unique_bidders: board.unique_bidders,
            current_leader: board
                .current_leader
                .as_ref()
                .map(|bidder| bidder.value().to_string()),
            current_highest_bid: board.current_highest_bid,
            minimum_next_bid: board.minimum_next_bid,
        }
    }
}

/// Live update payloads.
///
/// These mirror committed state changes and are purely informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveUpdate {
    /// Full leaderboard push to an auction's watchers.
    LeaderboardUpdate {
        /// The auction.
        auction_id: i64,
        /// The owning event.
        event_id: String,
        /// Current auction status.
        status: AuctionStatus,
        /// Why this update was pushed.
        update_kind: UpdateKind,
        /// The recomputed leaderboard.
        leaderboard: LeaderboardData,
        /// Server time at push (ISO 8601).
        server_time: String,
        /// When bidding closes (ISO 8601).
        end_time: String,
    },
    /// Lighter summary pushed to the parent event's watchers.
    AuctionSummary {
        /// The auction.
        auction_id: i64,
        /// The owning event.
        event_id: String,
        /// Display name of the item.
        item_name: String,
        /// Current auction status.
        status: AuctionStatus,
        /// The current highest amount.
        current_highest_bid: i64,
        /// Total committed bids.
        total_bids: usize,
        /// Why this update was pushed.
        update_kind: UpdateKind,
        /// Server time at push (ISO 8601).
        server_time: String,
    },
    /// Announcement of a newly committed bid.
    NewBid {
        /// The auction.
        auction_id: i64,
        /// The committed amount.
        amount: i64,
        /// The sponsor who placed it.
        bidder_id: String,
        /// Commit timestamp (ISO 8601).
        timestamp: String,
        /// True if this bid took the lead (always true under the
        /// increment invariant).
        is_new_leader: bool,
    },
    /// Connection confirmation (sent on initial connect).
    Connected {
        /// Server timestamp (ISO 8601).
        timestamp: String,
    },
}

/// Per-topic broadcaster for live updates.
///
/// A lightweight registry of `tokio::sync::broadcast` channels, one per
/// topic, created on first subscription and pruned once the last
/// subscriber is gone.
pub struct TopicBroadcaster {
    topics: RwLock<HashMap<Topic, broadcast::Sender<LiveUpdate>>>,
}

impl TopicBroadcaster {
    /// Creates an empty broadcaster.
    #[must_use]
    pub fn new() -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribes to a topic, creating its channel if needed.
    ///
    /// Returns a receiver of all future updates on the topic. Dropping
    /// the receiver is the unsubscribe operation; updates published
    /// before subscription are not replayed.
    pub async fn subscribe(&self, topic: Topic) -> broadcast::Receiver<LiveUpdate> {
        let mut topics = self.topics.write().await;
        topics
            .entry(topic)
            .or_insert_with(|| broadcast::channel(TOPIC_BUFFER_SIZE).0)
            .subscribe()
    }

    /// Publishes an update to a topic's current subscribers.
    ///
    /// Non-blocking. Returns the number of subscribers that received
    /// the update; a topic nobody watches silently drops it.
    pub async fn publish(&self, topic: &Topic, update: &LiveUpdate) -> usize {
        let delivered: usize = {
            let topics = self.topics.read().await;
            match topics.get(topic) {
                Some(sender) => sender.send(update.clone()).unwrap_or(0),
                None => 0,
            }
        };

        if delivered == 0 {
            debug!(topic = %topic, "No receivers for live update");
            self.prune(topic).await;
        } else {
            debug!(topic = %topic, receivers = delivered, "Broadcast live update");
        }
        delivered
    }

    /// Returns the current subscriber count for a topic.
    pub async fn subscriber_count(&self, topic: &Topic) -> usize {
        let topics = self.topics.read().await;
        topics
            .get(topic)
            .map_or(0, tokio::sync::broadcast::Sender::receiver_count)
    }

    /// Removes a topic's channel if the last subscriber is gone.
    async fn prune(&self, topic: &Topic) {
        let mut topics = self.topics.write().await;
        if let Some(sender) = topics.get(topic)
            && sender.receiver_count() == 0
        {
            topics.remove(topic);
        }
    }
}

impl Default for TopicBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the full leaderboard update for an auction topic.
#[must_use]
pub fn leaderboard_update(
    auction: &Auction,
    board: &Leaderboard,
    kind: UpdateKind,
    now: OffsetDateTime,
) -> LiveUpdate {
    LiveUpdate::LeaderboardUpdate {
        auction_id: auction.id.value(),
        event_id: auction.event_id.value().to_string(),
        status: auction.status,
        update_kind: kind,
        leaderboard: LeaderboardData::from(board),
        server_time: format_timestamp(now).unwrap_or_else(|_| String::from("unknown")),
        end_time: format_timestamp(auction.end_time())
            .unwrap_or_else(|_| String::from("unknown")),
    }
}

/// Builds the lighter summary for the parent event topic.
#[must_use]
pub fn auction_summary(auction: &Auction, kind: UpdateKind, now: OffsetDateTime) -> LiveUpdate {
    LiveUpdate::AuctionSummary {
        auction_id: auction.id.value(),
        event_id: auction.event_id.value().to_string(),
        item_name: auction.terms.item_name.clone(),
        status: auction.status,
        current_highest_bid: auction.current_highest_bid,
        total_bids: auction.bids.len(),
        update_kind: kind,
        server_time: format_timestamp(now).unwrap_or_else(|_| String::from("unknown")),
    }
}
