// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Leaderboard computation.
//!
//! The leaderboard is derived from an auction's bid history on demand
//! and never cached across mutations. The computation is deterministic:
//! the same bid history always yields the same board.

use hive_auction_domain::{Auction, Bid, BidderId};
use std::collections::HashSet;
use time::OffsetDateTime;

/// Maximum number of ranked bids shown on a leaderboard.
pub const TOP_BIDS_LIMIT: usize = 5;

/// One entry on the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedBid {
    /// 1-based rank; rank 1 is the winning bid.
    pub rank: u32,
    /// The bid amount.
    pub amount: i64,
    /// The sponsor who placed the bid.
    pub bidder: BidderId,
    /// When the bid was committed.
    pub placed_at: OffsetDateTime,
    /// True only for rank 1.
    pub is_winning: bool,
}

/// Ranked standings derived from an auction's bid history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaderboard {
    /// Up to [`TOP_BIDS_LIMIT`] bids, highest amount first.
    pub top_bids: Vec<RankedBid>,
    /// Total committed bids.
    pub total_bids: usize,
    /// Number of distinct bidders across the whole history.
    pub unique_bidders: usize,
    /// The bidder currently holding the highest bid, if any.
    pub current_leader: Option<BidderId>,
    /// The current highest amount, 0 with no bids.
    pub current_highest_bid: i64,
    /// The minimum acceptable next bid.
    pub minimum_next_bid: i64,
}

/// Computes the leaderboard for an auction.
///
/// Ordering is amount descending; equal amounts (impossible in a valid
/// history, but the function stays total) break toward the earlier
/// timestamp. With no bids every field is zero or empty and the
/// minimum next bid equals the starting bid.
#[must_use]
pub fn calculate_leaderboard(auction: &Auction) -> Leaderboard {
    if auction.bids.is_empty() {
        return Leaderboard {
            top_bids: Vec::new(),
            total_bids: 0,
            unique_bidders: 0,
            current_leader: None,
            current_highest_bid: 0,
            minimum_next_bid: auction.terms.starting_bid,
        };
    }

    let mut sorted: Vec<&Bid> = auction.bids.iter().collect();
    sorted.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.placed_at.cmp(&b.placed_at))
    });

    let top_bids: Vec<RankedBid> = sorted
        .iter()
        .take(TOP_BIDS_LIMIT)
        .enumerate()
        .map(|(index, bid)| RankedBid {
            rank: u32::try_from(index + 1).unwrap_or(u32::MAX),
            amount: bid.amount,
            bidder: bid.bidder.clone(),
            placed_at: bid.placed_at,
            is_winning: index == 0,
        })
        .collect();

    let unique_bidders: usize = auction
        .bids
        .iter()
        .map(|bid| &bid.bidder)
        .collect::<HashSet<_>>()
        .len();

    Leaderboard {
        current_leader: sorted.first().map(|bid| bid.bidder.clone()),
        top_bids,
        total_bids: auction.bids.len(),
        unique_bidders,
        current_highest_bid: auction.current_highest_bid,
        minimum_next_bid: auction.minimum_next_bid(),
    }
}
