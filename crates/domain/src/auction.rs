// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The auction aggregate and its append-only bid history.
//!
//! The aggregate owns every invariant that must hold for a committed
//! bid: the auction is active, the end time has not passed, and the
//! amount clears the minimum. Callers validate early for friendly
//! errors, but the aggregate re-checks on every append so no path can
//! corrupt the bid history.

use crate::error::DomainError;
use crate::status::AuctionStatus;
use crate::types::{AuctionId, BidderId, EventId};
use time::{Duration, OffsetDateTime};

/// Economic and descriptive terms of an auction. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuctionTerms {
    /// Display name of the sponsored item.
    pub item_name: String,
    /// Description shown to sponsors.
    pub item_description: String,
    /// Minimum amount for the first bid. Always positive.
    pub starting_bid: i64,
    /// Minimum amount by which a new bid must exceed the current highest.
    pub bid_increment: i64,
    /// Auction duration in minutes, counted from `created_at`.
    pub duration_minutes: i64,
}

impl AuctionTerms {
    /// Creates auction terms.
    ///
    /// Terms are not validated here; see [`crate::validate_terms`].
    #[must_use]
    pub const fn new(
        item_name: String,
        item_description: String,
        starting_bid: i64,
        bid_increment: i64,
        duration_minutes: i64,
    ) -> Self {
        Self {
            item_name,
            item_description,
            starting_bid,
            bid_increment,
            duration_minutes,
        }
    }
}

/// A single committed bid. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bid {
    /// The sponsor who placed the bid.
    pub bidder: BidderId,
    /// The offered amount in whole currency units.
    pub amount: i64,
    /// Server-assigned commit timestamp, monotonic per auction.
    pub placed_at: OffsetDateTime,
}

impl Bid {
    /// Creates a bid.
    #[must_use]
    pub const fn new(bidder: BidderId, amount: i64, placed_at: OffsetDateTime) -> Self {
        Self {
            bidder,
            amount,
            placed_at,
        }
    }
}

/// A timed auction for one sponsored item, owned by an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auction {
    /// Store-assigned identity.
    pub id: AuctionId,
    /// The owning event.
    pub event_id: EventId,
    /// Immutable economic terms.
    pub terms: AuctionTerms,
    /// Current lifecycle status.
    pub status: AuctionStatus,
    /// Highest committed amount, 0 before the first bid.
    pub current_highest_bid: i64,
    /// Append-only bid history in commit order.
    pub bids: Vec<Bid>,
    /// Creation time; the end time is derived from it.
    pub created_at: OffsetDateTime,
}

impl Auction {
    /// Creates an auction with no bids.
    #[must_use]
    pub const fn new(
        id: AuctionId,
        event_id: EventId,
        terms: AuctionTerms,
        status: AuctionStatus,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            event_id,
            terms,
            status,
            current_highest_bid: 0,
            bids: Vec::new(),
            created_at,
        }
    }

    /// Returns the moment bidding closes: `created_at + duration_minutes`.
    #[must_use]
    pub fn end_time(&self) -> OffsetDateTime {
        self.created_at + Duration::minutes(self.terms.duration_minutes)
    }

    /// Returns true once the end time has been reached.
    #[must_use]
    pub fn has_ended(&self, now: OffsetDateTime) -> bool {
        now >= self.end_time()
    }

    /// Returns the minimum acceptable next bid.
    ///
    /// With no bids this is the starting bid; afterwards it is
    /// `max(starting_bid, current_highest_bid + bid_increment)`.
    #[must_use]
    pub fn minimum_next_bid(&self) -> i64 {
        if self.bids.is_empty() {
            self.terms.starting_bid
        } else {
            self.terms
                .starting_bid
                .max(self.current_highest_bid + self.terms.bid_increment)
        }
    }

    /// Returns the bidder holding the most recent bid, if any.
    #[must_use]
    pub fn last_bidder(&self) -> Option<&BidderId> {
        self.bids.last().map(|bid| &bid.bidder)
    }

    /// Returns the highest committed bid, if any.
    ///
    /// The increment invariant makes the maximum unique; ties cannot
    /// occur in a valid history.
    #[must_use]
    pub fn highest_bid(&self) -> Option<&Bid> {
        self.bids.iter().max_by_key(|bid| bid.amount)
    }

    /// Appends a bid, enforcing every commit-time invariant.
    ///
    /// On success the bid is recorded and `current_highest_bid` is
    /// updated; on failure nothing changes.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The auction is not active
    /// - The bid's timestamp is at or past the end time
    /// - The amount is not positive
    /// - The amount is below the minimum acceptable next bid
    pub fn append_bid(&mut self, bid: Bid) -> Result<(), DomainError> {
        if self.status != AuctionStatus::Active {
            return Err(DomainError::AuctionNotActive {
                status: self.status,
            });
        }

        if bid.placed_at >= self.end_time() {
            return Err(DomainError::AuctionEnded {
                end_time: self.end_time(),
            });
        }

        if bid.amount <= 0 {
            return Err(DomainError::InvalidBidAmount { amount: bid.amount });
        }

        let minimum: i64 = self.minimum_next_bid();
        if bid.amount < minimum {
            return Err(DomainError::BidBelowMinimum {
                amount: bid.amount,
                minimum,
                current_highest: self.current_highest_bid,
            });
        }

        self.current_highest_bid = bid.amount;
        self.bids.push(bid);
        Ok(())
    }
}
