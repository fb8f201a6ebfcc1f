// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Lifecycle helpers for end-of-auction handling.
//!
//! The transition itself is applied by the store under compare-and-swap;
//! these functions answer the questions every trigger point asks: has
//! the boundary been crossed, and who won.

use hive_auction_domain::{Auction, AuctionStatus, Bid};
use time::OffsetDateTime;

/// Returns true if the auction is active but its end time has passed.
///
/// Any caller observing this may attempt the finish transition; the
/// store guarantees only one attempt applies it.
#[must_use]
pub fn is_expired(auction: &Auction, now: OffsetDateTime) -> bool {
    auction.status == AuctionStatus::Active && auction.has_ended(now)
}

/// Determines the winning bid of an auction, or `None` with no bids.
///
/// The increment invariant makes the maximum amount unique; equal
/// amounts (never present in a valid history) break toward the earlier
/// timestamp so the function stays total.
#[must_use]
pub fn determine_winner(auction: &Auction) -> Option<&Bid> {
    auction.bids.iter().min_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.placed_at.cmp(&b.placed_at))
    })
}
