// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bid admission validation.
//!
//! This is the pure half of the admission engine: given a snapshot of
//! an auction, decide whether a bid would be acceptable. The impure
//! half (loading the snapshot, committing through the store, retrying
//! on version conflicts) lives in the service layer. Because the store
//! re-checks every invariant at commit time, this function can run on
//! a stale snapshot without risking a bad commit; it exists to produce
//! precise rejections before any write is attempted.

use crate::error::CoreError;
use crate::policy::BidPolicy;
use hive_auction_domain::{Auction, AuctionStatus, BidderId, DomainError};
use time::OffsetDateTime;

/// Validates a prospective bid against an auction snapshot.
///
/// Checks are ordered so the caller can surface the most meaningful
/// rejection: lifecycle first, then identity rules, then amount.
///
/// # Arguments
///
/// * `auction` - The auction snapshot to validate against
/// * `bidder` - The verified bidder identity
/// * `amount` - The offered amount
/// * `host` - The owning event's host identity
/// * `now` - The server's current time
/// * `policy` - The deployment bidding policy
///
/// # Errors
///
/// Returns a domain violation if:
/// - The auction is not active
/// - The auction's end time has passed
/// - The bidder is the event host
/// - The bidder holds the preceding bid and policy forbids consecutive bids
/// - The amount is not positive or below the minimum next bid
pub fn validate_bid(
    auction: &Auction,
    bidder: &BidderId,
    amount: i64,
    host: &BidderId,
    now: OffsetDateTime,
    policy: &BidPolicy,
) -> Result<(), CoreError> {
    if auction.status != AuctionStatus::Active {
        return Err(CoreError::DomainViolation(DomainError::AuctionNotActive {
            status: auction.status,
        }));
    }

    if auction.has_ended(now) {
        return Err(CoreError::DomainViolation(DomainError::AuctionEnded {
            end_time: auction.end_time(),
        }));
    }

    if bidder == host {
        return Err(CoreError::DomainViolation(DomainError::HostCannotBid));
    }

    if !policy.allow_consecutive
        && let Some(last) = auction.last_bidder()
        && last == bidder
    {
        return Err(CoreError::DomainViolation(DomainError::ConsecutiveBid {
            bidder: bidder.value().to_string(),
        }));
    }

    if amount <= 0 {
        return Err(CoreError::DomainViolation(DomainError::InvalidBidAmount {
            amount,
        }));
    }

    let minimum: i64 = auction.minimum_next_bid();
    if amount < minimum {
        return Err(CoreError::DomainViolation(DomainError::BidBelowMinimum {
            amount,
            minimum,
            current_highest: auction.current_highest_bid,
        }));
    }

    Ok(())
}
