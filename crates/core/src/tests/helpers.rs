// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use hive_auction_domain::{Auction, AuctionId, AuctionStatus, AuctionTerms, Bid, BidderId, EventId};
use time::{Duration, OffsetDateTime};

/// A fixed reference time so tests are deterministic.
pub fn base_time() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH + Duration::days(20_000)
}

pub fn host() -> BidderId {
    BidderId::new("host-1")
}

pub fn create_test_terms(starting_bid: i64, bid_increment: i64) -> AuctionTerms {
    AuctionTerms::new(
        String::from("Stage banner"),
        String::from("Banner placement above the main stage"),
        starting_bid,
        bid_increment,
        60,
    )
}

pub fn create_test_auction(starting_bid: i64, bid_increment: i64) -> Auction {
    Auction::new(
        AuctionId::new(1),
        EventId::new("evt-1"),
        create_test_terms(starting_bid, bid_increment),
        AuctionStatus::Active,
        base_time(),
    )
}

/// Appends bids at one-minute intervals, panicking on any rejection.
pub fn append_bids(auction: &mut Auction, bids: &[(&str, i64)]) {
    for (index, (bidder, amount)) in bids.iter().enumerate() {
        let placed_at: OffsetDateTime =
            base_time() + Duration::minutes(i64::try_from(index).unwrap() + 1);
        let bid: Bid = Bid::new(BidderId::new(bidder), *amount, placed_at);
        auction.append_bid(bid).unwrap();
    }
}
