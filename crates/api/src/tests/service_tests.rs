// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::ApiError;
use crate::request_response::{CreateAuctionRequest, GetAuctionResponse, PlaceBidResponse};
use crate::tests::helpers::{Harness, base_time, wait_until};
use hive_auction::BidPolicy;
use hive_auction_domain::{AuctionId, AuctionStatus, BidderId};
use std::time::Duration as StdDuration;
use time::Duration;

#[tokio::test]
async fn test_worked_bidding_example() {
    let harness: Harness = Harness::new(BidPolicy::default()).await;
    let auction = harness.create_default_auction().await;
    let id: AuctionId = AuctionId::new(auction.auction_id);

    // Bid 100 -> accepted, highest = 100
    let first: PlaceBidResponse = harness
        .service
        .place_bid(id, BidderId::new("s1"), 100, base_time() + Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(first.auction.current_highest_bid, 100);
    assert_eq!(first.leaderboard.minimum_next_bid, 110);

    // Bid 105 -> rejected BidTooLow, minimum is 110
    match harness
        .service
        .place_bid(id, BidderId::new("s2"), 105, base_time() + Duration::minutes(2))
        .await
    {
        Err(ApiError::BidTooLow {
            amount,
            current_highest_bid,
            minimum_next_bid,
        }) => {
            assert_eq!(amount, 105);
            assert_eq!(current_highest_bid, 100);
            assert_eq!(minimum_next_bid, 110);
        }
        other => panic!("Expected BidTooLow, got {other:?}"),
    }

    // Bid 110 -> accepted, highest = 110
    let second: PlaceBidResponse = harness
        .service
        .place_bid(id, BidderId::new("s2"), 110, base_time() + Duration::minutes(3))
        .await
        .unwrap();
    assert_eq!(second.auction.current_highest_bid, 110);

    // Past the end time every further bid is rejected and the auction
    // flips to finished with the 110 bidder as winner
    match harness
        .service
        .place_bid(id, BidderId::new("s3"), 120, base_time() + Duration::minutes(61))
        .await
    {
        Err(ApiError::AuctionEnded { .. }) => {}
        other => panic!("Expected AuctionEnded, got {other:?}"),
    }

    let fetched: GetAuctionResponse = harness
        .service
        .get_auction(id, base_time() + Duration::minutes(62))
        .await
        .unwrap();
    assert_eq!(fetched.auction.status, AuctionStatus::Finished);
    assert_eq!(fetched.leaderboard.current_leader.as_deref(), Some("s2"));

    // The winner and the host each get exactly one end-of-auction email
    // (both also received ordinary bid traffic, so match on subject)
    wait_until(|| {
        harness
            .mailer
            .delivered_to("s2@example.com")
            .iter()
            .any(|email| email.subject.starts_with("Auction Won"))
            && harness
                .mailer
                .delivered_to("host@example.com")
                .iter()
                .any(|email| email.subject.starts_with("Auction Ended"))
    })
    .await;
    tokio::time::sleep(StdDuration::from_millis(100)).await;

    let winner_mail = harness.mailer.delivered_to("s2@example.com");
    let won: Vec<_> = winner_mail
        .iter()
        .filter(|email| email.subject.starts_with("Auction Won"))
        .collect();
    assert_eq!(won.len(), 1);
    assert!(won[0].body.contains("110"));

    let host_mail = harness.mailer.delivered_to("host@example.com");
    let ended: Vec<_> = host_mail
        .iter()
        .filter(|email| email.subject.starts_with("Auction Ended"))
        .collect();
    assert_eq!(ended.len(), 1);
    assert!(ended[0].body.contains("s2@example.com"));
}

#[tokio::test]
async fn test_zero_bid_expiry_sends_one_no_bids_notice() {
    let harness: Harness = Harness::new(BidPolicy::default()).await;
    let auction = harness.create_default_auction().await;
    let id: AuctionId = AuctionId::new(auction.auction_id);

    // Several concurrent reads observe the crossed boundary
    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = harness.service.clone();
        handles.push(tokio::spawn(async move {
            service
                .get_auction(id, base_time() + Duration::minutes(61))
                .await
        }));
    }
    for handle in handles {
        let response: GetAuctionResponse = handle.await.unwrap().unwrap();
        assert_eq!(response.auction.status, AuctionStatus::Finished);
        assert_eq!(response.leaderboard.total_bids, 0);
        assert!(response.leaderboard.current_leader.is_none());
    }

    wait_until(|| !harness.mailer.delivered_to("host@example.com").is_empty()).await;
    tokio::time::sleep(StdDuration::from_millis(100)).await;

    let host_mail = harness.mailer.delivered_to("host@example.com");
    assert_eq!(host_mail.len(), 1);
    assert!(host_mail[0].body.contains("No bids"));
}

#[tokio::test]
async fn test_host_cannot_bid_on_own_auction() {
    let harness: Harness = Harness::new(BidPolicy::default()).await;
    let auction = harness.create_default_auction().await;
    let id: AuctionId = AuctionId::new(auction.auction_id);

    match harness
        .service
        .place_bid(id, BidderId::new("host-1"), 100, base_time() + Duration::minutes(1))
        .await
    {
        Err(ApiError::HostCannotBid) => {}
        other => panic!("Expected HostCannotBid, got {other:?}"),
    }
}

#[tokio::test]
async fn test_consecutive_bids_follow_policy() {
    let strict: Harness = Harness::new(BidPolicy::default()).await;
    let auction = strict.create_default_auction().await;
    let id: AuctionId = AuctionId::new(auction.auction_id);

    strict
        .service
        .place_bid(id, BidderId::new("s1"), 100, base_time() + Duration::minutes(1))
        .await
        .unwrap();
    match strict
        .service
        .place_bid(id, BidderId::new("s1"), 110, base_time() + Duration::minutes(2))
        .await
    {
        Err(ApiError::ConsecutiveBidderNotAllowed) => {}
        other => panic!("Expected ConsecutiveBidderNotAllowed, got {other:?}"),
    }

    let relaxed: Harness = Harness::new(BidPolicy::new(true, true)).await;
    let auction = relaxed.create_default_auction().await;
    let id: AuctionId = AuctionId::new(auction.auction_id);

    relaxed
        .service
        .place_bid(id, BidderId::new("s1"), 100, base_time() + Duration::minutes(1))
        .await
        .unwrap();
    let outbid: PlaceBidResponse = relaxed
        .service
        .place_bid(id, BidderId::new("s1"), 110, base_time() + Duration::minutes(2))
        .await
        .unwrap();
    assert_eq!(outbid.auction.current_highest_bid, 110);
}

#[tokio::test]
async fn test_unknown_auction_and_event() {
    let harness: Harness = Harness::new(BidPolicy::default()).await;

    match harness
        .service
        .place_bid(AuctionId::new(42), BidderId::new("s1"), 100, base_time())
        .await
    {
        Err(ApiError::NotFound { auction_id: 42 }) => {}
        other => panic!("Expected NotFound, got {other:?}"),
    }

    match harness
        .service
        .create_auction(
            CreateAuctionRequest {
                event_id: String::from("evt-unknown"),
                item_name: String::from("Stage banner"),
                item_description: String::from("Banner placement"),
                starting_bid: 100,
                bid_increment: 10,
                duration_minutes: 60,
            },
            base_time(),
        )
        .await
    {
        Err(ApiError::ResourceNotFound { resource_type, .. }) => {
            assert_eq!(resource_type, "Event");
        }
        other => panic!("Expected ResourceNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_pending_auctions_require_activation() {
    let harness: Harness = Harness::new(BidPolicy::new(false, false)).await;
    let auction = harness.create_default_auction().await;
    let id: AuctionId = AuctionId::new(auction.auction_id);
    assert_eq!(auction.status, AuctionStatus::Pending);

    match harness
        .service
        .place_bid(id, BidderId::new("s1"), 100, base_time() + Duration::minutes(1))
        .await
    {
        Err(ApiError::AuctionNotActive { status }) => assert_eq!(status, "pending"),
        other => panic!("Expected AuctionNotActive, got {other:?}"),
    }

    let activated = harness.service.activate_auction(id).await.unwrap();
    assert_eq!(activated.status, AuctionStatus::Active);

    harness
        .service
        .place_bid(id, BidderId::new("s1"), 100, base_time() + Duration::minutes(2))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_concurrent_equal_bids_admit_exactly_one() {
    let harness: Harness = Harness::new(BidPolicy::default()).await;
    let auction = harness.create_default_auction().await;
    let id: AuctionId = AuctionId::new(auction.auction_id);

    let mut handles = Vec::new();
    for n in 1..=2 {
        let service = harness.service.clone();
        handles.push(tokio::spawn(async move {
            service
                .place_bid(
                    id,
                    BidderId::new(&format!("s{n}")),
                    100,
                    base_time() + Duration::minutes(1),
                )
                .await
        }));
    }

    let mut accepted: usize = 0;
    let mut too_low: usize = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(ApiError::BidTooLow {
                current_highest_bid,
                minimum_next_bid,
                ..
            }) => {
                // The loser re-validated against the committed bid
                assert_eq!(current_highest_bid, 100);
                assert_eq!(minimum_next_bid, 110);
                too_low += 1;
            }
            Err(other) => panic!("Unexpected error: {other:?}"),
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(too_low, 1);

    let fetched: GetAuctionResponse = harness
        .service
        .get_auction(id, base_time() + Duration::minutes(2))
        .await
        .unwrap();
    assert_eq!(fetched.auction.total_bids, 1);
    assert_eq!(fetched.auction.current_highest_bid, 100);
}

#[tokio::test]
async fn test_bid_side_effects_reach_the_queue() {
    let harness: Harness = Harness::new(BidPolicy::default()).await;
    let auction = harness.create_default_auction().await;
    let id: AuctionId = AuctionId::new(auction.auction_id);

    harness
        .service
        .place_bid(id, BidderId::new("s1"), 100, base_time() + Duration::minutes(1))
        .await
        .unwrap();

    // Confirmation to the sponsor, alert to the host
    wait_until(|| harness.mailer.delivered().len() >= 2).await;
    let sponsor_mail = harness.mailer.delivered_to("s1@example.com");
    assert_eq!(sponsor_mail.len(), 1);
    assert!(sponsor_mail[0].subject.starts_with("Bid Confirmation"));

    let host_mail = harness.mailer.delivered_to("host@example.com");
    assert_eq!(host_mail.len(), 1);
    assert!(host_mail[0].subject.starts_with("New Bid"));

    // The delivery records land just after the transport calls return
    let mut status = harness.service.queue_status().await.unwrap();
    for _ in 0..200 {
        if status.delivered == 2 {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
        status = harness.service.queue_status().await.unwrap();
    }
    assert_eq!(status.delivered, 2);
    assert_eq!(status.failed, 0);
}

#[tokio::test]
async fn test_event_scoped_fetch_rejects_other_events() {
    let harness: Harness = Harness::new(BidPolicy::default()).await;
    let auction = harness.create_default_auction().await;
    let id: AuctionId = AuctionId::new(auction.auction_id);

    let scoped = harness
        .service
        .get_auction_for_event(
            &hive_auction_domain::EventId::new("evt-1"),
            id,
            base_time() + Duration::minutes(1),
        )
        .await
        .unwrap();
    assert_eq!(scoped.auction.auction_id, auction.auction_id);

    match harness
        .service
        .get_auction_for_event(
            &hive_auction_domain::EventId::new("evt-2"),
            id,
            base_time() + Duration::minutes(1),
        )
        .await
    {
        Err(ApiError::NotFound { .. }) => {}
        other => panic!("Expected NotFound, got {other:?}"),
    }
}
