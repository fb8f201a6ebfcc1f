// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::live::{
    LiveUpdate, Topic, TopicBroadcaster, UpdateKind, auction_summary, leaderboard_update,
};
use hive_auction::calculate_leaderboard;
use hive_auction_domain::{
    Auction, AuctionId, AuctionStatus, AuctionTerms, Bid, BidderId, EventId,
};
use time::{Duration, OffsetDateTime};

fn base_time() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH + Duration::days(20_000)
}

fn test_auction() -> Auction {
    let mut auction: Auction = Auction::new(
        AuctionId::new(7),
        EventId::new("evt-1"),
        AuctionTerms::new(
            String::from("Stage banner"),
            String::from("Banner placement above the main stage"),
            100,
            10,
            60,
        ),
        AuctionStatus::Active,
        base_time(),
    );
    auction
        .append_bid(Bid::new(
            BidderId::new("s1"),
            100,
            base_time() + Duration::minutes(1),
        ))
        .unwrap();
    auction
}

#[tokio::test]
async fn test_subscribe_then_publish_delivers() {
    let broadcaster: TopicBroadcaster = TopicBroadcaster::new();
    let topic: Topic = Topic::Auction(AuctionId::new(7));
    let mut rx = broadcaster.subscribe(topic.clone()).await;

    let update: LiveUpdate = LiveUpdate::Connected {
        timestamp: String::from("t0"),
    };
    let delivered: usize = broadcaster.publish(&topic, &update).await;
    assert_eq!(delivered, 1);

    match rx.try_recv() {
        Ok(LiveUpdate::Connected { timestamp }) => assert_eq!(timestamp, "t0"),
        other => panic!("Expected Connected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_topics_are_isolated() {
    let broadcaster: TopicBroadcaster = TopicBroadcaster::new();
    let busy: Topic = Topic::Auction(AuctionId::new(1));
    let quiet: Topic = Topic::Auction(AuctionId::new(2));

    let mut busy_rx = broadcaster.subscribe(busy.clone()).await;
    let mut quiet_rx = broadcaster.subscribe(quiet).await;

    broadcaster
        .publish(
            &busy,
            &LiveUpdate::Connected {
                timestamp: String::from("t0"),
            },
        )
        .await;

    assert!(busy_rx.try_recv().is_ok());
    assert!(quiet_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_publish_without_subscribers_is_dropped() {
    let broadcaster: TopicBroadcaster = TopicBroadcaster::new();
    let topic: Topic = Topic::Event(EventId::new("evt-1"));

    let delivered: usize = broadcaster
        .publish(
            &topic,
            &LiveUpdate::Connected {
                timestamp: String::from("t0"),
            },
        )
        .await;
    assert_eq!(delivered, 0);
    assert_eq!(broadcaster.subscriber_count(&topic).await, 0);
}

#[tokio::test]
async fn test_dropping_receiver_unsubscribes() {
    let broadcaster: TopicBroadcaster = TopicBroadcaster::new();
    let topic: Topic = Topic::Bidder(BidderId::new("s1"));

    let rx = broadcaster.subscribe(topic.clone()).await;
    assert_eq!(broadcaster.subscriber_count(&topic).await, 1);

    drop(rx);
    assert_eq!(broadcaster.subscriber_count(&topic).await, 0);

    // Next publish observes the empty topic and prunes it
    let delivered: usize = broadcaster
        .publish(
            &topic,
            &LiveUpdate::Connected {
                timestamp: String::from("t0"),
            },
        )
        .await;
    assert_eq!(delivered, 0);
}

#[tokio::test]
async fn test_multiple_subscribers_all_receive() {
    let broadcaster: TopicBroadcaster = TopicBroadcaster::new();
    let topic: Topic = Topic::Auction(AuctionId::new(7));
    let mut rx1 = broadcaster.subscribe(topic.clone()).await;
    let mut rx2 = broadcaster.subscribe(topic.clone()).await;

    broadcaster
        .publish(
            &topic,
            &LiveUpdate::Connected {
                timestamp: String::from("t0"),
            },
        )
        .await;

    assert!(matches!(rx1.try_recv(), Ok(LiveUpdate::Connected { .. })));
    assert!(matches!(rx2.try_recv(), Ok(LiveUpdate::Connected { .. })));
}

#[test]
fn test_leaderboard_update_payload() {
    let auction: Auction = test_auction();
    let board = calculate_leaderboard(&auction);
    let update: LiveUpdate =
        leaderboard_update(&auction, &board, UpdateKind::NewBid, base_time());

    match update {
        LiveUpdate::LeaderboardUpdate {
            auction_id,
            event_id,
            status,
            update_kind,
            leaderboard,
            ..
        } => {
            assert_eq!(auction_id, 7);
            assert_eq!(event_id, "evt-1");
            assert_eq!(status, AuctionStatus::Active);
            assert_eq!(update_kind, UpdateKind::NewBid);
            assert_eq!(leaderboard.current_highest_bid, 100);
            assert_eq!(leaderboard.minimum_next_bid, 110);
            assert_eq!(leaderboard.top_bids.len(), 1);
            assert_eq!(leaderboard.current_leader.as_deref(), Some("s1"));
        }
        other => panic!("Expected LeaderboardUpdate, got {other:?}"),
    }
}

#[test]
fn test_auction_summary_payload() {
    let auction: Auction = test_auction();
    let update: LiveUpdate = auction_summary(&auction, UpdateKind::AuctionEnded, base_time());

    match update {
        LiveUpdate::AuctionSummary {
            item_name,
            current_highest_bid,
            total_bids,
            update_kind,
            ..
        } => {
            assert_eq!(item_name, "Stage banner");
            assert_eq!(current_highest_bid, 100);
            assert_eq!(total_bids, 1);
            assert_eq!(update_kind, UpdateKind::AuctionEnded);
        }
        other => panic!("Expected AuctionSummary, got {other:?}"),
    }
}

#[test]
fn test_update_serialization_round_trip() {
    let auction: Auction = test_auction();
    let board = calculate_leaderboard(&auction);
    let update: LiveUpdate =
        leaderboard_update(&auction, &board, UpdateKind::ManualRefresh, base_time());

    let json: String = serde_json::to_string(&update).unwrap();
    assert!(json.contains("\"type\":\"leaderboard_update\""));
    assert!(json.contains("\"update_kind\":\"manual_refresh\""));

    let decoded: LiveUpdate = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, update);
}
