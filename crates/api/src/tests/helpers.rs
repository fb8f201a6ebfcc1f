// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::directory::InMemoryDirectory;
use crate::request_response::{AuctionInfo, CreateAuctionRequest};
use crate::service::AuctionService;
use hive_auction::BidPolicy;
use hive_auction_domain::{BidderContact, BidderId, EventDetails, EventId};
use hive_auction_notify::{
    MailQueue, Mailer, MailerError, OutboundEmail, QueueConfig, TopicBroadcaster,
};
use hive_auction_persistence::{AuctionStore, Database, JobStore};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;
use time::{Duration, OffsetDateTime};

/// A fixed reference time so tests are deterministic.
pub fn base_time() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH + Duration::days(20_000)
}

/// Records every delivered message.
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
}

impl RecordingMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn delivered(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn delivered_to(&self, recipient: &str) -> Vec<OutboundEmail> {
        self.delivered()
            .into_iter()
            .filter(|email| email.recipient == recipient)
            .collect()
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, email: &OutboundEmail) -> Result<(), MailerError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// A fully wired service over in-memory collaborators.
pub struct Harness {
    pub service: AuctionService,
    pub mailer: Arc<RecordingMailer>,
    #[allow(dead_code)]
    pub directory: Arc<InMemoryDirectory>,
}

impl Harness {
    pub async fn new(policy: BidPolicy) -> Self {
        let db = Arc::new(tokio::sync::Mutex::new(Database::new_in_memory().unwrap()));
        let store: Arc<AuctionStore> = Arc::new(AuctionStore::load(db.clone()).await.unwrap());

        let directory: Arc<InMemoryDirectory> = Arc::new(InMemoryDirectory::new());
        directory.register_event(EventDetails::new(
            EventId::new("evt-1"),
            String::from("Launch Gala"),
            BidderId::new("host-1"),
            String::from("Harper Host"),
            String::from("host@example.com"),
        ));
        for n in 1..=3 {
            directory.register_bidder(BidderContact::new(
                BidderId::new(&format!("s{n}")),
                format!("Sponsor {n}"),
                format!("s{n}@example.com"),
            ));
        }

        let mailer: Arc<RecordingMailer> = RecordingMailer::new();
        let queue: Arc<MailQueue> = MailQueue::new(
            JobStore::new(db),
            mailer.clone(),
            QueueConfig {
                workers: 2,
                max_attempts: 3,
                backoff_base: StdDuration::from_millis(10),
                backoff_cap: StdDuration::from_millis(50),
            },
        );
        queue.start().await.unwrap();

        let service: AuctionService = AuctionService::new(
            store,
            directory.clone(),
            directory.clone(),
            Arc::new(TopicBroadcaster::new()),
            queue,
            policy,
        );

        Self {
            service,
            mailer,
            directory,
        }
    }

    /// Creates the standard test auction: starting bid 100, increment
    /// 10, 60 minutes, owned by `evt-1`.
    pub async fn create_default_auction(&self) -> AuctionInfo {
        self.service
            .create_auction(
                CreateAuctionRequest {
                    event_id: String::from("evt-1"),
                    item_name: String::from("Stage banner"),
                    item_description: String::from("Banner placement above the main stage"),
                    starting_bid: 100,
                    bid_increment: 10,
                    duration_minutes: 60,
                },
                base_time(),
            )
            .await
            .unwrap()
    }
}

/// Polls a condition for up to two seconds.
pub async fn wait_until<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }
    panic!("Condition not met within 2 seconds");
}
