// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The auction service: orchestration over the store, the pure core,
//! and notification fan-out.
//!
//! Admission control flow for a bid:
//!
//! 1. Load a versioned snapshot.
//! 2. Validate against it (pure, no locks held).
//! 3. Commit through the store with the snapshot's version; one
//!    re-validate-and-retry on a version conflict bounds contention.
//! 4. Fan out asynchronously. Side effects after the commit are
//!    best-effort and never roll back the bid.
//!
//! Lifecycle transitions are level-triggered: both the bid path and
//! every read path call [`AuctionService::finalize_if_expired`], and
//! the store's compare-and-swap guarantees the end-of-auction batch is
//! emitted exactly once.

use std::sync::Arc;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::directory::{BidderDirectory, EventDirectory};
use crate::error::{ApiError, translate_core_error, translate_domain_error, translate_store_error};
use crate::request_response::{
    AuctionInfo, CreateAuctionRequest, FailedJobInfo, GetAuctionResponse, PlaceBidResponse,
    QueueStatusResponse, RetryFailedResponse,
};
use hive_auction::{BidPolicy, calculate_leaderboard, determine_winner, is_expired, validate_bid};
use hive_auction_domain::{
    Auction, AuctionId, AuctionStatus, AuctionTerms, Bid, BidderId, EventDetails, EventId,
    format_timestamp, validate_terms,
};
use hive_auction_notify::{
    JobKind, LiveUpdate, MailQueue, Topic, TopicBroadcaster, UpdateKind, auction_ended_no_bids,
    auction_ended_with_winner, auction_summary, auction_won, bid_confirmation, leaderboard_update,
    new_bid_host_notification,
};
use hive_auction_persistence::{AuctionStore, StoreError, VersionedAuction};

fn timestamp_text(timestamp: OffsetDateTime) -> String {
    format_timestamp(timestamp).unwrap_or_else(|_| String::from("unknown"))
}

/// The single authorized path into the auction engine.
///
/// Cheap to clone; all state lives behind shared handles.
#[derive(Clone)]
pub struct AuctionService {
    store: Arc<AuctionStore>,
    events: Arc<dyn EventDirectory>,
    bidders: Arc<dyn BidderDirectory>,
    broadcaster: Arc<TopicBroadcaster>,
    mail: Arc<MailQueue>,
    policy: BidPolicy,
}

impl AuctionService {
    /// Wires the service over its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<AuctionStore>,
        events: Arc<dyn EventDirectory>,
        bidders: Arc<dyn BidderDirectory>,
        broadcaster: Arc<TopicBroadcaster>,
        mail: Arc<MailQueue>,
        policy: BidPolicy,
    ) -> Self {
        Self {
            store,
            events,
            bidders,
            broadcaster,
            mail,
            policy,
        }
    }

    /// Returns the live broadcaster for transport-level subscriptions.
    #[must_use]
    pub const fn broadcaster(&self) -> &Arc<TopicBroadcaster> {
        &self.broadcaster
    }

    /// Creates an auction for an event.
    ///
    /// The initial status follows policy: active immediately, or
    /// pending until explicitly activated.
    ///
    /// # Errors
    ///
    /// Returns an error if the event is unknown, the terms are
    /// invalid, or the store rejects the insert.
    pub async fn create_auction(
        &self,
        request: CreateAuctionRequest,
        now: OffsetDateTime,
    ) -> Result<AuctionInfo, ApiError> {
        let event_id: EventId = EventId::new(&request.event_id);
        let event: EventDetails =
            self.events
                .event(&event_id)
                .ok_or_else(|| ApiError::ResourceNotFound {
                    resource_type: String::from("Event"),
                    message: format!("Event '{}' is not registered", request.event_id),
                })?;

        let terms: AuctionTerms = AuctionTerms::new(
            request.item_name,
            request.item_description,
            request.starting_bid,
            request.bid_increment,
            request.duration_minutes,
        );
        validate_terms(&terms).map_err(translate_domain_error)?;

        let initial_status: AuctionStatus = if self.policy.activate_on_create {
            AuctionStatus::Active
        } else {
            AuctionStatus::Pending
        };

        let created: VersionedAuction = self
            .store
            .create_auction(event.id, terms, initial_status, now)
            .await
            .map_err(translate_store_error)?;

        info!(
            auction_id = created.auction.id.value(),
            event_id = %request.event_id,
            status = %initial_status,
            "Auction created"
        );
        Ok(AuctionInfo::from(&created.auction))
    }

    /// Opens a pending auction for bidding.
    ///
    /// # Errors
    ///
    /// Returns an error if the auction does not exist or is not
    /// pending.
    pub async fn activate_auction(&self, auction_id: AuctionId) -> Result<AuctionInfo, ApiError> {
        let activated: VersionedAuction = self
            .store
            .transition_status(auction_id, AuctionStatus::Pending, AuctionStatus::Active)
            .await
            .map_err(translate_store_error)?;
        Ok(AuctionInfo::from(&activated.auction))
    }

    /// Fetches an auction with its leaderboard.
    ///
    /// This read path is also a lifecycle trigger point: an active
    /// auction past its end time is finished here before the response
    /// is built, so clients never see a stale `active`.
    ///
    /// # Errors
    ///
    /// Returns an error if the auction does not exist or the store
    /// fails.
    pub async fn get_auction(
        &self,
        auction_id: AuctionId,
        now: OffsetDateTime,
    ) -> Result<GetAuctionResponse, ApiError> {
        let mut snapshot: VersionedAuction = self
            .store
            .get(auction_id)
            .await
            .map_err(translate_store_error)?;

        if is_expired(&snapshot.auction, now) {
            snapshot = match self.finalize_if_expired(&snapshot.auction, now).await? {
                Some(finished) => finished,
                // Another trigger won the race; reread the final state
                None => self
                    .store
                    .get(auction_id)
                    .await
                    .map_err(translate_store_error)?,
            };
        }

        let board = calculate_leaderboard(&snapshot.auction);
        Ok(GetAuctionResponse {
            end_time: timestamp_text(snapshot.auction.end_time()),
            leaderboard: (&board).into(),
            auction: AuctionInfo::from(&snapshot.auction),
            server_time: timestamp_text(now),
        })
    }

    /// Fetches an auction scoped to its owning event.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the auction does not exist or belongs to
    /// a different event.
    pub async fn get_auction_for_event(
        &self,
        event_id: &EventId,
        auction_id: AuctionId,
        now: OffsetDateTime,
    ) -> Result<GetAuctionResponse, ApiError> {
        let response: GetAuctionResponse = self.get_auction(auction_id, now).await?;
        if response.auction.event_id != event_id.value() {
            return Err(ApiError::NotFound {
                auction_id: auction_id.value(),
            });
        }
        Ok(response)
    }

    /// Lists every auction.
    pub async fn list_auctions(&self) -> Vec<AuctionInfo> {
        self.store
            .list()
            .await
            .iter()
            .map(|snapshot| AuctionInfo::from(&snapshot.auction))
            .collect()
    }

    /// Places a bid.
    ///
    /// # Errors
    ///
    /// Returns the full rejection taxonomy: `NotFound`,
    /// `AuctionNotActive`, `AuctionEnded`, `HostCannotBid`,
    /// `ConsecutiveBidderNotAllowed`, `BidTooLow` (with the current
    /// highest and minimum next bid), or `StoreConflict` after the
    /// bounded retry.
    pub async fn place_bid(
        &self,
        auction_id: AuctionId,
        bidder_id: BidderId,
        amount: i64,
        now: OffsetDateTime,
    ) -> Result<PlaceBidResponse, ApiError> {
        let snapshot: VersionedAuction = self
            .store
            .get(auction_id)
            .await
            .map_err(translate_store_error)?;

        let event: EventDetails = self
            .events
            .event(&snapshot.auction.event_id)
            .ok_or_else(|| ApiError::Internal {
                message: format!(
                    "Event '{}' metadata missing for auction {}",
                    snapshot.auction.event_id,
                    auction_id.value()
                ),
            })?;

        // Expiry observed on the bid path finishes the auction before
        // rejecting, turning the boundary race into a deterministic
        // rejection.
        if is_expired(&snapshot.auction, now) {
            self.finalize_if_expired(&snapshot.auction, now).await?;
            return Err(ApiError::AuctionEnded {
                end_time: timestamp_text(snapshot.auction.end_time()),
            });
        }

        validate_bid(
            &snapshot.auction,
            &bidder_id,
            amount,
            &event.host,
            now,
            &self.policy,
        )
        .map_err(translate_core_error)?;

        let bid: Bid = Bid::new(bidder_id, amount, now);
        let committed: VersionedAuction = match self
            .store
            .append_bid(auction_id, bid.clone(), snapshot.version)
            .await
        {
            Ok(committed) => committed,
            Err(StoreError::VersionConflict { current, version }) => {
                // A concurrent bid moved the floor; re-validate once
                // against the fresh state before giving up.
                debug!(
                    auction_id = auction_id.value(),
                    "Re-validating bid after version conflict"
                );
                validate_bid(&current, &bid.bidder, amount, &event.host, now, &self.policy)
                    .map_err(translate_core_error)?;
                self.store
                    .append_bid(auction_id, bid.clone(), version)
                    .await
                    .map_err(translate_store_error)?
            }
            Err(other) => return Err(translate_store_error(other)),
        };

        info!(
            auction_id = auction_id.value(),
            bidder = %bid.bidder,
            amount,
            "Bid committed"
        );

        self.spawn_bid_side_effects(committed.auction.clone(), event, bid, now);

        let board = calculate_leaderboard(&committed.auction);
        Ok(PlaceBidResponse {
            leaderboard: (&board).into(),
            auction: AuctionInfo::from(&committed.auction),
            server_time: timestamp_text(now),
            message: String::from("Bid placed successfully"),
        })
    }

    /// Builds a fresh leaderboard push for one subscriber.
    ///
    /// Also a lifecycle trigger point, like any other read.
    ///
    /// # Errors
    ///
    /// Returns an error if the auction does not exist.
    pub async fn snapshot_update(
        &self,
        auction_id: AuctionId,
        kind: UpdateKind,
        now: OffsetDateTime,
    ) -> Result<LiveUpdate, ApiError> {
        let mut snapshot: VersionedAuction = self
            .store
            .get(auction_id)
            .await
            .map_err(translate_store_error)?;

        if is_expired(&snapshot.auction, now) {
            snapshot = match self.finalize_if_expired(&snapshot.auction, now).await? {
                Some(finished) => finished,
                None => self
                    .store
                    .get(auction_id)
                    .await
                    .map_err(translate_store_error)?,
            };
        }

        let board = calculate_leaderboard(&snapshot.auction);
        Ok(leaderboard_update(&snapshot.auction, &board, kind, now))
    }

    /// Finishes an expired auction, exactly once across all triggers.
    ///
    /// Returns the finished snapshot if this caller applied the
    /// transition, `None` if another trigger already had. Only the
    /// applying caller emits the end-of-auction notification batch.
    ///
    /// # Errors
    ///
    /// Returns an error only on storage failure; a lost race is a
    /// normal `None`.
    pub async fn finalize_if_expired(
        &self,
        auction: &Auction,
        now: OffsetDateTime,
    ) -> Result<Option<VersionedAuction>, ApiError> {
        match self
            .store
            .transition_status(auction.id, AuctionStatus::Active, AuctionStatus::Finished)
            .await
        {
            Ok(finished) => {
                info!(
                    auction_id = auction.id.value(),
                    "Auction finished at end time"
                );
                self.spawn_end_side_effects(finished.auction.clone(), now);
                Ok(Some(finished))
            }
            Err(StoreError::TransitionConflict { .. }) => {
                // Already finished by a concurrent trigger
                Ok(None)
            }
            Err(other) => Err(translate_store_error(other)),
        }
    }

    /// Returns queue counts and recent failures for operators.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be inspected.
    pub async fn queue_status(&self) -> Result<QueueStatusResponse, ApiError> {
        let status = self.mail.status().await.map_err(|e| ApiError::Internal {
            message: format!("Failed to inspect notification queue: {e}"),
        })?;

        Ok(QueueStatusResponse {
            queued: status.counts.queued,
            delivered: status.counts.delivered,
            failed: status.counts.failed,
            recent_failures: status.recent_failures.iter().map(FailedJobInfo::from).collect(),
        })
    }

    /// Re-queues all terminally failed notification jobs.
    ///
    /// # Errors
    ///
    /// Returns an error if the re-queue fails.
    pub async fn retry_failed_jobs(&self) -> Result<RetryFailedResponse, ApiError> {
        let retried: usize = self
            .mail
            .retry_failed()
            .await
            .map_err(|e| ApiError::Internal {
                message: format!("Failed to retry notification jobs: {e}"),
            })?;

        Ok(RetryFailedResponse {
            retried,
            message: format!("Retried {retried} failed notification jobs"),
        })
    }

    /// Fan-out after a committed bid: participant bookkeeping, live
    /// broadcast, and confirmation emails. Best-effort; failures are
    /// logged and recovered by the job queue, never the bid.
    fn spawn_bid_side_effects(
        &self,
        auction: Auction,
        event: EventDetails,
        bid: Bid,
        now: OffsetDateTime,
    ) -> JoinHandle<()> {
        let store: Arc<AuctionStore> = Arc::clone(&self.store);
        let broadcaster: Arc<TopicBroadcaster> = Arc::clone(&self.broadcaster);
        let mail: Arc<MailQueue> = Arc::clone(&self.mail);
        let bidders: Arc<dyn BidderDirectory> = Arc::clone(&self.bidders);

        tokio::spawn(async move {
            if let Err(e) = store.record_participant(auction.id, &bid.bidder, now).await {
                warn!(
                    auction_id = auction.id.value(),
                    error = %e,
                    "Failed to record participant"
                );
            }

            let board = calculate_leaderboard(&auction);
            let auction_topic: Topic = Topic::Auction(auction.id);
            broadcaster
                .publish(
                    &auction_topic,
                    &leaderboard_update(&auction, &board, UpdateKind::NewBid, now),
                )
                .await;
            broadcaster
                .publish(
                    &Topic::Event(auction.event_id.clone()),
                    &auction_summary(&auction, UpdateKind::NewBid, now),
                )
                .await;
            let announcement: LiveUpdate = LiveUpdate::NewBid {
                auction_id: auction.id.value(),
                amount: bid.amount,
                bidder_id: bid.bidder.value().to_string(),
                timestamp: timestamp_text(bid.placed_at),
                is_new_leader: true,
            };
            broadcaster.publish(&auction_topic, &announcement).await;
            // Bidder-addressed copy, for clients watching their own bids
            broadcaster
                .publish(&Topic::Bidder(bid.bidder.clone()), &announcement)
                .await;

            let placed_at: String = timestamp_text(bid.placed_at);
            let end_time: String = timestamp_text(auction.end_time());

            if let Some(contact) = bidders.contact(&bid.bidder) {
                let content = bid_confirmation(
                    &auction.terms.item_name,
                    bid.amount,
                    &placed_at,
                    &end_time,
                );
                if let Err(e) = mail
                    .enqueue(JobKind::BidConfirmation, &contact.email, content)
                    .await
                {
                    warn!(error = %e, "Failed to enqueue bid confirmation");
                }
            }

            let content = new_bid_host_notification(
                &auction.terms.item_name,
                bid.amount,
                &placed_at,
                &end_time,
            );
            if let Err(e) = mail
                .enqueue(JobKind::NewBidHostNotification, &event.host_email, content)
                .await
            {
                warn!(error = %e, "Failed to enqueue host notification");
            }
        })
    }

    /// Fan-out after the finish transition: the `auction_ended`
    /// broadcast and exactly one end-of-auction email batch, emitted by
    /// the transition itself so it can be neither duplicated nor
    /// missed.
    fn spawn_end_side_effects(&self, auction: Auction, now: OffsetDateTime) -> JoinHandle<()> {
        let broadcaster: Arc<TopicBroadcaster> = Arc::clone(&self.broadcaster);
        let mail: Arc<MailQueue> = Arc::clone(&self.mail);
        let events: Arc<dyn EventDirectory> = Arc::clone(&self.events);
        let bidders: Arc<dyn BidderDirectory> = Arc::clone(&self.bidders);

        tokio::spawn(async move {
            let board = calculate_leaderboard(&auction);
            broadcaster
                .publish(
                    &Topic::Auction(auction.id),
                    &leaderboard_update(&auction, &board, UpdateKind::AuctionEnded, now),
                )
                .await;
            broadcaster
                .publish(
                    &Topic::Event(auction.event_id.clone()),
                    &auction_summary(&auction, UpdateKind::AuctionEnded, now),
                )
                .await;

            let Some(event) = events.event(&auction.event_id) else {
                warn!(
                    auction_id = auction.id.value(),
                    event_id = %auction.event_id,
                    "Event metadata missing; skipping end-of-auction emails"
                );
                return;
            };

            let end_time: String = timestamp_text(auction.end_time());
            let item_name: &str = &auction.terms.item_name;

            match determine_winner(&auction) {
                Some(winning_bid) => {
                    let winner_contact = bidders.contact(&winning_bid.bidder);

                    if let Some(contact) = &winner_contact {
                        let content = auction_won(item_name, winning_bid.amount, &end_time);
                        if let Err(e) = mail
                            .enqueue(JobKind::AuctionWon, &contact.email, content)
                            .await
                        {
                            warn!(error = %e, "Failed to enqueue winner notification");
                        }
                    } else {
                        warn!(
                            auction_id = auction.id.value(),
                            bidder = %winning_bid.bidder,
                            "Winner contact missing; skipping winner notification"
                        );
                    }

                    let winner_email: String = winner_contact
                        .map_or_else(|| String::from("unavailable"), |contact| contact.email);
                    let content = auction_ended_with_winner(
                        item_name,
                        winning_bid.amount,
                        &winner_email,
                        &end_time,
                    );
                    if let Err(e) = mail
                        .enqueue(JobKind::AuctionEndedWithWinner, &event.host_email, content)
                        .await
                    {
                        warn!(error = %e, "Failed to enqueue host end-of-auction summary");
                    }
                }
                None => {
                    let content = auction_ended_no_bids(item_name, &end_time);
                    if let Err(e) = mail
                        .enqueue(JobKind::AuctionEndedNoBids, &event.host_email, content)
                        .await
                    {
                        warn!(error = %e, "Failed to enqueue no-bids notification");
                    }
                }
            }
        })
    }
}
