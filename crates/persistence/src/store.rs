// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The auction store: the single mutable shared resource in the write
//! path.
//!
//! Auctions live in an in-memory registry, one entry per auction behind
//! its own async mutex; SQLite is the durable record, written under the
//! entry lock and replayed into the registry at startup. Writers on the
//! same auction serialize on the entry lock, which defines commit
//! order; writers on different auctions only share the brief database
//! connection lock. Reads clone a snapshot and never wait on another
//! auction's writer.
//!
//! Memory mutates only after the database transaction commits, so a
//! failed write leaves both views unchanged.

use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::{Database, mutations, queries};
use hive_auction_domain::{
    Auction, AuctionId, AuctionStatus, AuctionTerms, Bid, BidderId, EventId, format_timestamp,
};

/// A consistent snapshot of an auction plus its version counter.
///
/// The version increments on every committed mutation. Callers pass it
/// back to [`AuctionStore::append_bid`] so the store can detect that
/// validation ran against stale state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedAuction {
    /// The auction as committed.
    pub auction: Auction,
    /// The version the snapshot was taken at.
    pub version: u64,
}

struct AuctionEntry {
    auction: Auction,
    version: u64,
}

impl AuctionEntry {
    fn snapshot(&self) -> VersionedAuction {
        VersionedAuction {
            auction: self.auction.clone(),
            version: self.version,
        }
    }
}

/// Durable, per-auction-serialized storage of auction aggregates.
pub struct AuctionStore {
    registry: RwLock<HashMap<i64, Arc<Mutex<AuctionEntry>>>>,
    db: Arc<Mutex<Database>>,
}

impl AuctionStore {
    /// Opens the store over an existing database, replaying all
    /// persisted auctions into the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the recovery queries fail or a stored row
    /// is corrupt.
    pub async fn load(db: Arc<Mutex<Database>>) -> Result<Self, StoreError> {
        let auctions: Vec<Auction> = {
            let mut guard = db.lock().await;
            queries::load_all_auctions(guard.conn())?
        };

        let mut registry: HashMap<i64, Arc<Mutex<AuctionEntry>>> = HashMap::new();
        for auction in auctions {
            registry.insert(
                auction.id.value(),
                Arc::new(Mutex::new(AuctionEntry {
                    auction,
                    version: 0,
                })),
            );
        }

        info!(count = registry.len(), "Loaded auctions from database");
        Ok(Self {
            registry: RwLock::new(registry),
            db,
        })
    }

    async fn entry(&self, auction_id: AuctionId) -> Result<Arc<Mutex<AuctionEntry>>, StoreError> {
        let registry = self.registry.read().await;
        registry
            .get(&auction_id.value())
            .cloned()
            .ok_or(StoreError::AuctionNotFound(auction_id.value()))
    }

    /// Creates an auction with no bids and persists it.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_auction(
        &self,
        event_id: EventId,
        terms: AuctionTerms,
        status: AuctionStatus,
        created_at: OffsetDateTime,
    ) -> Result<VersionedAuction, StoreError> {
        let created_at_text: String = format_timestamp(created_at)?;

        let auction_id: i64 = {
            let mut guard = self.db.lock().await;
            mutations::insert_auction(guard.conn(), &event_id, &terms, status, &created_at_text)?
        };

        let auction: Auction = Auction::new(
            AuctionId::new(auction_id),
            event_id,
            terms,
            status,
            created_at,
        );

        let entry: Arc<Mutex<AuctionEntry>> = Arc::new(Mutex::new(AuctionEntry {
            auction: auction.clone(),
            version: 0,
        }));
        self.registry.write().await.insert(auction_id, entry);

        info!(auction_id, status = %status, "Created auction");
        Ok(VersionedAuction {
            auction,
            version: 0,
        })
    }

    /// Returns a snapshot of an auction.
    ///
    /// # Errors
    ///
    /// Returns `AuctionNotFound` if no such auction exists.
    pub async fn get(&self, auction_id: AuctionId) -> Result<VersionedAuction, StoreError> {
        let entry = self.entry(auction_id).await?;
        let guard = entry.lock().await;
        Ok(guard.snapshot())
    }

    /// Returns snapshots of every auction, ordered by id.
    pub async fn list(&self) -> Vec<VersionedAuction> {
        let entries: Vec<Arc<Mutex<AuctionEntry>>> = {
            let registry = self.registry.read().await;
            let mut ids: Vec<i64> = registry.keys().copied().collect();
            ids.sort_unstable();
            ids.iter()
                .filter_map(|id| registry.get(id).cloned())
                .collect()
        };

        let mut snapshots: Vec<VersionedAuction> = Vec::with_capacity(entries.len());
        for entry in entries {
            snapshots.push(entry.lock().await.snapshot());
        }
        snapshots
    }

    /// Atomically appends a bid and updates the highest amount.
    ///
    /// The caller supplies the version its validation ran against. If
    /// another bid committed in between, the call fails with
    /// `VersionConflict` carrying the fresh state so the caller can
    /// re-validate and retry. All commit-time invariants (active
    /// status, end time, minimum amount) are re-checked here under the
    /// entry lock regardless of what the caller validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the auction does not exist, the snapshot is
    /// stale, a domain rule rejects the bid, or the database write
    /// fails.
    pub async fn append_bid(
        &self,
        auction_id: AuctionId,
        bid: Bid,
        expected_version: u64,
    ) -> Result<VersionedAuction, StoreError> {
        let entry = self.entry(auction_id).await?;
        let mut guard = entry.lock().await;

        if guard.version != expected_version {
            debug!(
                auction_id = auction_id.value(),
                expected = expected_version,
                actual = guard.version,
                "Bid raced a concurrent commit"
            );
            return Err(StoreError::VersionConflict {
                current: Box::new(guard.auction.clone()),
                version: guard.version,
            });
        }

        let mut updated: Auction = guard.auction.clone();
        updated.append_bid(bid.clone())?;

        let placed_at_text: String = format_timestamp(bid.placed_at)?;
        {
            let mut db = self.db.lock().await;
            mutations::append_bid(
                db.conn(),
                auction_id.value(),
                &bid,
                updated.current_highest_bid,
                &placed_at_text,
            )?;
        }

        guard.auction = updated;
        guard.version += 1;
        debug!(
            auction_id = auction_id.value(),
            amount = bid.amount,
            version = guard.version,
            "Appended bid"
        );
        Ok(guard.snapshot())
    }

    /// Applies a status transition with compare-and-swap semantics.
    ///
    /// Exactly one of N concurrent callers expecting the same current
    /// status succeeds; the rest observe `TransitionConflict` and must
    /// treat it as "already handled".
    ///
    /// # Errors
    ///
    /// Returns an error if the auction does not exist, is not in the
    /// expected status, the transition is invalid, or the database
    /// write fails.
    pub async fn transition_status(
        &self,
        auction_id: AuctionId,
        expected: AuctionStatus,
        next: AuctionStatus,
    ) -> Result<VersionedAuction, StoreError> {
        let entry = self.entry(auction_id).await?;
        let mut guard = entry.lock().await;

        if guard.auction.status != expected {
            return Err(StoreError::TransitionConflict {
                expected,
                actual: guard.auction.status,
            });
        }

        guard.auction.status.validate_transition(next)?;

        {
            let mut db = self.db.lock().await;
            mutations::update_auction_status(db.conn(), auction_id.value(), next)?;
        }

        guard.auction.status = next;
        guard.version += 1;
        info!(
            auction_id = auction_id.value(),
            from = %expected,
            to = %next,
            "Transitioned auction status"
        );
        Ok(guard.snapshot())
    }

    /// Records a bidder as a participant of an auction. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the auction does not exist or the insert
    /// fails.
    pub async fn record_participant(
        &self,
        auction_id: AuctionId,
        bidder: &BidderId,
        now: OffsetDateTime,
    ) -> Result<(), StoreError> {
        // Existence check keeps the foreign key violation a friendly error
        self.entry(auction_id).await?;

        let joined_at: String = format_timestamp(now)?;
        let mut db = self.db.lock().await;
        mutations::insert_participant(db.conn(), auction_id.value(), bidder, &joined_at)?;
        Ok(())
    }
}
