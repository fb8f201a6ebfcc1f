// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Write-side database operations.
//!
//! Every mutation here is invoked by the store while it holds the
//! relevant per-auction lock, so the database always sees bids in
//! commit order.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::debug;

use crate::backend::get_last_insert_rowid;
use crate::data_models::{JOB_STATUS_FAILED, JOB_STATUS_QUEUED, NewJob};
use crate::diesel_schema::{auctions, bids, notification_jobs, participants};
use crate::error::PersistenceError;
use hive_auction_domain::{AuctionStatus, AuctionTerms, Bid, BidderId, EventId};

/// Inserts a new auction row and returns its assigned id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_auction(
    conn: &mut SqliteConnection,
    event_id: &EventId,
    terms: &AuctionTerms,
    status: AuctionStatus,
    created_at: &str,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(auctions::table)
        .values((
            auctions::event_id.eq(event_id.value()),
            auctions::item_name.eq(&terms.item_name),
            auctions::item_description.eq(&terms.item_description),
            auctions::starting_bid.eq(terms.starting_bid),
            auctions::bid_increment.eq(terms.bid_increment),
            auctions::duration_minutes.eq(terms.duration_minutes),
            auctions::status.eq(status.as_str()),
            auctions::current_highest_bid.eq(0_i64),
            auctions::created_at.eq(created_at),
        ))
        .execute(conn)?;

    let auction_id: i64 = get_last_insert_rowid(conn)?;
    debug!(auction_id, "Inserted auction row");
    Ok(auction_id)
}

/// Records a bid and the new highest amount in one transaction.
///
/// Either both changes commit or neither does; a partially recorded
/// bid can never be observed after a crash.
///
/// # Errors
///
/// Returns an error if the transaction fails.
pub fn append_bid(
    conn: &mut SqliteConnection,
    auction_id: i64,
    bid: &Bid,
    new_highest: i64,
    placed_at: &str,
) -> Result<(), PersistenceError> {
    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::insert_into(bids::table)
            .values((
                bids::auction_id.eq(auction_id),
                bids::bidder.eq(bid.bidder.value()),
                bids::amount.eq(bid.amount),
                bids::placed_at.eq(placed_at),
            ))
            .execute(conn)?;

        diesel::update(auctions::table.filter(auctions::auction_id.eq(auction_id)))
            .set(auctions::current_highest_bid.eq(new_highest))
            .execute(conn)?;

        Ok(())
    })?;

    debug!(auction_id, amount = bid.amount, "Committed bid");
    Ok(())
}

/// Updates an auction's status.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_auction_status(
    conn: &mut SqliteConnection,
    auction_id: i64,
    status: AuctionStatus,
) -> Result<(), PersistenceError> {
    diesel::update(auctions::table.filter(auctions::auction_id.eq(auction_id)))
        .set(auctions::status.eq(status.as_str()))
        .execute(conn)?;
    Ok(())
}

/// Records a bidder as a participant of an auction.
///
/// Idempotent: re-recording an existing participant is a no-op.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_participant(
    conn: &mut SqliteConnection,
    auction_id: i64,
    bidder: &BidderId,
    joined_at: &str,
) -> Result<(), PersistenceError> {
    diesel::insert_into(participants::table)
        .values((
            participants::auction_id.eq(auction_id),
            participants::bidder.eq(bidder.value()),
            participants::joined_at.eq(joined_at),
        ))
        .on_conflict_do_nothing()
        .execute(conn)?;
    Ok(())
}

/// Inserts a notification job in the `queued` state and returns its id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_job(
    conn: &mut SqliteConnection,
    job: &NewJob,
    now: &str,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(notification_jobs::table)
        .values((
            notification_jobs::recipient.eq(&job.recipient),
            notification_jobs::subject.eq(&job.subject),
            notification_jobs::body.eq(&job.body),
            notification_jobs::kind.eq(&job.kind),
            notification_jobs::priority.eq(job.priority),
            notification_jobs::attempts.eq(0),
            notification_jobs::status.eq(JOB_STATUS_QUEUED),
            notification_jobs::created_at.eq(now),
            notification_jobs::updated_at.eq(now),
        ))
        .execute(conn)?;

    get_last_insert_rowid(conn)
}

/// Records the outcome of a delivery attempt.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_job(
    conn: &mut SqliteConnection,
    job_id: i64,
    attempts: i32,
    status: &str,
    last_error: Option<&str>,
    now: &str,
) -> Result<(), PersistenceError> {
    diesel::update(notification_jobs::table.filter(notification_jobs::job_id.eq(job_id)))
        .set((
            notification_jobs::attempts.eq(attempts),
            notification_jobs::status.eq(status),
            notification_jobs::last_error.eq(last_error),
            notification_jobs::updated_at.eq(now),
        ))
        .execute(conn)?;
    Ok(())
}

/// Moves every terminally failed job back to `queued` with a fresh
/// attempt budget. Returns the number of jobs re-queued.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn requeue_failed_jobs(conn: &mut SqliteConnection, now: &str) -> Result<usize, PersistenceError> {
    let updated: usize =
        diesel::update(notification_jobs::table.filter(notification_jobs::status.eq(JOB_STATUS_FAILED)))
            .set((
                notification_jobs::status.eq(JOB_STATUS_QUEUED),
                notification_jobs::attempts.eq(0),
                notification_jobs::updated_at.eq(now),
            ))
            .execute(conn)?;

    debug!(count = updated, "Re-queued failed notification jobs");
    Ok(updated)
}
