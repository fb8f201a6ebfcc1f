// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-side database operations.
//!
//! Queries run at startup (recovery of the in-memory registry and the
//! job queue) and for operator inspection. The hot read path never
//! touches the database; it is served from the store's registry.

use diesel::SqliteConnection;
use diesel::prelude::*;
use std::str::FromStr;

use crate::data_models::{
    JOB_STATUS_DELIVERED, JOB_STATUS_FAILED, JOB_STATUS_QUEUED, QueueCounts, StoredJob,
};
use crate::diesel_schema::{auctions, bids, notification_jobs};
use crate::error::PersistenceError;
use hive_auction_domain::{
    Auction, AuctionId, AuctionStatus, AuctionTerms, Bid, BidderId, EventId, parse_timestamp,
};

/// Diesel Queryable struct for auction rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = auctions)]
struct AuctionRow {
    auction_id: i64,
    event_id: String,
    item_name: String,
    item_description: String,
    starting_bid: i64,
    bid_increment: i64,
    duration_minutes: i64,
    status: String,
    current_highest_bid: i64,
    created_at: String,
}

/// Diesel Queryable struct for bid rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = bids)]
struct BidRow {
    #[allow(dead_code)]
    bid_id: i64,
    auction_id: i64,
    bidder: String,
    amount: i64,
    placed_at: String,
}

/// Diesel Queryable struct for notification job rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = notification_jobs)]
struct JobRow {
    job_id: i64,
    recipient: String,
    subject: String,
    body: String,
    kind: String,
    priority: i32,
    attempts: i32,
    status: String,
    last_error: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<JobRow> for StoredJob {
    fn from(row: JobRow) -> Self {
        Self {
            id: row.job_id,
            recipient: row.recipient,
            subject: row.subject,
            body: row.body,
            kind: row.kind,
            priority: row.priority,
            attempts: row.attempts,
            status: row.status,
            last_error: row.last_error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn row_to_auction(row: AuctionRow, bid_rows: Vec<BidRow>) -> Result<Auction, PersistenceError> {
    let status: AuctionStatus =
        AuctionStatus::from_str(&row.status).map_err(|e| PersistenceError::CorruptRow {
            table: String::from("auctions"),
            reason: e.to_string(),
        })?;

    let created_at = parse_timestamp(&row.created_at).map_err(|e| PersistenceError::CorruptRow {
        table: String::from("auctions"),
        reason: e.to_string(),
    })?;

    let terms: AuctionTerms = AuctionTerms::new(
        row.item_name,
        row.item_description,
        row.starting_bid,
        row.bid_increment,
        row.duration_minutes,
    );

    let mut auction: Auction = Auction::new(
        AuctionId::new(row.auction_id),
        EventId::new(&row.event_id),
        terms,
        status,
        created_at,
    );

    // Rebuild the history directly; re-running append_bid would reject
    // bids on finished auctions that were valid when committed.
    for bid_row in bid_rows {
        let placed_at =
            parse_timestamp(&bid_row.placed_at).map_err(|e| PersistenceError::CorruptRow {
                table: String::from("bids"),
                reason: e.to_string(),
            })?;
        auction.bids.push(Bid::new(
            BidderId::new(&bid_row.bidder),
            bid_row.amount,
            placed_at,
        ));
    }
    auction.current_highest_bid = row.current_highest_bid;

    Ok(auction)
}

/// Loads every auction with its full bid history, in commit order.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row cannot be
/// converted back into a domain value.
pub fn load_all_auctions(conn: &mut SqliteConnection) -> Result<Vec<Auction>, PersistenceError> {
    let auction_rows: Vec<AuctionRow> = auctions::table
        .order(auctions::auction_id.asc())
        .select(AuctionRow::as_select())
        .load(conn)?;

    let mut bid_rows: Vec<BidRow> = bids::table
        .order(bids::bid_id.asc())
        .select(BidRow::as_select())
        .load(conn)?;

    let mut loaded: Vec<Auction> = Vec::with_capacity(auction_rows.len());
    for row in auction_rows {
        let auction_bids: Vec<BidRow> = bid_rows
            .extract_if(.., |bid| bid.auction_id == row.auction_id)
            .collect();
        loaded.push(row_to_auction(row, auction_bids)?);
    }

    Ok(loaded)
}

/// Loads all jobs still waiting for delivery, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn load_queued_jobs(conn: &mut SqliteConnection) -> Result<Vec<StoredJob>, PersistenceError> {
    let rows: Vec<JobRow> = notification_jobs::table
        .filter(notification_jobs::status.eq(JOB_STATUS_QUEUED))
        .order(notification_jobs::job_id.asc())
        .select(JobRow::as_select())
        .load(conn)?;

    Ok(rows.into_iter().map(StoredJob::from).collect())
}

/// Counts jobs by status.
///
/// # Errors
///
/// Returns an error if any count query fails.
pub fn count_jobs(conn: &mut SqliteConnection) -> Result<QueueCounts, PersistenceError> {
    let count_for = |conn: &mut SqliteConnection, status: &str| -> Result<i64, PersistenceError> {
        Ok(notification_jobs::table
            .filter(notification_jobs::status.eq(status))
            .count()
            .get_result(conn)?)
    };

    Ok(QueueCounts {
        queued: count_for(conn, JOB_STATUS_QUEUED)?,
        delivered: count_for(conn, JOB_STATUS_DELIVERED)?,
        failed: count_for(conn, JOB_STATUS_FAILED)?,
    })
}

/// Loads every terminally failed job, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn load_failed_jobs(conn: &mut SqliteConnection) -> Result<Vec<StoredJob>, PersistenceError> {
    let rows: Vec<JobRow> = notification_jobs::table
        .filter(notification_jobs::status.eq(JOB_STATUS_FAILED))
        .order(notification_jobs::job_id.asc())
        .select(JobRow::as_select())
        .load(conn)?;

    Ok(rows.into_iter().map(StoredJob::from).collect())
}

/// Returns the most recently failed jobs for operator inspection.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn recent_failed_jobs(
    conn: &mut SqliteConnection,
    limit: i64,
) -> Result<Vec<StoredJob>, PersistenceError> {
    let rows: Vec<JobRow> = notification_jobs::table
        .filter(notification_jobs::status.eq(JOB_STATUS_FAILED))
        .order(notification_jobs::job_id.desc())
        .limit(limit)
        .select(JobRow::as_select())
        .load(conn)?;

    Ok(rows.into_iter().map(StoredJob::from).collect())
}

/// Fetches a single job by id.
///
/// # Errors
///
/// Returns `NotFound` if no such job exists, or an error if the query
/// fails.
pub fn get_job(conn: &mut SqliteConnection, job_id: i64) -> Result<StoredJob, PersistenceError> {
    let row: JobRow = notification_jobs::table
        .filter(notification_jobs::job_id.eq(job_id))
        .select(JobRow::as_select())
        .first(conn)?;

    Ok(StoredJob::from(row))
}
