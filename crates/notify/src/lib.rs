// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Notification fan-out for the Hive Auction engine.
//!
//! Two channels with different guarantees:
//!
//! - **Live broadcast** (`live`): low-latency pushes of leaderboard and
//!   status changes to subscribers of an auction, event, or bidder
//!   topic. At-most-once; a slow subscriber drops old updates rather
//!   than slowing anyone else down.
//! - **Durable outbound jobs** (`queue`): email notifications persisted
//!   as jobs, processed by a bounded worker pool with exponential
//!   backoff, surviving process restarts. At-least-once; consumers must
//!   tolerate duplicates.
//!
//! The mail transport is injected as a [`Mailer`] so deployments choose
//! their own delivery mechanism.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod compose;
mod job;
mod live;
mod queue;

#[cfg(test)]
mod tests;

pub use compose::{
    MailContent, auction_ended_no_bids, auction_ended_with_winner, auction_won, bid_confirmation,
    new_bid_host_notification,
};
pub use job::JobKind;
pub use live::{
    LeaderboardData, LiveUpdate, RankedBidData, Topic, TopicBroadcaster, UpdateKind,
    auction_summary, leaderboard_update,
};
pub use queue::{
    LogMailer, MailQueue, Mailer, MailerError, OutboundEmail, QueueConfig, QueueStatus,
};
