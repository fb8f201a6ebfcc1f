// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::status::AuctionStatus;
use time::OffsetDateTime;

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Item name is empty or invalid.
    InvalidItemName(String),
    /// Item description is empty or invalid.
    InvalidItemDescription(String),
    /// Starting bid must be positive.
    InvalidStartingBid {
        /// The invalid amount.
        amount: i64,
    },
    /// Bid increment must be positive.
    InvalidBidIncrement {
        /// The invalid amount.
        amount: i64,
    },
    /// Auction duration must be positive.
    InvalidDuration {
        /// The invalid duration in minutes.
        minutes: i64,
    },
    /// Bid amount must be positive.
    InvalidBidAmount {
        /// The invalid amount.
        amount: i64,
    },
    /// The auction is not accepting bids in its current status.
    AuctionNotActive {
        /// The current status.
        status: AuctionStatus,
    },
    /// The auction's end time has passed.
    AuctionEnded {
        /// The end time that was crossed.
        end_time: OffsetDateTime,
    },
    /// The bid does not meet the minimum acceptable amount.
    BidBelowMinimum {
        /// The offered amount.
        amount: i64,
        /// The minimum acceptable next bid.
        minimum: i64,
        /// The current highest bid.
        current_highest: i64,
    },
    /// The event host attempted to bid on their own auction.
    HostCannotBid,
    /// The bidder already holds the immediately preceding bid.
    ConsecutiveBid {
        /// The bidder attempting to bid twice in a row.
        bidder: String,
    },
    /// Status string is not a valid auction status.
    InvalidStatus {
        /// The invalid status string.
        status: String,
    },
    /// Status transition is not permitted.
    InvalidStatusTransition {
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
        /// Why the transition is not allowed.
        reason: String,
    },
    /// A timestamp could not be formatted as ISO 8601.
    TimestampFormat {
        /// The formatting error message.
        error: String,
    },
    /// A timestamp string could not be parsed.
    TimestampParse {
        /// The invalid timestamp string.
        value: String,
        /// The parsing error message.
        error: String,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidItemName(msg) => write!(f, "Invalid item name: {msg}"),
            Self::InvalidItemDescription(msg) => {
                write!(f, "Invalid item description: {msg}")
            }
            Self::InvalidStartingBid { amount } => {
                write!(f, "Invalid starting bid: {amount}. Must be greater than 0")
            }
            Self::InvalidBidIncrement { amount } => {
                write!(f, "Invalid bid increment: {amount}. Must be greater than 0")
            }
            Self::InvalidDuration { minutes } => {
                write!(
                    f,
                    "Invalid auction duration: {minutes} minutes. Must be greater than 0"
                )
            }
            Self::InvalidBidAmount { amount } => {
                write!(f, "Invalid bid amount: {amount}. Must be greater than 0")
            }
            Self::AuctionNotActive { status } => {
                write!(f, "Auction is not active (status: {status})")
            }
            Self::AuctionEnded { end_time } => {
                write!(f, "Auction ended at {end_time}")
            }
            Self::BidBelowMinimum {
                amount,
                minimum,
                current_highest,
            } => {
                write!(
                    f,
                    "Bid of {amount} is below the minimum of {minimum} (current highest: {current_highest})"
                )
            }
            Self::HostCannotBid => {
                write!(f, "Event hosts cannot bid on their own auctions")
            }
            Self::ConsecutiveBid { bidder } => {
                write!(
                    f,
                    "Bidder '{bidder}' already holds the most recent bid and must wait for another sponsor"
                )
            }
            Self::InvalidStatus { status } => {
                write!(f, "Invalid auction status: '{status}'")
            }
            Self::InvalidStatusTransition { from, to, reason } => {
                write!(f, "Invalid status transition from '{from}' to '{to}': {reason}")
            }
            Self::TimestampFormat { error } => {
                write!(f, "Failed to format timestamp: {error}")
            }
            Self::TimestampParse { value, error } => {
                write!(f, "Failed to parse timestamp '{value}': {error}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
