// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.
//!
//! Every error carries a stable `kind` string so transport layers can
//! map to status codes without parsing messages, and bid rejections
//! carry the current highest bid and minimum acceptable next bid so a
//! client can immediately retry with a valid amount.

use hive_auction::CoreError;
use hive_auction_domain::{DomainError, format_timestamp};
use hive_auction_persistence::StoreError;

/// API-level errors.
///
/// These are the contract with external collaborators; domain and
/// store errors are translated, never leaked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The auction does not exist.
    NotFound {
        /// The requested auction id.
        auction_id: i64,
    },
    /// The auction is not accepting bids in its current status.
    AuctionNotActive {
        /// The current status string.
        status: String,
    },
    /// The auction's end time has passed.
    AuctionEnded {
        /// The end time (ISO 8601).
        end_time: String,
    },
    /// The event host attempted to bid on their own auction.
    HostCannotBid,
    /// The bidder already holds the immediately preceding bid.
    ConsecutiveBidderNotAllowed,
    /// The bid does not meet the minimum acceptable amount.
    BidTooLow {
        /// The offered amount.
        amount: i64,
        /// The current highest bid.
        current_highest_bid: i64,
        /// The minimum acceptable next bid.
        minimum_next_bid: i64,
    },
    /// A concurrent write won; safe to retry.
    StoreConflict {
        /// A human-readable description.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource other than an auction was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl ApiError {
    /// Returns the stable kind tag for transport-level mapping.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AuctionNotActive { .. } => "auction_not_active",
            Self::AuctionEnded { .. } => "auction_ended",
            Self::HostCannotBid => "host_cannot_bid",
            Self::ConsecutiveBidderNotAllowed => "consecutive_bidder_not_allowed",
            Self::BidTooLow { .. } => "bid_too_low",
            Self::StoreConflict { .. } => "store_conflict",
            Self::InvalidInput { .. } => "invalid_input",
            Self::ResourceNotFound { .. } => "resource_not_found",
            Self::Internal { .. } => "internal",
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { auction_id } => write!(f, "Auction {auction_id} not found"),
            Self::AuctionNotActive { status } => {
                write!(f, "Auction is not active (status: {status})")
            }
            Self::AuctionEnded { end_time } => write!(f, "Auction has ended (ended {end_time})"),
            Self::HostCannotBid => {
                write!(f, "Event hosts cannot bid on their own auctions")
            }
            Self::ConsecutiveBidderNotAllowed => {
                write!(
                    f,
                    "You cannot place two consecutive bids. Wait for another sponsor to bid"
                )
            }
            Self::BidTooLow {
                amount,
                current_highest_bid,
                minimum_next_bid,
            } => {
                write!(
                    f,
                    "Bid of {amount} is too low: the current highest bid is {current_highest_bid} and the minimum acceptable bid is {minimum_next_bid}"
                )
            }
            Self::StoreConflict { message } => write!(f, "Conflict: {message}"),
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Internal { message } => write!(f, "Internal error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not
/// leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::AuctionNotActive { status } => ApiError::AuctionNotActive {
            status: status.as_str().to_string(),
        },
        DomainError::AuctionEnded { end_time } => ApiError::AuctionEnded {
            end_time: format_timestamp(end_time).unwrap_or_else(|_| String::from("unknown")),
        },
        DomainError::HostCannotBid => ApiError::HostCannotBid,
        DomainError::ConsecutiveBid { .. } => ApiError::ConsecutiveBidderNotAllowed,
        DomainError::BidBelowMinimum {
            amount,
            minimum,
            current_highest,
        } => ApiError::BidTooLow {
            amount,
            current_highest_bid: current_highest,
            minimum_next_bid: minimum,
        },
        DomainError::InvalidBidAmount { amount } => ApiError::InvalidInput {
            field: String::from("amount"),
            message: format!("Invalid bid amount: {amount}. Must be greater than 0"),
        },
        DomainError::InvalidItemName(msg) => ApiError::InvalidInput {
            field: String::from("item_name"),
            message: msg,
        },
        DomainError::InvalidItemDescription(msg) => ApiError::InvalidInput {
            field: String::from("item_description"),
            message: msg,
        },
        DomainError::InvalidStartingBid { amount } => ApiError::InvalidInput {
            field: String::from("starting_bid"),
            message: format!("Invalid starting bid: {amount}. Must be greater than 0"),
        },
        DomainError::InvalidBidIncrement { amount } => ApiError::InvalidInput {
            field: String::from("bid_increment"),
            message: format!("Invalid bid increment: {amount}. Must be greater than 0"),
        },
        DomainError::InvalidDuration { minutes } => ApiError::InvalidInput {
            field: String::from("duration_minutes"),
            message: format!("Invalid duration: {minutes} minutes. Must be greater than 0"),
        },
        DomainError::InvalidStatus { status } => ApiError::InvalidInput {
            field: String::from("status"),
            message: format!("Invalid auction status: '{status}'"),
        },
        DomainError::InvalidStatusTransition { from, to, reason } => ApiError::StoreConflict {
            message: format!("Cannot move auction from '{from}' to '{to}': {reason}"),
        },
        DomainError::TimestampFormat { error } | DomainError::TimestampParse { error, .. } => {
            ApiError::Internal {
                message: format!("Timestamp conversion failed: {error}"),
            }
        }
    }
}

/// Translates a core error into an API error.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::Internal(msg) => ApiError::Internal {
            message: format!("Internal error: {msg}"),
        },
    }
}

/// Translates a store error into an API error.
///
/// `TransitionConflict` translates to a retryable conflict here;
/// lifecycle code treats it as "already handled" *before* translation,
/// so a conflict that reaches callers really was a lost race.
#[must_use]
pub fn translate_store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::AuctionNotFound(auction_id) => ApiError::NotFound { auction_id },
        StoreError::VersionConflict { .. } => ApiError::StoreConflict {
            message: String::from("The auction changed while the bid was being admitted"),
        },
        StoreError::TransitionConflict { expected, actual } => ApiError::StoreConflict {
            message: format!(
                "Auction status changed concurrently: expected '{expected}', found '{actual}'"
            ),
        },
        StoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        StoreError::Persistence(persistence_err) => ApiError::Internal {
            message: format!("Storage failure: {persistence_err}"),
        },
    }
}
