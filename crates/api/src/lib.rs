// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary layer for the Hive Auction engine.
//!
//! The [`AuctionService`] is the single authorized path into the
//! engine: it orchestrates bid admission, lifecycle transitions, and
//! notification fan-out over the store, the pure core, and the
//! notification layer. Transport frameworks call these functions and
//! map [`ApiError`] kinds to their own status codes.
//!
//! Identity is trusted, not verified: callers supply bidder ids already
//! authenticated by the identity collaborator, and event/host metadata
//! comes from the [`EventDirectory`].

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

mod directory;
mod error;
mod request_response;
mod service;

#[cfg(test)]
mod tests;

pub use directory::{BidderDirectory, EventDirectory, InMemoryDirectory};
pub use error::{ApiError, translate_core_error, translate_domain_error, translate_store_error};
pub use request_response::{
    AuctionInfo, CreateAuctionRequest, FailedJobInfo, GetAuctionResponse, PlaceBidRequest,
    PlaceBidResponse, QueueStatusResponse, RegisterEventRequest, RetryFailedResponse,
};
pub use service::AuctionService;
