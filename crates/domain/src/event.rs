// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Collaborator-supplied metadata about events and bidders.
//!
//! The event catalog and identity layer are external systems. The
//! engine only needs the host identity (to block self-bidding) and
//! contact details (for notification text), so that is all these
//! types carry.

use crate::types::{BidderId, EventId};

/// Metadata about the event that owns an auction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetails {
    /// The event's identity in the external catalog.
    pub id: EventId,
    /// Display title used in notification text.
    pub title: String,
    /// The bidder identity of the event host.
    pub host: BidderId,
    /// Host display name.
    pub host_name: String,
    /// Host contact address for outbound notifications.
    pub host_email: String,
}

impl EventDetails {
    /// Creates event metadata.
    #[must_use]
    pub const fn new(
        id: EventId,
        title: String,
        host: BidderId,
        host_name: String,
        host_email: String,
    ) -> Self {
        Self {
            id,
            title,
            host,
            host_name,
            host_email,
        }
    }
}

/// Contact details for a bidder, supplied by the identity layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidderContact {
    /// The bidder's identity.
    pub id: BidderId,
    /// Display name.
    pub name: String,
    /// Contact address for outbound notifications.
    pub email: String,
}

impl BidderContact {
    /// Creates bidder contact details.
    #[must_use]
    pub const fn new(id: BidderId, name: String, email: String) -> Self {
        Self { id, name, email }
    }
}
