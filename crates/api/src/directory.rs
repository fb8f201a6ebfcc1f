// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Collaborator lookups.
//!
//! Event and bidder metadata are owned by external systems (the event
//! catalog and the identity layer). The service consumes them through
//! these traits; deployments plug in real clients, and the in-memory
//! registry serves development, tests, and the bundled server binary.

use hive_auction_domain::{BidderContact, BidderId, EventDetails, EventId};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Read access to event metadata.
pub trait EventDirectory: Send + Sync {
    /// Looks up an event's metadata by id.
    fn event(&self, id: &EventId) -> Option<EventDetails>;
}

/// Read access to bidder contact details.
pub trait BidderDirectory: Send + Sync {
    /// Looks up a bidder's contact details by id.
    fn contact(&self, id: &BidderId) -> Option<BidderContact>;
}

/// In-memory registry of events and bidder contacts.
///
/// A stand-in for the external event catalog and identity service.
#[derive(Default)]
pub struct InMemoryDirectory {
    events: RwLock<HashMap<String, EventDetails>>,
    bidders: RwLock<HashMap<String, BidderContact>>,
}

impl InMemoryDirectory {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) an event's metadata.
    pub fn register_event(&self, details: EventDetails) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(details.id.value().to_string(), details);
    }

    /// Registers (or replaces) a bidder's contact details.
    pub fn register_bidder(&self, contact: BidderContact) {
        self.bidders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(contact.id.value().to_string(), contact);
    }
}

impl EventDirectory for InMemoryDirectory {
    fn event(&self, id: &EventId) -> Option<EventDetails> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id.value())
            .cloned()
    }
}

impl BidderDirectory for InMemoryDirectory {
    fn contact(&self, id: &BidderId) -> Option<BidderContact> {
        self.bidders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id.value())
            .cloned()
    }
}
