// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Validation of auction terms at creation time.

use crate::auction::AuctionTerms;
use crate::error::DomainError;

/// Validates auction terms before an auction is created.
///
/// Terms are immutable after creation, so this is the only point at
/// which they are checked.
///
/// # Errors
///
/// Returns an error if:
/// - The item name or description is empty or whitespace
/// - The starting bid, bid increment, or duration is not positive
pub fn validate_terms(terms: &AuctionTerms) -> Result<(), DomainError> {
    if terms.item_name.trim().is_empty() {
        return Err(DomainError::InvalidItemName(
            "item name must not be empty".to_string(),
        ));
    }

    if terms.item_description.trim().is_empty() {
        return Err(DomainError::InvalidItemDescription(
            "item description must not be empty".to_string(),
        ));
    }

    if terms.starting_bid <= 0 {
        return Err(DomainError::InvalidStartingBid {
            amount: terms.starting_bid,
        });
    }

    if terms.bid_increment <= 0 {
        return Err(DomainError::InvalidBidIncrement {
            amount: terms.bid_increment,
        });
    }

    if terms.duration_minutes <= 0 {
        return Err(DomainError::InvalidDuration {
            minutes: terms.duration_minutes,
        });
    }

    Ok(())
}
