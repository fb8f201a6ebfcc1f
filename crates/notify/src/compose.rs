// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Outbound message composition.
//!
//! One function per notification kind. Bodies are plain text; the
//! injected mail transport decides how to render them.

/// A composed message ready to enqueue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailContent {
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Confirmation to a sponsor that their bid was committed.
#[must_use]
pub fn bid_confirmation(
    item_name: &str,
    amount: i64,
    placed_at: &str,
    end_time: &str,
) -> MailContent {
    MailContent {
        subject: format!("Bid Confirmation - {item_name}"),
        body: format!(
            "Your bid has been placed.\n\n\
             Item: {item_name}\n\
             Your bid: {amount}\n\
             Placed at: {placed_at}\n\
             Auction ends: {end_time}\n"
        ),
    }
}

/// New-bid alert to the event host.
#[must_use]
pub fn new_bid_host_notification(
    item_name: &str,
    amount: i64,
    placed_at: &str,
    end_time: &str,
) -> MailContent {
    MailContent {
        subject: format!("New Bid on {item_name}"),
        body: format!(
            "A new bid has been placed on your auction item \"{item_name}\".\n\n\
             Bid amount: {amount}\n\
             Placed at: {placed_at}\n\
             Auction ends: {end_time}\n"
        ),
    }
}

/// Congratulation to the winning sponsor.
#[must_use]
pub fn auction_won(item_name: &str, amount: i64, end_time: &str) -> MailContent {
    MailContent {
        subject: format!("Auction Won - {item_name}"),
        body: format!(
            "Congratulations! You are the winning bidder for \"{item_name}\".\n\n\
             Winning bid: {amount}\n\
             Auction ended: {end_time}\n\n\
             The event host will contact you with further details.\n"
        ),
    }
}

/// End-of-auction summary to the host, including winner contact.
#[must_use]
pub fn auction_ended_with_winner(
    item_name: &str,
    amount: i64,
    winner_email: &str,
    end_time: &str,
) -> MailContent {
    MailContent {
        subject: format!("Auction Ended - {item_name}"),
        body: format!(
            "The auction for \"{item_name}\" has ended.\n\n\
             Winning bid: {amount}\n\
             Winner contact: {winner_email}\n\
             Ended at: {end_time}\n\n\
             Please contact the winner to arrange delivery and payment.\n"
        ),
    }
}

/// End-of-auction notice to the host when nobody bid.
#[must_use]
pub fn auction_ended_no_bids(item_name: &str, end_time: &str) -> MailContent {
    MailContent {
        subject: format!("Auction Ended - {item_name}"),
        body: format!(
            "The auction for \"{item_name}\" has ended.\n\n\
             No bids were placed on this item.\n\
             Ended at: {end_time}\n"
        ),
    }
}
