// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Outbound notification job kinds.
//!
//! Each triggering event maps to a kind tag stored on the job row, so
//! operators can see at a glance what a stuck job was trying to say.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The kind of outbound notification a job carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Confirmation to a sponsor that their bid was committed.
    BidConfirmation,
    /// New-bid alert to the event host.
    NewBidHostNotification,
    /// Congratulation to the winning sponsor.
    AuctionWon,
    /// End-of-auction summary to the host, including winner contact.
    AuctionEndedWithWinner,
    /// End-of-auction notice to the host when nobody bid.
    AuctionEndedNoBids,
}

impl JobKind {
    /// Returns the string representation stored on job rows.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BidConfirmation => "bid_confirmation",
            Self::NewBidHostNotification => "new_bid_host_notification",
            Self::AuctionWon => "auction_won",
            Self::AuctionEndedWithWinner => "auction_ended_with_winner",
            Self::AuctionEndedNoBids => "auction_ended_no_bids",
        }
    }

    /// Returns the default delivery priority for this kind.
    ///
    /// End-of-auction messages outrank per-bid traffic so winners and
    /// hosts hear about outcomes first under load.
    #[must_use]
    pub const fn default_priority(&self) -> i32 {
        match self {
            Self::AuctionWon | Self::AuctionEndedWithWinner => 10,
            Self::NewBidHostNotification => 8,
            Self::BidConfirmation => 7,
            Self::AuctionEndedNoBids => 5,
        }
    }

    fn parse_str(s: &str) -> Option<Self> {
        match s {
            "bid_confirmation" => Some(Self::BidConfirmation),
            "new_bid_host_notification" => Some(Self::NewBidHostNotification),
            "auction_won" => Some(Self::AuctionWon),
            "auction_ended_with_winner" => Some(Self::AuctionEndedWithWinner),
            "auction_ended_no_bids" => Some(Self::AuctionEndedNoBids),
            _ => None,
        }
    }
}

impl FromStr for JobKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s).ok_or_else(|| format!("unknown job kind: '{s}'"))
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_string_round_trip() {
        let kinds = vec![
            JobKind::BidConfirmation,
            JobKind::NewBidHostNotification,
            JobKind::AuctionWon,
            JobKind::AuctionEndedWithWinner,
            JobKind::AuctionEndedNoBids,
        ];

        for kind in kinds {
            assert_eq!(JobKind::from_str(kind.as_str()), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(JobKind::from_str("carrier_pigeon").is_err());
    }

    #[test]
    fn test_end_of_auction_kinds_outrank_bid_traffic() {
        assert!(
            JobKind::AuctionWon.default_priority() > JobKind::BidConfirmation.default_priority()
        );
        assert!(
            JobKind::AuctionEndedWithWinner.default_priority()
                > JobKind::NewBidHostNotification.default_priority()
        );
    }
}
