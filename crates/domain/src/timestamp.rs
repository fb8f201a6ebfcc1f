// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Timestamp conversion at system boundaries.
//!
//! Timestamps are `OffsetDateTime` inside the engine and ISO 8601
//! strings in the database and on the wire. These helpers are the only
//! place that conversion happens.

use crate::error::DomainError;
use time::OffsetDateTime;
use time::format_description::well_known::Iso8601;

/// Formats a timestamp as an ISO 8601 string.
///
/// # Errors
///
/// Returns an error if the timestamp cannot be represented in the
/// default ISO 8601 layout.
pub fn format_timestamp(timestamp: OffsetDateTime) -> Result<String, DomainError> {
    timestamp
        .format(&Iso8601::DEFAULT)
        .map_err(|e| DomainError::TimestampFormat {
            error: e.to_string(),
        })
}

/// Parses an ISO 8601 string back into a timestamp.
///
/// # Errors
///
/// Returns an error if the string is not valid ISO 8601.
pub fn parse_timestamp(value: &str) -> Result<OffsetDateTime, DomainError> {
    OffsetDateTime::parse(value, &Iso8601::DEFAULT).map_err(|e| DomainError::TimestampParse {
        value: value.to_string(),
        error: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn test_round_trip() {
        let ts: OffsetDateTime = OffsetDateTime::UNIX_EPOCH + Duration::days(20_000);
        let formatted: String = format_timestamp(ts).unwrap();
        let parsed: OffsetDateTime = parse_timestamp(&formatted).unwrap();
        assert_eq!(ts, parsed);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("not-a-timestamp").is_err());
    }
}
