//! Timestamp helpers shared by the repositories

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a timestamp the way every table stores it
pub fn to_db_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored RFC3339 timestamp, falling back to now
///
/// Rows written by this crate always carry RFC3339 timestamps; the fallback
/// only matters for rows edited by hand.
pub fn parse_datetime_or_now(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_db_timestamp_round_trip() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 9, 8, 30, 0).unwrap();
        let stored = to_db_timestamp(ts);
        assert_eq!(stored, "2025-03-09T08:30:00.000000Z");
        assert_eq!(parse_datetime_or_now(&stored), ts);
        assert_eq!(parse_datetime_or_now("2025-03-09T10:30:00+02:00"), ts);
    }

    #[test]
    fn test_garbage_falls_back_to_now() {
        let before = Utc::now();
        let parsed = parse_datetime_or_now("last tuesday");
        assert!(parsed >= before && parsed <= Utc::now());
    }

    #[test]
    fn test_db_timestamps_sort_chronologically() {
        let earlier = to_db_timestamp(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        let later = to_db_timestamp(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 1).unwrap());
        assert!(earlier < later);
    }
}
