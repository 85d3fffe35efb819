//! Timestamp normalization
//!
//! Resolves the heterogeneous time encodings found on persisted records into a
//! single [`Instant`]. Rules, in order:
//! 1. a numeric `timestamp` is epoch milliseconds, used as-is
//! 2. a string `timestamp` is parsed as a date/time; failures fall through
//! 3. the record `id`: numeric (or all-digit text) is epoch milliseconds,
//!    anything else is parsed as a date/time string
//!
//! Resolution never fails. A record matching none of the rules resolves to
//! [`Instant::INVALID`].

use crate::schema::{RawId, RawRecord, RawTimestamp};
use crate::types::Instant;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Naive date-time layouts accepted after RFC 3339 / RFC 2822
const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Offset-carrying layouts chrono's RFC 3339 parser rejects
const OFFSET_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Normalizer for record timestamps
#[derive(Debug, Clone, Copy)]
pub struct TimestampNormalizer {
    /// Zone used for date-time strings that carry no offset
    timezone: Tz,
}

impl Default for TimestampNormalizer {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl TimestampNormalizer {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Resolve a record's instant using the three-rule fallback
    pub fn resolve_instant(&self, record: &RawRecord) -> Instant {
        match &record.timestamp {
            Some(RawTimestamp::Millis(ms)) => return instant_from_f64(*ms),
            Some(RawTimestamp::Text(text)) => {
                if let Some(instant) = self.parse_datetime(text) {
                    return instant;
                }
            }
            Some(RawTimestamp::Other(_)) | None => {}
        }

        match &record.id {
            Some(RawId::Numeric(n)) => instant_from_f64(*n),
            Some(RawId::Text(text)) => self.resolve_id_text(text),
            None => Instant::INVALID,
        }
    }

    /// Parse a date/time string. Returns `None` when no accepted layout matches.
    pub fn parse_datetime(&self, text: &str) -> Option<Instant> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(Instant::from_datetime(dt.with_timezone(&Utc)));
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
            return Some(Instant::from_datetime(dt.with_timezone(&Utc)));
        }
        for format in OFFSET_DATETIME_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(trimmed, format) {
                return Some(Instant::from_datetime(dt.with_timezone(&Utc)));
            }
        }
        for format in NAIVE_DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
                // Skipped local times (DST gaps) have no instant
                return self
                    .timezone
                    .from_local_datetime(&naive)
                    .earliest()
                    .map(|dt| Instant::from_datetime(dt.with_timezone(&Utc)));
            }
        }
        // Date-only strings are midnight UTC
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Instant::from_datetime(Utc.from_utc_datetime(&naive)));
        }

        None
    }

    fn resolve_id_text(&self, text: &str) -> Instant {
        let trimmed = text.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return trimmed
                .parse::<i64>()
                .map(Instant::from_millis)
                .unwrap_or(Instant::INVALID);
        }
        self.parse_datetime(trimmed).unwrap_or(Instant::INVALID)
    }
}

/// Epoch milliseconds from a JSON number; fractions truncate toward zero
fn instant_from_f64(ms: f64) -> Instant {
    if !ms.is_finite() {
        return Instant::INVALID;
    }
    let truncated = ms.trunc();
    if truncated.abs() > crate::types::MAX_EPOCH_MILLIS as f64 {
        return Instant::INVALID;
    }
    Instant::from_millis(truncated as i64)
}
