//! # Temporal Types: ISO-8601 Timestamps
//!
//! Defines `Timestamp`, the `createdAt` / `updatedAt` value carried by every
//! stored resource. Records arrive as strings such as
//! `2024-07-24T10:49:01.854Z`; the type checks RFC 3339 syntax, exposes the
//! instant in UTC, and keeps the original text so that a typed record
//! serializes back to the exact input.
//!
//! Equality and ordering compare instants, not text:
//! `2024-07-24T12:49:01+02:00` equals `2024-07-24T10:49:01Z`.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// An RFC 3339 timestamp, normalized to UTC for comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp {
    text: String,
    instant: DateTime<Utc>,
}

impl Timestamp {
    /// Current UTC time with millisecond precision and a `Z` suffix.
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    /// Build a timestamp from a `DateTime<Utc>`, rendered with milliseconds
    /// and a `Z` suffix (`2024-07-24T10:49:01.854Z`).
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self {
            text: dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            instant: dt,
        }
    }

    /// Parse an RFC 3339 / ISO-8601 string. Any offset is accepted and
    /// converted to UTC; the text is kept verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimestamp`] if the string is not
    /// valid RFC 3339.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| ValidationError::InvalidTimestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            text: s.to_string(),
            instant: dt.with_timezone(&Utc),
        })
    }

    /// Returns `true` if `s` is a valid RFC 3339 timestamp.
    pub fn is_valid(s: &str) -> bool {
        DateTime::parse_from_rfc3339(s).is_ok()
    }

    /// Access the instant in UTC.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.instant
    }

    /// Access the text exactly as supplied.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant.cmp(&other.instant)
    }
}

impl Hash for Timestamp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.instant.hash(state);
    }
}

impl TryFrom<String> for Timestamp {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> Self {
        ts.text
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
