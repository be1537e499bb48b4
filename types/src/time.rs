//! Timestamp type used throughout the protocol.
//!
//! Timestamps are Unix epoch seconds (UTC). The canonical wire and hash
//! representation is RFC 3339 (`2026-08-05T12:00:00Z`); formatting the same
//! seconds value must yield the same string on every node, because the
//! string participates in the block hash preimage.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: i64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc().unix_timestamp())
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }

    /// RFC 3339 rendering — the canonical protocol form.
    pub fn to_rfc3339(&self) -> String {
        match OffsetDateTime::from_unix_timestamp(self.0) {
            Ok(dt) => dt
                .format(&Rfc3339)
                .unwrap_or_else(|_| format!("{}s", self.0)),
            Err(_) => format!("{}s", self.0),
        }
    }

    /// Parse an RFC 3339 string back into a timestamp (sub-second precision
    /// is truncated — the protocol works in whole seconds).
    pub fn parse_rfc3339(s: &str) -> Result<Self, time::error::Parse> {
        let dt = OffsetDateTime::parse(s, &Rfc3339)?;
        Ok(Self(dt.unix_timestamp()))
    }

}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Timestamp::parse_rfc3339(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_renders_as_rfc3339() {
        assert_eq!(Timestamp::EPOCH.to_rfc3339(), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn rfc3339_round_trip() {
        let ts = Timestamp::new(1_767_225_600);
        let rendered = ts.to_rfc3339();
        let parsed = Timestamp::parse_rfc3339(&rendered).unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn formatting_is_deterministic() {
        let ts = Timestamp::new(1_700_000_123);
        assert_eq!(ts.to_rfc3339(), ts.to_rfc3339());
    }

    #[test]
    fn serde_uses_rfc3339_string() {
        let ts = Timestamp::new(0);
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"1970-01-01T00:00:00Z\"");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn subsecond_input_truncates_to_seconds() {
        let parsed = Timestamp::parse_rfc3339("2026-01-01T00:00:00.123Z").unwrap();
        assert_eq!(parsed, Timestamp::new(1_767_225_600));
    }
}
