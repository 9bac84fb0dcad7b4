//! # Temporal Types — UTC-Only Timestamps
//!
//! `Timestamp` is the only time type stored in transition logs. It is
//! taken from the system clock in UTC, truncated to seconds, and renders as
//! `YYYY-MM-DDTHH:MM:SSZ`.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Render as ISO8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn truncation_drops_subseconds() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 15, 12, 30, 45).unwrap();
        let truncated = truncate_to_seconds(dt.with_nanosecond(123_456_789).unwrap());
        assert_eq!(truncated, dt);
        assert_eq!(Timestamp(truncated).to_iso8601(), "2026-01-15T12:30:45Z");
    }

    #[test]
    fn now_renders_with_z_suffix() {
        let rendered = Timestamp::now().to_string();
        assert_eq!(rendered.len(), "2026-01-15T12:30:45Z".len());
        assert!(rendered.ends_with('Z'));
    }

    #[test]
    fn serde_round_trip_keeps_seconds() {
        let ts = Timestamp::now();
        let json = serde_json::to_string(&ts).unwrap();
        assert!(json.ends_with("Z\""));
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn later_clock_reads_never_sort_first() {
        let earlier = Timestamp::now();
        let later = Timestamp::now();
        assert!(earlier <= later);
    }
}
