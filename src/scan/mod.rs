//! Scan Status Tracker
//!
//! Two independent extraction paths, one per status encoding, producing the
//! same [`ScanStatus`](crate::domain::model::ScanStatus). Neither path caches
//! anything: status is recomputed from live tool output on every query.

pub mod json;
pub mod text;

use chrono::DateTime;

/// Normalize a reported scan timestamp
///
/// Unix seconds become RFC3339; an empty or zero value means "not set";
/// anything else is passed through as the tool printed it.
pub(crate) fn display_time(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "0" || raw == "-" {
        return None;
    }
    match raw.parse::<i64>() {
        Ok(secs) => DateTime::from_timestamp(secs, 0).map(|t| t.to_rfc3339()),
        Err(_) => Some(raw.to_string()),
    }
}
