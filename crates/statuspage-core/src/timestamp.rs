//! Timestamp normalization for event and update times.
//!
//! Stored timestamps are loose strings in the canonical form
//! `YYYY-MM-DD HH:MM`, optionally followed by seconds and a ` UTC` (or `Z`)
//! suffix. Anything that does not match is treated as absent, never as an
//! error.
//!
//! Normalized values are fixed-width and zero-padded, so lexicographic
//! order on them is chronological order.

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// Canonical stored form, as written by editors.
pub const STORED_FORMAT: &str = "%Y-%m-%d %H:%M";

fn timestamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4}-\d{2}-\d{2})[ T](\d{2}:\d{2})(:\d{2}(?:\.\d+)?)?( ?UTC|Z)?$")
            .expect("timestamp regex must compile")
    })
}

/// Whether `raw` matches the stored timestamp pattern.
pub fn is_valid(raw: &str) -> bool {
    timestamp_re().is_match(raw.trim())
}

/// Normalize a stored timestamp to an ISO-8601 instant string.
///
/// - `2024-01-01 10:00` → `2024-01-01T10:00`
/// - `2024-01-01 10:00 UTC` → `2024-01-01T10:00:00Z`
/// - `2024-01-01 10:00:30 UTC` → `2024-01-01T10:00:30Z`
///
/// Returns `None` for anything that does not match the pattern.
pub fn normalize(raw: &str) -> Option<String> {
    let caps = timestamp_re().captures(raw.trim())?;
    let mut normalized = format!("{}T{}", &caps[1], &caps[2]);
    let seconds = caps.get(3).map(|m| m.as_str());
    let zoned = caps.get(4).is_some();

    match (seconds, zoned) {
        (Some(seconds), true) => {
            normalized.push_str(seconds);
            normalized.push('Z');
        }
        (Some(seconds), false) => normalized.push_str(seconds),
        (None, true) => normalized.push_str(":00Z"),
        (None, false) => {}
    }
    Some(normalized)
}

/// Complete a [`normalize`]d value to an RFC 3339 date-time.
///
/// Missing seconds become `:00` and naive values are read as UTC:
/// `2024-01-01T10:00` becomes `2024-01-01T10:00:00Z`.
pub fn complete_rfc3339(normalized: &str) -> String {
    let local = normalized.strip_suffix('Z').unwrap_or(normalized);
    let mut completed = local.to_string();
    if local.len() == "YYYY-MM-DDTHH:MM".len() {
        completed.push_str(":00");
    }
    completed.push('Z');
    completed
}

/// Parse a stored timestamp as a UTC instant.
///
/// Values without a zone suffix are read as UTC. Pattern matches with
/// out-of-range fields (month 13, hour 25) yield `None`.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let caps = timestamp_re().captures(raw.trim())?;
    let seconds = caps
        .get(3)
        .map(|m| &m.as_str()[..3])
        .unwrap_or(":00");
    let text = format!("{} {}{}", &caps[1], &caps[2], seconds);
    NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Whether a stored timestamp lies strictly after `now`.
///
/// Unparseable values are never "in the future".
pub fn is_after(raw: &str, now: DateTime<Utc>) -> bool {
    parse_instant(raw).is_some_and(|instant| instant > now)
}

/// Format an instant in the canonical stored form (`YYYY-MM-DD HH:MM`).
pub fn format_stored(instant: DateTime<Utc>) -> String {
    instant.format(STORED_FORMAT).to_string()
}

/// Human-facing generation time, e.g. `2024-01-01 10:00 UTC`.
pub fn format_display(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Feed-level `updated` value (RFC 3339, second precision).
pub fn format_feed(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
