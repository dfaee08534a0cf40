// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp formatting and parsing helpers.
//!
//! All persisted timestamps use the UTC string format
//! `%Y-%m-%dT%H:%M:%S%.3fZ`, so lexicographic comparison in SQL equals
//! chronological comparison.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Storage format for all persisted timestamps.
pub const STORAGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Format a UTC timestamp in the storage format.
pub fn format_utc(dt: DateTime<Utc>) -> String {
    dt.format(STORAGE_FORMAT).to_string()
}

/// Parse a timestamp previously written by [`format_utc`].
pub fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, STORAGE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Lenient ISO 8601 parser for datetimes coming out of the LLM.
///
/// Accepts RFC 3339, the storage format, and common naive variants.
/// Naive datetimes carry no zone and are interpreted in local time.
pub fn parse_flexible(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = parse_utc(s) {
        return Some(dt);
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return local_to_utc(naive);
        }
    }

    // Date-only input means local midnight.
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return local_to_utc(date.and_hms_opt(0, 0, 0)?);
    }

    None
}

fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    // `earliest` resolves DST gaps/folds deterministically.
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
