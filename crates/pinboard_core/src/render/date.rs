//! Creation date labels.

use chrono::{DateTime, Local, TimeZone};

/// Formats epoch milliseconds as `Oct 16, 2026` in the viewer's time zone.
pub fn format_created_at(created_at_ms: i64) -> String {
    format_created_at_in(created_at_ms, &Local)
}

/// Formats epoch milliseconds as `Oct 16, 2026` in `tz`.
///
/// Out-of-range timestamps render as an empty label.
pub fn format_created_at_in<Tz: TimeZone>(created_at_ms: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match DateTime::from_timestamp_millis(created_at_ms) {
        Some(utc) => utc.with_timezone(tz).format("%b %d, %Y").to_string(),
        None => String::new(),
    }
}
