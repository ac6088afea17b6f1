//! Timestamp display helpers.

#[cfg(test)]
#[path = "time_test.rs"]
mod time_test;

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};

const SHORT_FORMAT: &str = "%-m/%-d/%y, %-I:%M %p";

/// Short `M/D/YY, h:mm AM` rendering of an RFC 3339 timestamp in the
/// viewer's local time zone. Unparseable input is returned unchanged.
pub fn format_short_timestamp(raw: &str) -> String {
    format_short_timestamp_in(raw, &Local)
}

/// [`format_short_timestamp`] against an explicit zone.
pub fn format_short_timestamp_in<Tz>(raw: &str, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed.with_timezone(zone).format(SHORT_FORMAT).to_string(),
        Err(_) => raw.to_owned(),
    }
}
