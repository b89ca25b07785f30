//! Timestamp formatting utilities
//!
//! Both formats use local wall-clock time: lines carry millisecond precision,
//! file names carry the calendar date.

use chrono::{DateTime, Local, TimeZone};

/// `2025-01-08 10:30:45.123`
pub const LINE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// `2025-01-08`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp field of a log line, without brackets
#[must_use]
pub fn format_line_timestamp<Tz: TimeZone>(datetime: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    datetime.format(LINE_TIMESTAMP_FORMAT).to_string()
}

/// Calendar date used to name log files
#[must_use]
pub fn date_stamp<Tz: TimeZone>(datetime: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    datetime.format(DATE_FORMAT).to_string()
}

#[must_use]
pub fn today() -> String {
    date_stamp(&Local::now())
}
