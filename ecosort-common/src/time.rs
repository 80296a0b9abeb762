//! Timestamp utilities
//!
//! History rows carry the server's local wall-clock date and time, split into
//! two columns for display.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Display format for stored dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Display format for stored times
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Current local wall-clock timestamp, truncated to whole seconds
pub fn now_local() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.date().and_time(truncate_to_seconds(now.time()))
}

/// Drop the sub-second part of a time of day
pub fn truncate_to_seconds(time: NaiveTime) -> NaiveTime {
    use chrono::Timelike;
    time.with_nanosecond(0).unwrap_or(time)
}

/// Format a date as `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Format a time of day as `HH:MM:SS`
pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}
