//! Date helpers shared by the store, the backup scheduler and the CLI.

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};

/// Storage format for calendar dates (`period_start`, `period_end`).
pub const DATE_FMT: &str = "%Y-%m-%d";

/// Storage format for timestamps (`created_at`, `attempted_at`).
pub const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Compact form used inside generated file names.
pub const FILE_STAMP_FMT: &str = "%Y%m%d_%H%M%S";

/// Current local time truncated to whole seconds, so a stored timestamp
/// reads back equal to the in-memory value.
pub fn now_seconds() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FMT).ok()
}

pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FMT).ok()
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FMT).to_string()
}

pub fn file_stamp(ts: &NaiveDateTime) -> String {
    ts.format(FILE_STAMP_FMT).to_string()
}
