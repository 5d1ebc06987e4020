// Utility functions
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rand::Rng;
use std::time::Duration;

/// Converts an RFC 3339 string into `DateTime<Utc>`, if possible.
pub fn parse_datetime(date_str: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date_str.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parses a `dd.mm.yyyy` publish date as midnight UTC.
pub fn parse_day_month_year(date_str: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(date_str.trim(), "%d.%m.%Y")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

pub fn current_year(override_year: Option<i32>) -> i32 {
    override_year.unwrap_or_else(|| Utc::now().year())
}

/// Random pause between pages, within `[min_ms, max_ms]`.
pub fn random_delay(min_ms: u64, max_ms: u64) -> Duration {
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rand::rng().random_range(min_ms..=max_ms))
}
