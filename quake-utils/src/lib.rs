//! Shared utility functions for the quake crates.

/// Date utility functions
pub mod dates {
    use chrono::{Duration, NaiveDate};

    /// Calendar date that day number 0 refers to (1970-01-01).
    pub fn day_zero() -> NaiveDate {
        NaiveDate::default()
    }

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
    }

    /// Days elapsed since 1970-01-01. Negative for earlier dates.
    pub fn day_number(date: &NaiveDate) -> i64 {
        (*date - day_zero()).num_days()
    }

    /// Inverse of [`day_number`]; `None` when the result leaves chrono's range.
    pub fn date_from_day_number(day: i64) -> Option<NaiveDate> {
        day_zero().checked_add_signed(Duration::try_days(day)?)
    }

}
