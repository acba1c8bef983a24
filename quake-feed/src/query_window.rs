use crate::error::WindowError;
use chrono::{DateTime, FixedOffset, Months, NaiveDate, NaiveTime, TimeDelta};
use quake_utils::dates::format_date;
use std::mem::replace;

/// Date-time layout of the `starttime`/`endtime` query parameters.
pub const QUERY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// How far back a window may start, in months.
pub const MAX_LOOKBACK_MONTHS: u32 = 120;

/// A date range iterator that yields each date from the start date
/// through the end date (inclusive).
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct DateRange(pub NaiveDate, pub NaiveDate);

impl Iterator for DateRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 <= self.1 {
            let next = self.0.succ_opt()?;
            Some(replace(&mut self.0, next))
        } else {
            None
        }
    }
}

/// Inclusive range of calendar days the feed is queried for.
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct QueryWindow {
    from: NaiveDate,
    to: NaiveDate,
}

impl QueryWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<QueryWindow, WindowError> {
        if from > to {
            return Err(WindowError::Inverted { from, to });
        }
        Ok(QueryWindow { from, to })
    }

    /// Window covering a single day.
    pub fn single_day(day: NaiveDate) -> QueryWindow {
        QueryWindow { from: day, to: day }
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    /// Start of `from` in the given offset.
    pub fn start_time(&self, offset: FixedOffset) -> DateTime<FixedOffset> {
        at(self.from, NaiveTime::MIN, offset)
    }

    /// Last second of `to` in the given offset.
    pub fn end_time(&self, offset: FixedOffset) -> DateTime<FixedOffset> {
        at(self.to, NaiveTime::MIN + TimeDelta::seconds(86_399), offset)
    }

    pub fn days(&self) -> DateRange {
        DateRange(self.from, self.to)
    }

    /// File name an export of this window is saved under by default.
    pub fn default_csv_file_name(&self) -> String {
        if self.from == self.to {
            format!("Earthquakes_{}.csv", format_date(&self.from))
        } else {
            format!(
                "Earthquakes_{}-{}.csv",
                format_date(&self.from),
                format_date(&self.to)
            )
        }
    }

    /// Reject windows reaching past `today` or starting more than ten years
    /// before it.
    pub fn check_selectable(&self, today: NaiveDate) -> Result<(), WindowError> {
        if self.to > today {
            return Err(WindowError::InFuture { to: self.to, today });
        }
        let earliest = today
            .checked_sub_months(Months::new(MAX_LOOKBACK_MONTHS))
            .unwrap_or(NaiveDate::MIN);
        if self.from < earliest {
            return Err(WindowError::TooOld {
                from: self.from,
                earliest,
            });
        }
        Ok(())
    }
}

fn at(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> DateTime<FixedOffset> {
    let local = date.and_time(time);
    let utc = local - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(utc, offset)
}
