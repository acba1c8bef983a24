//! Derived views over a result set.
//!
//! Nothing in this crate mutates its input; every function hands back a
//! new value that the caller owns.

/// Narrowing a result set by region.
pub mod filter {
    use quake_feed::EventRecord;

    /// Events whose region contains `substring`, ignoring case, in input
    /// order. An empty substring keeps every event.
    pub fn apply(events: &[EventRecord], substring: &str) -> Vec<EventRecord> {
        if substring.is_empty() {
            return events.to_vec();
        }
        let needle = substring.to_lowercase();
        events
            .iter()
            .filter(|event| event.region().to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

}

/// Per-day event counts for charting.
pub mod aggregation {
    use chrono::{Local, NaiveDate, TimeZone};
    use log::debug;
    use quake_feed::query_window::DateRange;
    use quake_feed::EventRecord;
    use quake_utils::dates::{date_from_day_number, day_number};
    use std::collections::BTreeMap;
    use thiserror::Error;

    /// Day number (days since 1970-01-01) to number of events on that day.
    pub type DailyBucket = BTreeMap<i64, usize>;

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum AggregateError {
        #[error("result set is empty")]
        EmptySet,
    }

    /// Count events per calendar day in `tz`.
    pub fn daily_counts_in<Tz: TimeZone>(events: &[EventRecord], tz: &Tz) -> DailyBucket {
        let mut bucket = DailyBucket::new();
        for event in events {
            *bucket.entry(day_number(&event.date_in(tz))).or_insert(0) += 1;
        }
        bucket
    }

    /// Count events per local calendar day.
    pub fn daily_counts(events: &[EventRecord]) -> DailyBucket {
        daily_counts_in(events, &Local)
    }

    /// First and last day number present in `events`, in `tz`.
    pub fn date_span_in<Tz: TimeZone>(
        events: &[EventRecord],
        tz: &Tz,
    ) -> Result<(i64, i64), AggregateError> {
        let mut days = events.iter().map(|event| day_number(&event.date_in(tz)));
        let first = days.next().ok_or(AggregateError::EmptySet)?;
        Ok(days.fold((first, first), |(min, max), day| {
            (min.min(day), max.max(day))
        }))
    }

    pub fn date_span(events: &[EventRecord]) -> Result<(i64, i64), AggregateError> {
        date_span_in(events, &Local)
    }

    /// A chart needs at least two distinct days to draw an axis.
    pub fn is_chartable(bucket: &DailyBucket) -> bool {
        bucket.len() >= 2
    }

    /// Continuous series from the first to the last day of `bucket`, with
    /// zero for days that have no events.
    pub fn fill_gaps(bucket: &DailyBucket) -> Vec<(NaiveDate, usize)> {
        let bounds = bucket
            .keys()
            .next()
            .zip(bucket.keys().next_back())
            .and_then(|(first, last)| {
                date_from_day_number(*first).zip(date_from_day_number(*last))
            });
        let Some((start, end)) = bounds else {
            return Vec::new();
        };
        let series: Vec<(NaiveDate, usize)> = DateRange(start, end)
            .map(|date| {
                let count = bucket.get(&day_number(&date)).copied().unwrap_or(0);
                (date, count)
            })
            .collect();
        debug!(
            "Filled {} days from {} recorded days",
            series.len(),
            bucket.len()
        );
        series
    }

}
