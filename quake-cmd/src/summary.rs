//! Per-day summary of an exported CSV file.

use crate::{csv_file, report};
use log::warn;
use quake_data::aggregation::{daily_counts, date_span, is_chartable};
use quake_data::filter;
use quake_feed::event::DATE_TEXT_FORMAT;
use quake_utils::dates::date_from_day_number;
use std::path::Path;

pub fn run_summary(input: &Path, region_filter: &str) -> anyhow::Result<()> {
    let events = filter::apply(&csv_file::import(input)?, region_filter);
    if events.is_empty() {
        println!("No events in {}", input.display());
        return Ok(());
    }

    let (first, last) = date_span(&events)?;
    let show = |day: i64| {
        date_from_day_number(day)
            .map(|date| date.format(DATE_TEXT_FORMAT).to_string())
            .unwrap_or_else(|| day.to_string())
    };
    println!(
        "{} events from {} to {}",
        events.len(),
        show(first),
        show(last)
    );

    let bucket = daily_counts(&events);
    if !is_chartable(&bucket) {
        warn!("All events fall on one day; nothing to chart");
    }
    for line in report::daily_lines(&bucket) {
        println!("{}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quake_feed::EventRecord;

    #[test]
    fn test_summary_of_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Earthquakes_2024-03-10.csv");
        let quake = |millis: i64, magnitude: Option<f64>, place: &str| {
            EventRecord::new("earthquake", millis, magnitude, Some(place.into()), None).unwrap()
        };
        let events = vec![
            quake(1_710_079_530_000, Some(4.6), "x, Alaska"),
            quake(1_710_179_530_000, None, "y, Nevada"),
        ];
        csv_file::export(&events, &path).unwrap();
        assert!(run_summary(&path, "").is_ok());
        assert!(run_summary(&path, "alaska").is_ok());
        assert!(run_summary(&path, "nowhere").is_ok());
    }

    #[test]
    fn test_summary_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "earthquake,a,b,1000\n").unwrap();
        assert!(run_summary(&path, "").is_err());
    }
}
