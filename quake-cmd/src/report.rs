//! Plain text rendering of result sets for the terminal.

use quake_data::aggregation::{fill_gaps, DailyBucket};
use quake_feed::event::DATE_TEXT_FORMAT;
use quake_feed::EventRecord;

/// Widest bar drawn for a single day.
const BAR_WIDTH: usize = 40;

/// One table row: date, time, magnitude, type, location, region.
pub fn event_line(event: &EventRecord) -> String {
    let magnitude = event
        .magnitude()
        .map_or_else(|| "-".to_string(), |m| format!("{:.1}", m));
    format!(
        "{} {} {:>5} {:<14} {} | {}",
        event.date_text(),
        event.time_text(),
        magnitude,
        event.event_type(),
        event.location(),
        event.region()
    )
}

/// One line per day from the first to the last recorded day, with a bar
/// scaled to the busiest day.
pub fn daily_lines(bucket: &DailyBucket) -> Vec<String> {
    let series = fill_gaps(bucket);
    let busiest = series.iter().map(|(_, count)| *count).max().unwrap_or(0).max(1);
    series
        .iter()
        .map(|(date, count)| {
            let bar = "#".repeat((count * BAR_WIDTH).div_ceil(busiest));
            format!("{} {:>5} {}", date.format(DATE_TEXT_FORMAT), count, bar)
        })
        .collect()
}
