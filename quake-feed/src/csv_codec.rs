//! Flat text export of a result set.
//!
//! One event per line, no header, fields in the order
//! `type,location,region,time,magnitude`. The time is written as the raw
//! millisecond timestamp so that reading it back never depends on the time
//! zone of the reading process. An unknown magnitude is written as `null`.
//!
//! Fields are not quoted. A region that itself contains a comma produces a
//! sixth field and the line is rejected on import.

use crate::error::{CsvError, CsvResult};
use crate::event::EventRecord;
use csv::{QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};
use log::debug;
use std::io::{Read, Write};

/// Number of fields on every line.
pub const CSV_ROW_LENGTH: usize = 5;

/// Magnitude text standing for an unknown magnitude.
pub const NULL_MAGNITUDE: &str = "null";

/// Write `events` to `writer`, one line each.
pub fn write_events<W: Write>(events: &[EventRecord], writer: W) -> CsvResult<()> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .from_writer(writer);
    for event in events {
        let time = event.occurred_at_millis().to_string();
        let magnitude = event
            .magnitude()
            .map_or_else(|| NULL_MAGNITUDE.to_string(), |m| m.to_string());
        wtr.write_record([
            event.event_type(),
            event.location(),
            event.region(),
            time.as_str(),
            magnitude.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render `events` as CSV text.
pub fn to_csv_string(events: &[EventRecord]) -> CsvResult<String> {
    let mut buf = Vec::new();
    write_events(events, &mut buf)?;
    String::from_utf8(buf).map_err(|e| CsvError::Io(std::io::Error::other(e)))
}

/// Read every line of `reader`. The first bad line fails the whole read.
pub fn read_events<R: Read>(reader: R) -> CsvResult<Vec<EventRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);
    let mut events = Vec::new();
    for row in rdr.records() {
        let record = row?;
        events.push(record_to_event(&record)?);
    }
    debug!("Read {} events from CSV", events.len());
    Ok(events)
}

/// Parse CSV text produced by [`to_csv_string`].
pub fn from_csv_str(text: &str) -> CsvResult<Vec<EventRecord>> {
    read_events(text.as_bytes())
}

fn record_to_event(record: &StringRecord) -> CsvResult<EventRecord> {
    let line = record.position().map_or(0, |p| p.line());
    if record.len() != CSV_ROW_LENGTH {
        return Err(CsvError::InvalidRow {
            line,
            expected: CSV_ROW_LENGTH,
            found: record.len(),
        });
    }
    let event_type = &record[0];
    let location = &record[1];
    let region = &record[2];
    let time = record[3]
        .parse::<i64>()
        .map_err(|_| CsvError::InvalidTime {
            line,
            value: record[3].to_string(),
        })?;
    let magnitude = match &record[4] {
        NULL_MAGNITUDE => None,
        s => Some(s.parse::<f64>().map_err(|_| CsvError::NumberFormat {
            line,
            value: s.to_string(),
        })?),
    };
    EventRecord::new(event_type, time, magnitude, join_place(location, region), None)
        .map_err(|source| CsvError::InvalidRecord { line, source })
}

/// Rebuild a place from its two halves.
fn join_place(location: &str, region: &str) -> Option<String> {
    match (location.is_empty(), region.is_empty()) {
        (true, true) => None,
        (_, true) => Some(location.to_string()),
        _ => Some(format!("{}, {}", location, region)),
    }
}
