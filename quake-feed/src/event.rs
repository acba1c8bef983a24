use crate::error::RecordError;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Display format for event dates: "dd.MM.yyyy"
pub const DATE_TEXT_FORMAT: &str = "%d.%m.%Y";

/// Display format for event times: "HH:mm"
pub const TIME_TEXT_FORMAT: &str = "%H:%M";

/// Latest accepted event time: 9999-12-31T23:59:59.999Z. Any UTC offset
/// applied to it still lands on a representable date.
pub const MAX_EVENT_MILLIS: i64 = 253_402_300_799_999;

/// One seismic event as reported by the feed.
///
/// Built through [`EventRecord::new`], which rejects events without a type
/// and events whose time cannot be placed on the calendar. Everything shown
/// to a user (local time, date and time text, location, region) is derived
/// from the stored fields on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    magnitude: Option<f64>,
    place: Option<String>,
    occurred_at_millis: i64,
    event_type: String,
    title: Option<String>,
}

impl EventRecord {
    pub fn new(
        event_type: impl Into<String>,
        occurred_at_millis: i64,
        magnitude: Option<f64>,
        place: Option<String>,
        title: Option<String>,
    ) -> Result<EventRecord, RecordError> {
        let event_type = event_type.into();
        if event_type.is_empty() {
            return Err(RecordError::EmptyEventType);
        }
        if occurred_at_millis < 0 {
            return Err(RecordError::NegativeTime(occurred_at_millis));
        }
        if occurred_at_millis > MAX_EVENT_MILLIS {
            return Err(RecordError::TimeOutOfRange(occurred_at_millis));
        }
        Ok(EventRecord {
            magnitude,
            place,
            occurred_at_millis,
            event_type,
            title,
        })
    }

    pub fn magnitude(&self) -> Option<f64> {
        self.magnitude
    }

    pub fn place(&self) -> Option<&str> {
        self.place.as_deref()
    }

    pub fn occurred_at_millis(&self) -> i64 {
        self.occurred_at_millis
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Event time in UTC.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        // the constructor already checked the range
        DateTime::from_timestamp_millis(self.occurred_at_millis).unwrap_or_default()
    }

    /// Event time on the wall clock of `tz`.
    pub fn date_time_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDateTime {
        self.occurred_at().with_timezone(tz).naive_local()
    }

    /// Event time on the wall clock of the system time zone.
    pub fn local_date_time(&self) -> NaiveDateTime {
        self.date_time_in(&Local)
    }

    /// Calendar day of the event in `tz`.
    pub fn date_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        self.date_time_in(tz).date()
    }

    pub fn local_date(&self) -> NaiveDate {
        self.date_in(&Local)
    }

    pub fn date_text_in<Tz: TimeZone>(&self, tz: &Tz) -> String {
        self.date_time_in(tz).format(DATE_TEXT_FORMAT).to_string()
    }

    /// Local date as "dd.MM.yyyy".
    pub fn date_text(&self) -> String {
        self.date_text_in(&Local)
    }

    pub fn time_text_in<Tz: TimeZone>(&self, tz: &Tz) -> String {
        self.date_time_in(tz).format(TIME_TEXT_FORMAT).to_string()
    }

    /// Local time as "HH:mm".
    pub fn time_text(&self) -> String {
        self.time_text_in(&Local)
    }

    /// Text before the first comma of the place, or the whole place when it
    /// has no comma. Empty when the place is unknown.
    pub fn location(&self) -> &str {
        match self.place.as_deref() {
            Some(place) => place.split_once(',').map_or(place, |(head, _)| head),
            None => "",
        }
    }

    /// Trimmed text after the first comma of the place. Further commas stay
    /// in the region.
    pub fn region(&self) -> &str {
        self.place
            .as_deref()
            .and_then(|place| place.split_once(','))
            .map_or("", |(_, tail)| tail.trim())
    }
}
