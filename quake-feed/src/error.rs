/// Error types for the quake feed library
use chrono::NaiveDate;
use thiserror::Error;

/// A record that violates the domain model invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    /// Event time before the Unix epoch
    #[error("event time must not be negative (got {0} ms)")]
    NegativeTime(i64),

    /// Event time outside the representable calendar range
    #[error("event time {0} ms is out of range")]
    TimeOutOfRange(i64),

    /// Empty event type
    #[error("event type must not be empty")]
    EmptyEventType,
}

/// An invalid query window.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WindowError {
    #[error("window start {from} is after window end {to}")]
    Inverted { from: NaiveDate, to: NaiveDate },

    #[error("window end {to} is after today ({today})")]
    InFuture { to: NaiveDate, today: NaiveDate },

    #[error("window start {from} is earlier than {earliest}")]
    TooOld { from: NaiveDate, earliest: NaiveDate },
}

/// Failure of a single feed refresh. Everything except `InvalidConfig` is
/// worth retrying.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    /// Client settings that can never produce a request
    #[error("invalid feed configuration: {0}")]
    InvalidConfig(String),

    /// Network, DNS or timeout failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("feed answered with HTTP status {0}")]
    HttpStatus(u16),

    /// Response body does not have the expected shape
    #[error("malformed feed response: {0}")]
    MalformedFeed(String),
}

/// Failure while reading or writing the CSV format. Never retried.
#[derive(Error, Debug)]
pub enum CsvError {
    /// A line without exactly five fields
    #[error("line {line}: expected {expected} fields, found {found}")]
    InvalidRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// Magnitude that is neither `null` nor a number
    #[error("line {line}: invalid magnitude {value:?}")]
    NumberFormat { line: u64, value: String },

    /// Time field that is not an integer millisecond count
    #[error("line {line}: invalid time {value:?}")]
    InvalidTime { line: u64, value: String },

    /// Row parsed but the resulting record is invalid
    #[error("line {line}: {source}")]
    InvalidRecord {
        line: u64,
        #[source]
        source: RecordError,
    },

    /// Failed to parse or write CSV data
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Underlying stream failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CsvError {
    /// Line of the input the error refers to, when known.
    pub fn line(&self) -> Option<u64> {
        match self {
            CsvError::InvalidRow { line, .. }
            | CsvError::NumberFormat { line, .. }
            | CsvError::InvalidTime { line, .. }
            | CsvError::InvalidRecord { line, .. } => Some(*line),
            CsvError::Csv(_) | CsvError::Io(_) => None,
        }
    }
}

/// Type alias for Results using CsvError
pub type CsvResult<T> = std::result::Result<T, CsvError>;
