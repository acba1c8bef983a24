//! Seismic event model, USGS GeoJSON feed client and CSV codec.
//!
//! The HTTP client lives behind the `api` feature; everything else is pure
//! and usable without a network stack.

pub mod csv_codec;
pub mod error;
pub mod event;
pub mod feed;
pub mod query_window;

pub use error::{CsvError, FeedError, RecordError, WindowError};
pub use event::EventRecord;
pub use query_window::QueryWindow;

#[cfg(feature = "api")]
pub use feed::FeedClient;
pub use feed::FeedConfig;
