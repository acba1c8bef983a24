//! Scheduled refresh of the seismic event feed.
//!
//! [`scheduler::spawn`] starts a loop that fetches the active query window
//! at a fixed interval, keeps one immutable snapshot of the latest result
//! set, and pauses on failure until the presentation layer acknowledges it.

pub mod config;
pub mod scheduler;
pub mod source;

pub use config::{ConfigError, RefreshConfig};
pub use scheduler::{
    spawn, RefreshContext, RefreshEvent, RefreshHandle, RefreshState, Snapshot,
};
pub use source::FeedSource;
