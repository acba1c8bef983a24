//! Command implementations for the quake CLI.
//!
//! Provides subcommands for watching the USGS event feed, exporting a
//! window of events to CSV, and summarising an exported file per day.

use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand};
use quake_feed::feed::{DEFAULT_BASE_URL, DEFAULT_UTC_OFFSET_SECONDS};
use quake_feed::{FeedConfig, QueryWindow};
use quake_refresh::RefreshConfig;
use std::path::PathBuf;
use std::time::Duration;

pub mod csv_file;
pub mod fetch;
pub mod report;
pub mod summary;
pub mod watch;

#[derive(Subcommand)]
pub enum Command {
    /// Poll the feed and print every refresh
    Watch {
        #[command(flatten)]
        window: WindowArgs,

        /// Only show events whose region contains this text (any case)
        #[arg(long, default_value = "")]
        filter: String,

        /// Seconds between two fetches
        #[arg(long, default_value_t = 5)]
        interval_secs: u64,

        /// Longest pause after a failed fetch, in seconds
        #[arg(long, default_value_t = 10)]
        max_backoff_secs: u64,

        #[command(flatten)]
        feed: FeedArgs,
    },

    /// Fetch one window of events and export it as CSV
    Fetch {
        #[command(flatten)]
        window: WindowArgs,

        /// Only export events whose region contains this text (any case)
        #[arg(long, default_value = "")]
        filter: String,

        /// Output file; defaults to <dir>/Earthquakes_<from>[-<to>].csv
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Directory for the default output file
        #[arg(long, default_value = "data")]
        dir: PathBuf,

        #[command(flatten)]
        feed: FeedArgs,
    },

    /// Print per-day event counts of an exported CSV file
    Summary {
        /// CSV file written by `fetch`
        #[arg(short = 'i', long)]
        input: PathBuf,

        /// Only count events whose region contains this text (any case)
        #[arg(long, default_value = "")]
        filter: String,
    },
}

/// Query window on the command line. Both bounds default to today.
#[derive(Args, Debug, Clone)]
pub struct WindowArgs {
    /// First day, YYYY-MM-DD
    #[arg(long, value_parser = parse_day)]
    pub from: Option<NaiveDate>,

    /// Last day, YYYY-MM-DD
    #[arg(long, value_parser = parse_day)]
    pub to: Option<NaiveDate>,
}

impl WindowArgs {
    pub fn resolve(&self, today: NaiveDate) -> anyhow::Result<QueryWindow> {
        let from = self.from.unwrap_or(today);
        let to = self.to.unwrap_or(today);
        let window = QueryWindow::new(from, to)?;
        window.check_selectable(today)?;
        Ok(window)
    }
}

/// Feed connection options.
#[derive(Args, Debug, Clone)]
pub struct FeedArgs {
    /// Query endpoint of the event service
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Maximum number of events per request
    #[arg(long)]
    pub limit: Option<u32>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl FeedArgs {
    pub fn to_config(&self) -> FeedConfig {
        FeedConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            limit: self.limit,
            utc_offset_seconds: DEFAULT_UTC_OFFSET_SECONDS,
        }
    }
}

fn parse_day(s: &str) -> Result<NaiveDate, String> {
    quake_utils::dates::parse_date(s).map_err(|e| format!("{} (expected YYYY-MM-DD)", e))
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    match command {
        Command::Watch {
            window,
            filter,
            interval_secs,
            max_backoff_secs,
            feed,
        } => {
            let refresh = RefreshConfig {
                interval: Duration::from_secs(interval_secs),
                max_backoff: Duration::from_secs(max_backoff_secs),
                ..RefreshConfig::default()
            };
            watch::run_watch(window.resolve(today)?, filter, refresh, feed.to_config()).await
        }
        Command::Fetch {
            window,
            filter,
            output,
            dir,
            feed,
        } => {
            let window = window.resolve(today)?;
            let path = output.unwrap_or_else(|| dir.join(window.default_csv_file_name()));
            fetch::run_fetch(window, &filter, &path, feed.to_config()).await
        }
        Command::Summary { input, filter } => summary::run_summary(&input, &filter),
    }
}
