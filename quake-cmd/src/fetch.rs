//! One-shot fetch of a query window into a CSV file.

use crate::csv_file;
use log::info;
use quake_data::filter;
use quake_feed::{FeedClient, FeedConfig, QueryWindow};
use std::path::Path;

/// Fetch `window` once, keep the events matching `region_filter`, and
/// export them to `path`.
///
/// A failed request is reported, not retried; rerun the command instead.
pub async fn run_fetch(
    window: QueryWindow,
    region_filter: &str,
    path: &Path,
    feed: FeedConfig,
) -> anyhow::Result<()> {
    let client = FeedClient::new(feed)?;
    info!("Fetching events from {} to {}", window.from(), window.to());
    let events = client.fetch(&window).await?;
    let selected = filter::apply(&events, region_filter);
    if selected.len() != events.len() {
        info!(
            "Filter {:?} kept {} of {} events",
            region_filter,
            selected.len(),
            events.len()
        );
    }
    csv_file::export(&selected, path)?;
    println!("{} events written to {}", selected.len(), path.display());
    Ok(())
}
