//! Terminal front end of the refresh loop.
//!
//! Prints every refreshed result set. When a fetch fails the loop pauses
//! and this command waits for the user to press Enter before resuming.

use crate::report;
use log::info;
use quake_data::aggregation::{daily_counts, is_chartable};
use quake_feed::{FeedClient, FeedConfig, QueryWindow};
use quake_refresh::{RefreshConfig, RefreshContext, RefreshEvent, Snapshot};
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run_watch(
    window: QueryWindow,
    filter: String,
    refresh: RefreshConfig,
    feed: FeedConfig,
) -> anyhow::Result<()> {
    let client = FeedClient::new(feed)?;
    let (handle, mut events) =
        quake_refresh::spawn(client, refresh, RefreshContext { window, filter })?;
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Some(RefreshEvent::Updated(snapshot)) => print_snapshot(&snapshot),
                Some(RefreshEvent::Failed(error)) => {
                    eprintln!("Data could not be received: {}", error);
                    eprintln!("Press Enter to resume polling, Ctrl-C to quit");
                    let resume = tokio::select! {
                        _ = tokio::signal::ctrl_c() => false,
                        line = stdin.next_line() => matches!(line, Ok(Some(_))),
                    };
                    if !resume {
                        break;
                    }
                    handle.acknowledge();
                }
                None => break,
            },
        }
    }

    info!("Shutting down");
    handle.join().await;
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot) {
    let visible = snapshot.visible();
    println!(
        "{} to {}: {} events, {} shown",
        snapshot.window.from(),
        snapshot.window.to(),
        snapshot.events.len(),
        visible.len()
    );
    for event in &visible {
        println!("  {}", report::event_line(event));
    }
    let bucket = daily_counts(&visible);
    if is_chartable(&bucket) {
        for line in report::daily_lines(&bucket) {
            println!("  {}", line);
        }
    }
}
