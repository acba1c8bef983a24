//! CSV export and import on disk.

use anyhow::Context;
use log::{debug, info};
use quake_feed::csv_codec;
use quake_feed::EventRecord;
use std::fs;
use std::path::Path;

/// Write `events` to `path`, creating its directory when missing.
///
/// The text is serialized completely and written to a sibling temporary
/// file first, so a failure never leaves a half-written export behind.
pub fn export(events: &[EventRecord], path: &Path) -> anyhow::Result<()> {
    let text = csv_codec::to_csv_string(events).context("Failed to serialize events")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);
    let written = fs::write(tmp, text)
        .with_context(|| format!("Failed to write {}", tmp.display()))
        .and_then(|()| {
            fs::rename(tmp, path)
                .with_context(|| format!("Failed to move export to {}", path.display()))
        });
    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(tmp) {
            debug!("Could not remove {}: {}", tmp.display(), cleanup);
        }
        return Err(e);
    }
    info!("Exported {} events to {}", events.len(), path.display());
    Ok(())
}

/// Read a complete export. Any bad line fails the whole import.
pub fn import(path: &Path) -> anyhow::Result<Vec<EventRecord>> {
    let file = fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let events = csv_codec::read_events(file)
        .with_context(|| format!("Failed to import {}", path.display()))?;
    info!("Imported {} events from {}", events.len(), path.display());
    Ok(events)
}
