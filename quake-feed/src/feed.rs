//! GeoJSON feed of the USGS FDSN event service.
//!
//! The wire structs below model only the fields the domain model consumes;
//! everything else in the response is ignored so that new feed fields do
//! not break parsing.

use crate::error::FeedError;
use crate::event::EventRecord;
use serde::Deserialize;

#[cfg(feature = "api")]
use crate::query_window::{QueryWindow, QUERY_TIME_FORMAT};
#[cfg(feature = "api")]
use chrono::FixedOffset;
#[cfg(feature = "api")]
use log::{debug, info, warn};
#[cfg(feature = "api")]
use reqwest::Client;
#[cfg(feature = "api")]
use std::time::Duration;

/// Query endpoint of the USGS event service.
pub const DEFAULT_BASE_URL: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";

/// Offset the query bounds are expressed in (UTC+01:00).
pub const DEFAULT_UTC_OFFSET_SECONDS: i32 = 3600;

/// Default upper bound for one request.
pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Top level of a GeoJSON feed response.
#[derive(Debug, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub features: Vec<Feature>,
}

/// One event of the feed.
#[derive(Debug, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub properties: Properties,
}

/// Event attributes consumed by the domain model.
#[derive(Debug, Deserialize)]
pub struct Properties {
    pub mag: Option<f64>,
    pub place: Option<String>,
    pub time: i64,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl FeatureCollection {
    /// Convert every feature into a domain record, keeping feed order.
    pub fn into_events(self) -> Result<Vec<EventRecord>, FeedError> {
        self.features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| {
                let p = feature.properties;
                EventRecord::new(p.event_type, p.time, p.mag, p.place, p.title).map_err(|e| {
                    FeedError::MalformedFeed(format!("feature {}: {}", index, e))
                })
            })
            .collect()
    }
}

/// Parse a feed response body into domain records.
pub fn parse_feature_collection(body: &str) -> Result<Vec<EventRecord>, FeedError> {
    let collection: FeatureCollection =
        serde_json::from_str(body).map_err(|e| FeedError::MalformedFeed(e.to_string()))?;
    collection.into_events()
}

/// Connection settings of the feed client.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub base_url: String,
    /// Upper bound for a whole request, connect to last body byte.
    pub timeout: std::time::Duration,
    /// Optional `limit` query parameter.
    pub limit: Option<u32>,
    /// Offset of the `starttime`/`endtime` parameters, seconds east of UTC.
    pub utc_offset_seconds: i32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            limit: None,
            utc_offset_seconds: DEFAULT_UTC_OFFSET_SECONDS,
        }
    }
}

/// HTTP client for the event feed. One call, one request; retrying is up
/// to the caller.
#[cfg(feature = "api")]
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    base_url: String,
    limit: Option<u32>,
    offset: FixedOffset,
}

#[cfg(feature = "api")]
impl FeedClient {
    pub fn new(config: FeedConfig) -> Result<FeedClient, FeedError> {
        if config.timeout.is_zero() {
            return Err(FeedError::InvalidConfig("timeout must be positive".to_string()));
        }
        let offset = FixedOffset::east_opt(config.utc_offset_seconds).ok_or_else(|| {
            FeedError::InvalidConfig(format!(
                "invalid UTC offset of {} seconds",
                config.utc_offset_seconds
            ))
        })?;
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| FeedError::InvalidConfig(e.to_string()))?;
        Ok(FeedClient {
            client,
            base_url: config.base_url,
            limit: config.limit,
            offset,
        })
    }

    /// Query parameters for `window`, in request order.
    pub fn query_params(&self, window: &QueryWindow) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("format", "geojson".to_string()),
            (
                "starttime",
                window
                    .start_time(self.offset)
                    .format(QUERY_TIME_FORMAT)
                    .to_string(),
            ),
            (
                "endtime",
                window
                    .end_time(self.offset)
                    .format(QUERY_TIME_FORMAT)
                    .to_string(),
            ),
        ];
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }

    /// Fetch every event inside `window`.
    pub async fn fetch(&self, window: &QueryWindow) -> Result<Vec<EventRecord>, FeedError> {
        let params = self.query_params(window);
        debug!("Requesting {} with {:?}", self.base_url, params);

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Bad response status from feed: {}", status);
            return Err(FeedError::HttpStatus(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;
        let events = parse_feature_collection(&body)?;
        info!(
            "Fetched {} events from {} to {}",
            events.len(),
            window.from(),
            window.to()
        );
        Ok(events)
    }
}
