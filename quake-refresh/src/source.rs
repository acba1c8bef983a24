use async_trait::async_trait;
use quake_feed::{EventRecord, FeedClient, FeedError, QueryWindow};

/// Something the scheduler can fetch a result set from.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, window: &QueryWindow) -> Result<Vec<EventRecord>, FeedError>;
}

#[async_trait]
impl FeedSource for FeedClient {
    async fn fetch(&self, window: &QueryWindow) -> Result<Vec<EventRecord>, FeedError> {
        FeedClient::fetch(self, window).await
    }
}
