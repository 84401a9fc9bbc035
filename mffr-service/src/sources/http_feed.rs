use std::time::Duration;

use chrono::Utc;
use mffr_client::{
    feed::{fetch_slots, FeedQuery},
    RawFeed,
};
use reqwest::Client;

use super::feed_failure;
use crate::pipeline::{Envelope, PipelineError, Source};

/// Reads the slot feed from its HTTP endpoint.
pub struct HttpFeedSource {
    client: Client,
    url: String,
    query: FeedQuery,
}

impl HttpFeedSource {
    pub fn new(url: &str, timeout: Duration, query: FeedQuery) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Source(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.to_string(),
            query,
        })
    }

    pub fn query(&self) -> &FeedQuery {
        &self.query
    }
}

#[async_trait::async_trait]
impl Source for HttpFeedSource {
    async fn fetch(&self) -> Result<Envelope<RawFeed>, PipelineError> {
        let started = std::time::Instant::now();
        let feed = fetch_slots(&self.client, &self.url, &self.query)
            .await
            .map_err(|e| feed_failure(&self.url, e))?;

        metrics::histogram!("feed_fetch_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::debug!(url = %self.url, entries = feed.len(), "slot feed fetched");

        Ok(Envelope::new(feed, Utc::now()))
    }
}
