pub mod http_feed;
pub mod json_file;

pub use http_feed::HttpFeedSource;
pub use json_file::JsonFileSource;

use std::time::Duration;

use mffr_client::{
    feed::{FeedError, FeedQuery},
    RawFeed,
};

use crate::config::{FeedConfig, FeedKind};
use crate::pipeline::{Envelope, PipelineError, Source};

/// Source selected by `[feed] kind`.
pub enum FeedSource {
    Http(HttpFeedSource),
    File(JsonFileSource),
}

impl FeedSource {
    pub fn from_config(cfg: &FeedConfig) -> Result<Self, PipelineError> {
        match cfg.kind {
            FeedKind::Http => {
                let url = cfg
                    .url
                    .as_deref()
                    .ok_or_else(|| PipelineError::Source("feed.url is required for kind = \"http\"".to_string()))?;
                Ok(Self::Http(HttpFeedSource::new(
                    url,
                    Duration::from_millis(cfg.timeout_ms),
                    FeedQuery {
                        from: cfg.from.clone(),
                        to: cfg.to.clone(),
                        limit: Some(cfg.limit),
                    },
                )?))
            }
            FeedKind::File => {
                let path = cfg
                    .path
                    .clone()
                    .ok_or_else(|| PipelineError::Source("feed.path is required for kind = \"file\"".to_string()))?;
                Ok(Self::File(JsonFileSource::new(path)))
            }
        }
    }
}

#[async_trait::async_trait]
impl Source for FeedSource {
    async fn fetch(&self) -> Result<Envelope<RawFeed>, PipelineError> {
        match self {
            Self::Http(s) => s.fetch().await,
            Self::File(s) => s.fetch().await,
        }
    }
}

/// Maps a feed failure to a source error. Unreadable documents are counted
/// the same way whichever source produced them.
pub(crate) fn feed_failure(origin: &str, err: FeedError) -> PipelineError {
    if err.is_parse() {
        metrics::counter!("feed_parse_errors_total").increment(1);
    }
    PipelineError::Source(format!("{origin}: {err}"))
}
