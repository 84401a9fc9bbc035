use reqwest::Client;

use crate::domain::RawFeed;

pub const DEFAULT_LIMIT: u32 = 1000;
pub const MAX_LIMIT: u32 = 50_000;

#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error("slot feed request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("slot feed is not an object of slot entries: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FeedError {
    /// The endpoint answered, but with a document we cannot read.
    pub fn is_parse(&self) -> bool {
        matches!(self, FeedError::Parse(_))
    }
}

/// Query parameters understood by the slot feed endpoint.
///
/// `from`/`to` are passed through verbatim; the server normalizes them to its
/// local zone. `limit` only applies when neither bound is given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<u32>,
}

impl FeedQuery {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(3);
        if let Some(from) = self.from.as_deref().filter(|s| !s.trim().is_empty()) {
            params.push(("from", from.to_string()));
        }
        if let Some(to) = self.to.as_deref().filter(|s| !s.trim().is_empty()) {
            params.push(("to", to.to_string()));
        }
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        params.push(("limit", limit.to_string()));
        params
    }
}

/// Parse a feed document (object of slot entries keyed by timeslot).
pub fn parse_feed(body: &str) -> Result<RawFeed, FeedError> {
    Ok(serde_json::from_str(body)?)
}

/// Fetch the slot feed once.
pub async fn fetch_slots(client: &Client, url: &str, query: &FeedQuery) -> Result<RawFeed, FeedError> {
    let params = query.params();
    tracing::debug!(url, ?params, "fetching slot feed");

    let request_failed = |source: reqwest::Error| FeedError::Request {
        url: url.to_string(),
        source,
    };
    let body = client
        .get(url)
        .query(&params)
        .send()
        .await
        .and_then(|resp| resp.error_for_status())
        .map_err(request_failed)?
        .text()
        .await
        .map_err(request_failed)?;

    parse_feed(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_default_to_limit_only() {
        let q = FeedQuery::default();
        assert_eq!(q.params(), vec![("limit", "1000".to_string())]);
    }

    #[test]
    fn params_skip_blank_bounds_and_clamp_limit() {
        let q = FeedQuery {
            from: Some("2024-03-01".to_string()),
            to: Some("  ".to_string()),
            limit: Some(90_000),
        };
        assert_eq!(
            q.params(),
            vec![
                ("from", "2024-03-01".to_string()),
                ("limit", "50000".to_string()),
            ]
        );
        assert_eq!(FeedQuery::with_limit(0).params()[0].1, "1");
    }

    #[test]
    fn empty_object_is_an_empty_feed() {
        let feed = parse_feed("{}").unwrap();
        assert!(feed.is_empty());
    }

    #[test]
    fn array_body_is_rejected() {
        let err = parse_feed("[]").unwrap_err();
        assert!(err.is_parse());
    }
}
