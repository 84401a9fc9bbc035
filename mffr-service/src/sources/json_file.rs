use std::path::PathBuf;

use chrono::Utc;
use mffr_client::{feed::parse_feed, RawFeed};

use super::feed_failure;
use crate::pipeline::{Envelope, PipelineError, Source};

/// Reads a feed document saved to disk, e.g. a captured `/api/mffr` response.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl Source for JsonFileSource {
    async fn fetch(&self) -> Result<Envelope<RawFeed>, PipelineError> {
        let body = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            PipelineError::Source(format!("failed to read {}: {e}", self.path.display()))
        })?;

        let feed = parse_feed(&body)
            .map_err(|e| feed_failure(&self.path.display().to_string(), e))?;

        Ok(Envelope::new(feed, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn reads_feed_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"2024-01-01T10:00:00+02:00": {{"signal": "UP", "energy_kwh": 1.5}}}}"#
        )
        .unwrap();

        let env = JsonFileSource::new(file.path()).fetch().await.unwrap();
        assert_eq!(env.payload.len(), 1);
    }

    #[tokio::test]
    async fn missing_file_is_a_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let res = JsonFileSource::new(dir.path().join("nope.json")).fetch().await;
        assert!(matches!(res, Err(PipelineError::Source(_))));
    }

    #[tokio::test]
    async fn malformed_document_is_a_source_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let res = JsonFileSource::new(file.path()).fetch().await;
        assert!(matches!(res, Err(PipelineError::Source(_))));
    }
}
