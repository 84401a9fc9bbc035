use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use mffr_client::RawFeed;

use crate::snapshot::Snapshot;
use crate::transform::{reconcile, EnrichedRecord};

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub received_at: DateTime<Utc>,
}

impl<T> Envelope<T> {
    pub fn new(payload: T, received_at: DateTime<Utc>) -> Self {
        Self {
            payload,
            received_at,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(String),
    #[error("transform error: {0}")]
    Transform(String),
    #[error("sink error: {0}")]
    Sink(String),
}

/// Delivers one complete feed document per call.
#[async_trait::async_trait]
pub trait Source: Send + Sync {
    async fn fetch(&self) -> Result<Envelope<RawFeed>, PipelineError>;
}

/// Synchronous per-record step applied after reconciliation.
pub trait Transform<I, O>: Send + Sync {
    fn apply(&self, input: Envelope<I>) -> Result<Envelope<O>, PipelineError>;
}

/// Receives every freshly built snapshot.
pub trait Sink: Send + Sync {
    fn publish(&self, snapshot: Arc<Snapshot>) -> Result<(), PipelineError>;
}

pub struct Pipeline<S, K> {
    pub source: S,
    pub zone: Tz,
    pub transforms: Vec<Arc<dyn Transform<EnrichedRecord, EnrichedRecord>>>, // same-type transforms chain
    pub sink: K,
    /// Digest of the last snapshot whose anomalies were reported.
    reported: Mutex<Option<blake3::Hash>>,
}

impl<S, K> Pipeline<S, K>
where
    S: Source,
    K: Sink,
{
    pub fn new(
        source: S,
        zone: Tz,
        transforms: Vec<Arc<dyn Transform<EnrichedRecord, EnrichedRecord>>>,
        sink: K,
    ) -> Self {
        Self {
            source,
            zone,
            transforms,
            sink,
            reported: Mutex::new(None),
        }
    }

    /// Fetch the feed once, rebuild the snapshot and hand it to the sink.
    pub async fn run_once(&self) -> Result<Arc<Snapshot>, PipelineError> {
        metrics::counter!("feed_fetch_total").increment(1);
        let feed = match self.source.fetch().await {
            Ok(feed) => feed,
            Err(e) => {
                metrics::counter!("feed_fetch_failed_total").increment(1);
                return Err(e);
            }
        };

        let snapshot = Arc::new(self.build_snapshot(feed));
        metrics::gauge!("snapshot_records").set(snapshot.len() as f64);
        if self.mark_reported(snapshot.digest()) {
            snapshot.records().iter().for_each(report_anomalies);
        }
        tracing::info!(
            records = snapshot.len(),
            digest = %snapshot.digest().to_hex(),
            "slot snapshot rebuilt"
        );

        self.sink.publish(snapshot.clone())?;
        Ok(snapshot)
    }

    /// Re-fetch on a fixed interval. A failed fetch keeps the previously
    /// published snapshot in place.
    pub async fn run(self, refresh: Duration) -> Result<(), PipelineError> {
        let mut ticker = tokio::time::interval(refresh);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once().await {
                tracing::warn!(error = %e, "slot feed refresh failed, keeping previous snapshot");
            }
        }
    }

    pub fn build_snapshot(&self, feed: Envelope<RawFeed>) -> Snapshot {
        let as_of = feed.received_at;
        let records = feed
            .payload
            .iter()
            .map(|(timeslot, entry)| {
                let record = reconcile(timeslot, entry, self.zone);
                self.apply_transforms(record, as_of)
            })
            .collect();

        Snapshot::new(records, as_of)
    }

    /// True the first time a given snapshot content is seen, so unchanged
    /// rows are not re-reported on every refresh.
    fn mark_reported(&self, digest: blake3::Hash) -> bool {
        let mut last = self.reported.lock().unwrap_or_else(PoisonError::into_inner);
        if *last == Some(digest) {
            return false;
        }
        *last = Some(digest);
        true
    }

    fn apply_transforms(&self, mut record: EnrichedRecord, as_of: DateTime<Utc>) -> EnrichedRecord {
        for t in &self.transforms {
            match t.apply(Envelope::new(record.clone(), as_of)) {
                Ok(env) => record = env.payload,
                Err(e) => {
                    metrics::counter!("record_transform_failed_total").increment(1);
                    tracing::warn!(
                        timeslot = %record.timeslot,
                        error = %e,
                        "record transform failed, keeping reconciled record"
                    );
                }
            }
        }
        record
    }
}

fn report_anomalies(record: &EnrichedRecord) {
    for anomaly in &record.anomalies {
        metrics::counter!("reconcile_anomalies_total", "kind" => anomaly.kind()).increment(1);
        tracing::warn!(timeslot = %record.timeslot, %anomaly, "slot data-quality anomaly");
    }
}
