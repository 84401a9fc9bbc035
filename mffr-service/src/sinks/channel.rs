use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::pipeline::{PipelineError, Sink};
use crate::snapshot::Snapshot;

pub type SnapshotReceiver = watch::Receiver<Arc<Snapshot>>;

/// Publishes snapshots to in-process readers as one atomic swap.
pub struct WatchSink {
    tx: watch::Sender<Arc<Snapshot>>,
}

impl WatchSink {
    /// Starts out with an empty snapshot so readers always have something.
    pub fn channel(started_at: DateTime<Utc>) -> (Self, SnapshotReceiver) {
        let (tx, rx) = watch::channel(Arc::new(Snapshot::empty(started_at)));
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> SnapshotReceiver {
        self.tx.subscribe()
    }
}

impl Sink for WatchSink {
    fn publish(&self, snapshot: Arc<Snapshot>) -> Result<(), PipelineError> {
        let changed = self.tx.send_if_modified(|current| {
            if current.digest() == snapshot.digest() {
                false
            } else {
                *current = snapshot.clone();
                true
            }
        });

        if changed {
            tracing::info!(records = snapshot.len(), "published new slot snapshot");
        } else {
            tracing::debug!("slot snapshot unchanged, keeping current");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::EnrichedRecord;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn snapshot(keys: &[&str], fetched_at: &str) -> Arc<Snapshot> {
        let records = keys
            .iter()
            .map(|k| EnrichedRecord {
                timeslot: k.to_string(),
                ..Default::default()
            })
            .collect();
        Arc::new(Snapshot::new(records, at(fetched_at)))
    }

    #[test]
    fn readers_see_the_swap() {
        let (sink, mut rx) = WatchSink::channel(at("2024-01-01T00:00:00Z"));
        assert!(rx.borrow().is_empty());

        sink.publish(snapshot(&["a", "b"], "2024-01-01T00:01:00Z")).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 2);
    }

    #[test]
    fn identical_content_is_not_republished() {
        let (sink, mut rx) = WatchSink::channel(at("2024-01-01T00:00:00Z"));
        sink.publish(snapshot(&["a"], "2024-01-01T00:01:00Z")).unwrap();
        let _ = rx.borrow_and_update();

        sink.publish(snapshot(&["a"], "2024-01-01T00:02:00Z")).unwrap();
        assert!(!rx.has_changed().unwrap());
        assert_eq!(rx.borrow().fetched_at(), at("2024-01-01T00:01:00Z"));
    }
}
