use std::{cmp::Ordering, sync::Arc};

use chrono::{DateTime, Utc};

use crate::transform::EnrichedRecord;

/// Immutable, fully reconciled view of one feed fetch.
///
/// Records are ordered most recent slot first. Readers hold an `Arc` to the
/// snapshot and never see it change; a refresh publishes a new one.
#[derive(Debug, Clone)]
pub struct Snapshot {
    records: Arc<[EnrichedRecord]>,
    fetched_at: DateTime<Utc>,
    digest: blake3::Hash,
}

impl Snapshot {
    pub fn new(mut records: Vec<EnrichedRecord>, fetched_at: DateTime<Utc>) -> Self {
        records.sort_by(newest_first);
        let digest = records_digest(&records);
        Self {
            records: records.into(),
            fetched_at,
            digest,
        }
    }

    pub fn empty(fetched_at: DateTime<Utc>) -> Self {
        Self::new(Vec::new(), fetched_at)
    }

    pub fn records(&self) -> &[EnrichedRecord] {
        &self.records
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Content hash of the ordered records, independent of `fetched_at`.
    pub fn digest(&self) -> blake3::Hash {
        self.digest
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Descending by slot start; unparseable slots last; ties by key.
fn newest_first(a: &EnrichedRecord, b: &EnrichedRecord) -> Ordering {
    match (a.slot_start, b.slot_start) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| b.timeslot.cmp(&a.timeslot))
}

fn hash_str(hasher: &mut blake3::Hasher, s: &str) {
    let len = s.len() as u32;
    hasher.update(&len.to_le_bytes());
    hasher.update(s.as_bytes());
}

fn records_digest(records: &[EnrichedRecord]) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for record in records {
        hash_str(&mut hasher, &record.timeslot);
        match serde_json::to_vec(record) {
            Ok(bytes) => {
                hasher.update(&[1]);
                hasher.update(&bytes);
            }
            Err(_) => {
                hasher.update(&[0]);
            }
        }
    }
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(timeslot: &str, start: Option<&str>) -> EnrichedRecord {
        EnrichedRecord {
            timeslot: timeslot.to_string(),
            slot_start: start.map(|s| DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)),
            ..Default::default()
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn orders_newest_first_with_unparseable_last() {
        let snap = Snapshot::new(
            vec![
                record("b", None),
                record("old", Some("2024-01-01T08:00:00Z")),
                record("a", None),
                record("new", Some("2024-01-01T09:00:00Z")),
            ],
            at("2024-01-02T00:00:00Z"),
        );
        let keys: Vec<_> = snap.records().iter().map(|r| r.timeslot.as_str()).collect();
        assert_eq!(keys, vec!["new", "old", "b", "a"]);
    }

    #[test]
    fn digest_ignores_input_order_and_fetch_time() {
        let one = Snapshot::new(
            vec![
                record("x", Some("2024-01-01T08:00:00Z")),
                record("y", Some("2024-01-01T08:15:00Z")),
            ],
            at("2024-01-02T00:00:00Z"),
        );
        let two = Snapshot::new(
            vec![
                record("y", Some("2024-01-01T08:15:00Z")),
                record("x", Some("2024-01-01T08:00:00Z")),
            ],
            at("2024-01-03T00:00:00Z"),
        );
        assert_eq!(one.digest(), two.digest());

        let other = Snapshot::new(vec![record("x", None)], at("2024-01-02T00:00:00Z"));
        assert_ne!(one.digest(), other.digest());
    }

    #[test]
    fn empty_snapshot() {
        let snap = Snapshot::empty(at("2024-01-02T00:00:00Z"));
        assert!(snap.is_empty());
        assert_eq!(snap.len(), 0);
    }
}
