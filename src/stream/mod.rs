//! Time-series history of property samples.
//!
//! The [`HistoryStore`] is the shared, append-only log the live chart reads
//! from. Samples are keyed by (twin id, property type). A [`StreamFeed`]
//! appends samples as they arrive; readers take snapshots and can subscribe
//! to a revision counter to learn that something changed.

mod feed;

pub use feed::{StreamFeed, StreamMessage};

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;

use crate::api::PropertyRecord;

type Series = HashMap<String, HashMap<String, Vec<PropertyRecord>>>;

/// Shared append-only sample log keyed by (twin, property).
///
/// Cloning is cheap; all clones share the same log.
///
/// # Example
///
/// ```
/// use twinwatch::{HistoryStore, PropertyRecord, ValueMap};
///
/// let store = HistoryStore::new();
/// store.append("dtA", PropertyRecord::new("heart-rate", ValueMap::new()));
/// assert_eq!(store.snapshot("dtA", "heart-rate").len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct HistoryStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    series: RwLock<Series>,
    /// Per-series cap. `None` keeps everything.
    limit: Option<usize>,
    revision: watch::Sender<u64>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self::with_limit(None)
    }

    /// Create a store that keeps at most `limit` samples per series,
    /// dropping the oldest first.
    pub fn with_limit(limit: Option<usize>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                series: RwLock::new(HashMap::new()),
                limit: limit.filter(|n| *n > 0),
                revision,
            }),
        }
    }

    /// Append a sample under its own key as property type.
    pub fn append(&self, dt: &str, record: PropertyRecord) {
        let property = record.key.clone();
        self.append_to(dt, &property, record);
    }

    /// Append a sample to an explicit (twin, property) series.
    pub fn append_to(&self, dt: &str, property: &str, record: PropertyRecord) {
        {
            let mut series = self.inner.series.write();
            let samples = series
                .entry(dt.to_string())
                .or_default()
                .entry(property.to_string())
                .or_default();
            samples.push(record);
            if let Some(limit) = self.inner.limit {
                if samples.len() > limit {
                    let excess = samples.len() - limit;
                    samples.drain(..excess);
                }
            }
        }
        self.inner.revision.send_modify(|rev| *rev += 1);
    }

    /// Copy of the samples recorded for a (twin, property) pair, oldest first.
    pub fn snapshot(&self, dt: &str, property: &str) -> Vec<PropertyRecord> {
        self.inner
            .series
            .read()
            .get(dt)
            .and_then(|props| props.get(property))
            .cloned()
            .unwrap_or_default()
    }

    /// Property types with recorded samples for a twin, sorted.
    pub fn properties(&self, dt: &str) -> Vec<String> {
        let series = self.inner.series.read();
        let mut names: Vec<String> =
            series.get(dt).map(|props| props.keys().cloned().collect()).unwrap_or_default();
        names.sort();
        names
    }

    /// Number of samples recorded for a (twin, property) pair.
    pub fn len(&self, dt: &str, property: &str) -> usize {
        self.inner
            .series
            .read()
            .get(dt)
            .and_then(|props| props.get(property))
            .map_or(0, Vec::len)
    }

    /// Current revision; bumped on every append.
    pub fn revision(&self) -> u64 {
        *self.inner.revision.borrow()
    }

    /// Subscribe to revision changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FieldValue, ValueMap};

    fn sample(key: &str, ts: f64) -> PropertyRecord {
        PropertyRecord::new(
            key,
            [("timestamp", FieldValue::number(ts))].into_iter().collect::<ValueMap>(),
        )
    }

    #[test]
    fn append_and_snapshot_preserve_order() {
        let store = HistoryStore::new();
        store.append("dtA", sample("heart-rate", 1.0));
        store.append("dtA", sample("heart-rate", 2.0));
        store.append("dtA", sample("mood", 3.0));
        store.append("dtB", sample("heart-rate", 4.0));

        let hr = store.snapshot("dtA", "heart-rate");
        let ts: Vec<f64> = hr.iter().filter_map(PropertyRecord::timestamp).collect();
        assert_eq!(ts, vec![1.0, 2.0]);
        assert_eq!(store.len("dtB", "heart-rate"), 1);
        assert_eq!(store.properties("dtA"), vec!["heart-rate", "mood"]);
    }

    #[test]
    fn unknown_series_is_empty() {
        let store = HistoryStore::new();
        assert!(store.snapshot("nobody", "heart-rate").is_empty());
        assert!(store.properties("nobody").is_empty());
        assert_eq!(store.len("nobody", "x"), 0);
    }

    #[test]
    fn limit_drops_oldest_samples() {
        let store = HistoryStore::with_limit(Some(2));
        for ts in 1..=5 {
            store.append("dtA", sample("heart-rate", ts as f64));
        }
        let ts: Vec<f64> = store
            .snapshot("dtA", "heart-rate")
            .iter()
            .filter_map(PropertyRecord::timestamp)
            .collect();
        assert_eq!(ts, vec![4.0, 5.0]);
    }

    #[test]
    fn zero_limit_means_unbounded() {
        let store = HistoryStore::with_limit(Some(0));
        for ts in 0..10 {
            store.append("dtA", sample("x", ts as f64));
        }
        assert_eq!(store.len("dtA", "x"), 10);
    }

    #[test]
    fn clones_share_the_log() {
        let store = HistoryStore::new();
        let reader = store.clone();
        store.append("dtA", sample("mood", 1.0));
        assert_eq!(reader.len("dtA", "mood"), 1);
    }

    #[test]
    fn snapshot_is_detached_from_later_appends() {
        let store = HistoryStore::new();
        store.append("dtA", sample("mood", 1.0));
        let snap = store.snapshot("dtA", "mood");
        store.append("dtA", sample("mood", 2.0));
        assert_eq!(snap.len(), 1);
    }

    #[tokio::test]
    async fn subscribers_see_revisions() {
        let store = HistoryStore::new();
        let mut rx = store.subscribe();
        assert_eq!(store.revision(), 0);

        store.append("dtA", sample("mood", 1.0));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 1);
        assert_eq!(store.revision(), 1);
    }
}
