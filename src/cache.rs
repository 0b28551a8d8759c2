//! Per-zone snapshot cache.
//!
//! Scrapes within `ttl` of the previous collection for the same zone are
//! served the stored snapshot instead of re-reading kstats.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use zone_metrics_agent::MetricSnapshot;

/// Cached snapshot with the time it was collected.
#[derive(Clone)]
pub struct CachedSnapshot {
    pub snapshot: Arc<MetricSnapshot>,
    pub collected_at: Instant,
}

/// Cache state keyed by zone identity.
pub struct MetricsCache {
    entries: DashMap<String, CachedSnapshot>,
    ttl: Duration,
}

impl MetricsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Returns a snapshot younger than the TTL, if any.
    pub fn get_fresh(&self, identity: &str) -> Option<Arc<MetricSnapshot>> {
        if self.ttl.is_zero() {
            return None;
        }
        let entry = self.entries.get(identity)?;
        if entry.collected_at.elapsed() < self.ttl {
            Some(entry.snapshot.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, identity: &str, snapshot: MetricSnapshot) -> Arc<MetricSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.entries.insert(
            identity.to_string(),
            CachedSnapshot {
                snapshot: snapshot.clone(),
                collected_at: Instant::now(),
            },
        );
        snapshot
    }

    pub fn remove(&self, identity: &str) {
        self.entries.remove(identity);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
