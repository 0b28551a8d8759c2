//! Application state management for the agent.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers, plus the counters reported on `/health`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use zone_metrics_agent::{
    CollectionEngine, InventoryCommand, KstatCommandReader, MetricCatalog, Sources, SystemClock,
    ZfsCommandReader,
};

use crate::cache::MetricsCache;
use crate::config::Config;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests.
pub struct AppState {
    pub engine: Arc<CollectionEngine>,
    pub cache: MetricsCache,
    pub config: Arc<Config>,
    pub stats: AgentStats,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

/// Request and collection counters.
#[derive(Default)]
pub struct AgentStats {
    pub scrapes: AtomicU64,
    pub cache_hits: AtomicU64,
    pub unknown_zones: AtomicU64,
    pub partial_snapshots: AtomicU64,
    pub refreshes: AtomicU64,
    pub enumeration_failures: AtomicU64,
}

impl AgentStats {
    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}

/// Builds the collection engine from the effective configuration.
pub fn build_engine(cfg: &Config) -> CollectionEngine {
    let sources = Sources::new(
        Arc::new(KstatCommandReader::new(cfg.kstat_path())),
        Arc::new(ZfsCommandReader::new(cfg.zfs_path(), cfg.zfs_pool())),
        Arc::new(SystemClock),
    );
    CollectionEngine::new(
        Arc::new(MetricCatalog::default()),
        sources,
        InventoryCommand::zoneadm(cfg.zoneadm_path()),
    )
}
