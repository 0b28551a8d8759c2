//! Zone Metrics Agent Library
//!
//! Collects per-zone resource counters from kstat, ZFS dataset accounting
//! and the wall clock, and turns them into typed, named metric snapshots.
//!
//! # Components
//!
//! - **Modifiers**: pure transforms from raw kstat values to exposed values
//! - **Catalog**: the declarative table of metrics per source group
//! - **Read options**: per-zone kstat query filters
//! - **Instrumenter**: one collector per running zone
//! - **Zones**: discovery of running zones through `zoneadm`
//! - **Engine**: the current zone set and on-demand collection
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use zone_metrics_agent::{
//!     CollectionEngine, InventoryCommand, KstatCommandReader, MetricCatalog, Sources,
//!     SystemClock, ZfsCommandReader,
//! };
//!
//! let sources = Sources::new(
//!     Arc::new(KstatCommandReader::default()),
//!     Arc::new(ZfsCommandReader::default()),
//!     Arc::new(SystemClock),
//! );
//! let engine = CollectionEngine::new(
//!     Arc::new(MetricCatalog::default()),
//!     sources,
//!     InventoryCommand::default(),
//! );
//! engine.refresh().expect("zoneadm available");
//! for (zone, snapshot) in engine.collect_all() {
//!     println!("{}: {} metrics", zone, snapshot.len());
//! }
//! ```

pub mod catalog;
pub mod collectors;
pub mod engine;
pub mod error;
pub mod instrumenter;
pub mod modifiers;
pub mod read_options;
pub mod zones;

// Re-export main types for convenience
pub use catalog::{MetricCatalog, MetricDefinition, MetricKind, SourceGroup};
pub use collectors::{
    KstatCommandReader, KstatReader, KstatRecord, QuotaReader, SerializedReader, Sources,
    SystemClock, WallClock, ZfsCommandReader,
};
pub use engine::CollectionEngine;
pub use error::CollectorError;
pub use instrumenter::{MetricSample, MetricSnapshot, ZoneInstrumenter};
pub use modifiers::{LimitSentinels, MetricValue, ValueModifier};
pub use read_options::{InstanceId, ReadOptions, ReadOptionsBuilder};
pub use zones::{InventoryCommand, Zone, ZoneEnumerator};
