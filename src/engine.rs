//! Collection engine: the current zone set plus on-demand collection.

use ahash::AHashMap as HashMap;
use rayon::prelude::*;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::catalog::MetricCatalog;
use crate::collectors::Sources;
use crate::error::Result;
use crate::instrumenter::{MetricSnapshot, ZoneInstrumenter};
use crate::zones::{InventoryCommand, Zone, ZoneEnumerator};

/// Holds the discovered zones and serves per-zone snapshots.
pub struct CollectionEngine {
    catalog: Arc<MetricCatalog>,
    enumerator: ZoneEnumerator,
    zones: RwLock<HashMap<String, Zone>>,
}

impl CollectionEngine {
    pub fn new(catalog: Arc<MetricCatalog>, sources: Sources, inventory: InventoryCommand) -> Self {
        let enumerator = ZoneEnumerator::new(inventory, catalog.clone(), sources);
        Self {
            catalog,
            enumerator,
            zones: RwLock::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    /// Re-runs discovery and replaces the zone set. Returns the zone count.
    ///
    /// The inventory utility runs before the zone map is locked.
    #[instrument(skip(self))]
    pub fn refresh(&self) -> Result<usize> {
        let discovered = self.enumerator.enumerate()?;
        let count = discovered.len();

        let mut zones = self.zones.write().unwrap_or_else(|e| e.into_inner());
        let removed = zones.keys().filter(|k| !discovered.contains_key(*k)).count();
        *zones = discovered;

        info!("Zone discovery complete: {} zones ({} removed)", count, removed);
        Ok(count)
    }

    pub fn zone(&self, identity: &str) -> Option<Arc<ZoneInstrumenter>> {
        let zones = self.zones.read().unwrap_or_else(|e| e.into_inner());
        zones.get(identity).map(|z| z.instrumenter.clone())
    }

    pub fn zone_ids(&self) -> Vec<String> {
        let zones = self.zones.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<String> = zones.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn zone_count(&self) -> usize {
        self.zones.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Collects one zone, re-running discovery once if it is unknown.
    ///
    /// A snapshot in which every kstat group failed means the zone may have
    /// stopped: discovery runs again and a zone no longer listed is dropped.
    /// Returns `Ok(None)` when the zone is unknown or gone.
    #[instrument(skip(self))]
    pub fn collect(&self, identity: &str) -> Result<Option<MetricSnapshot>> {
        let instrumenter = match self.zone(identity) {
            Some(z) => z,
            None => {
                debug!("Zone {} unknown, refreshing zone list", identity);
                self.refresh()?;
                match self.zone(identity) {
                    Some(z) => z,
                    None => return Ok(None),
                }
            }
        };

        let snapshot = instrumenter.collect();
        if snapshot.failed_groups.is_empty() {
            return Ok(Some(snapshot));
        }

        if self.kstat_groups_all_failed(&snapshot) {
            debug!("Every kstat read failed for zone {}, checking zone list", identity);
            match self.refresh() {
                Ok(_) if self.zone(identity).is_none() => {
                    info!("Zone {} is no longer running, dropped", identity);
                    return Ok(None);
                }
                Ok(_) => {}
                Err(e) => warn!("Zone list refresh after failed reads failed: {}", e),
            }
        }

        warn!(
            "Zone {} returned a partial snapshot, failed groups: {:?}",
            identity, snapshot.failed_groups
        );
        Ok(Some(snapshot))
    }

    /// True when the catalog reads at least one kstat group and all of them
    /// failed in `snapshot`.
    fn kstat_groups_all_failed(&self, snapshot: &MetricSnapshot) -> bool {
        let mut kstat_groups = self
            .catalog
            .groups()
            .filter(|(group, defs)| !defs.is_empty() && group.kstat_filter().is_some())
            .map(|(group, _)| group)
            .peekable();

        kstat_groups.peek().is_some()
            && kstat_groups.all(|group| snapshot.failed_groups.contains(&group))
    }

    /// Collects every known zone in parallel.
    pub fn collect_all(&self) -> Vec<(String, MetricSnapshot)> {
        let instrumenters: Vec<Arc<ZoneInstrumenter>> = {
            let zones = self.zones.read().unwrap_or_else(|e| e.into_inner());
            zones.values().map(|z| z.instrumenter.clone()).collect()
        };

        let mut results: Vec<(String, MetricSnapshot)> = instrumenters
            .par_iter()
            .map(|i| (i.identity().to_string(), i.collect()))
            .collect();
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::{KstatCommandReader, SystemClock, ZfsCommandReader};

    fn sources() -> Sources {
        Sources::new(
            Arc::new(KstatCommandReader::default()),
            Arc::new(ZfsCommandReader::default()),
            Arc::new(SystemClock),
        )
    }

    #[test]
    fn test_zone_accessors_survive_poisoned_lock() {
        let catalog = Arc::new(MetricCatalog::default());
        let engine = CollectionEngine::new(catalog.clone(), sources(), InventoryCommand::default());
        let instrumenter = ZoneInstrumenter::new("zone-a", 3, catalog, sources()).unwrap();

        let engine_ref = &engine;
        let result = std::thread::scope(|s| {
            s.spawn(move || {
                let mut zones = engine_ref.zones.write().unwrap();
                zones.insert(
                    "zone-a".to_string(),
                    Zone {
                        instance: 3,
                        instrumenter: Arc::new(instrumenter),
                    },
                );
                panic!("writer died holding the zone map");
            })
            .join()
        });
        assert!(result.is_err());
        assert!(engine.zones.is_poisoned());

        assert_eq!(engine.zone_count(), 1);
        assert_eq!(engine.zone_ids(), vec!["zone-a".to_string()]);
        assert!(engine.zone("zone-a").is_some());
    }
}
