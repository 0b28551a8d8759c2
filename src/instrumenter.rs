//! Per-zone metric collection.
//!
//! A [`ZoneInstrumenter`] is built once per running zone. It precomputes the
//! kstat filters for its zone and, on each [`collect`](ZoneInstrumenter::collect),
//! reads every source group, applies modifiers and assembles a
//! [`MetricSnapshot`]. A group whose read fails is left out of that snapshot.

use ahash::AHashMap as HashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::catalog::{MetricCatalog, MetricDefinition, MetricKind, SourceGroup};
use crate::collectors::kstat::merge_records;
use crate::collectors::Sources;
use crate::error::{CollectorError, Result};
use crate::modifiers::{apply_modifier, MetricValue};
use crate::read_options::{InstanceId, ReadOptions, ReadOptionsBuilder};

/// One exposed metric value.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: String,
    pub kind: MetricKind,
    pub help: String,
    pub value: MetricValue,
}

/// Result of one collection pass for one zone.
#[derive(Debug, Clone, Default)]
pub struct MetricSnapshot {
    pub samples: Vec<MetricSample>,
    /// Groups that could not be read during this pass.
    pub failed_groups: Vec<SourceGroup>,
}

impl MetricSnapshot {
    pub fn get(&self, name: &str) -> Option<&MetricSample> {
        self.samples.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Collector bound to a single zone.
pub struct ZoneInstrumenter {
    identity: String,
    instance: InstanceId,
    catalog: Arc<MetricCatalog>,
    sources: Sources,
    read_options: BTreeMap<SourceGroup, ReadOptions>,
}

impl std::fmt::Debug for ZoneInstrumenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneInstrumenter")
            .field("identity", &self.identity)
            .field("instance", &self.instance)
            .field("read_options", &self.read_options)
            .finish()
    }
}

impl ZoneInstrumenter {
    /// Fails with `InvalidArgument` for an empty identity or an instance id
    /// that is not a positive integer.
    pub fn new(
        identity: &str,
        instance_id: i64,
        catalog: Arc<MetricCatalog>,
        sources: Sources,
    ) -> Result<Self> {
        if identity.trim().is_empty() {
            return Err(CollectorError::invalid("zone identity must not be empty"));
        }
        let instance = InstanceId::try_from(instance_id)?;

        Ok(Self {
            identity: identity.to_string(),
            instance,
            catalog,
            sources,
            read_options: ReadOptionsBuilder::for_instance(instance),
        })
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn read_options(&self, group: SourceGroup) -> Option<&ReadOptions> {
        self.read_options.get(&group)
    }

    /// Reads every source group and returns the current snapshot.
    #[instrument(skip(self), fields(zone = %self.identity, instance = %self.instance))]
    pub fn collect(&self) -> MetricSnapshot {
        let mut snapshot = MetricSnapshot::default();

        for (group, definitions) in self.catalog.groups() {
            if definitions.is_empty() {
                continue;
            }
            match self.read_group(group) {
                Ok(record) => append_samples(&mut snapshot, definitions, &record),
                Err(e) => {
                    debug!("Omitting {} metrics for zone {}: {}", group, self.identity, e);
                    snapshot.failed_groups.push(group);
                }
            }
        }

        snapshot
    }

    fn read_group(&self, group: SourceGroup) -> Result<HashMap<String, u64>> {
        match group {
            SourceGroup::FilesystemQuota => {
                let dataset = self.sources.quota.dataset_for(&self.identity);
                self.sources.quota.read(&dataset)
            }
            SourceGroup::WallClock => {
                let mut record = HashMap::new();
                record.insert("now".to_string(), self.sources.clock.now_seconds());
                Ok(record)
            }
            _ => {
                let opts = self.read_options.get(&group).ok_or_else(|| {
                    CollectorError::read_failure(group.name(), "no kstat filter for group")
                })?;
                let records = self.sources.kstat.read(opts).map_err(|e| match e {
                    CollectorError::ReadFailure { reason, .. } => {
                        CollectorError::read_failure(group.name(), reason)
                    }
                    other => other,
                })?;
                if records.is_empty() {
                    return Err(CollectorError::read_failure(group.name(), "empty kstat read"));
                }
                Ok(merge_records(&records))
            }
        }
    }
}

fn append_samples(
    snapshot: &mut MetricSnapshot,
    definitions: &[MetricDefinition],
    record: &HashMap<String, u64>,
) {
    for def in definitions {
        let Some(raw) = record.get(&def.source_key) else {
            continue;
        };
        if let Some(value) = apply_modifier(def.modifier.as_ref(), *raw) {
            snapshot.samples.push(MetricSample {
                name: def.exposed_name.clone(),
                kind: def.kind,
                help: def.help.clone(),
                value,
            });
        }
    }
}

/// Serializable view used by the `test` command.
#[derive(Debug, Serialize)]
pub struct SampleView<'a> {
    pub name: &'a str,
    pub kind: MetricKind,
    pub value: f64,
}

impl MetricSnapshot {
    pub fn views(&self) -> Vec<SampleView<'_>> {
        self.samples
            .iter()
            .map(|s| SampleView {
                name: &s.name,
                kind: s.kind,
                value: s.value.as_f64(),
            })
            .collect()
    }
}
