//! Declarative metric catalog.
//!
//! Maps every source group (one kstat query, the ZFS quota query, or the
//! wall clock) to the ordered list of metrics it feeds. The catalog is an
//! immutable value built once at startup and shared by all instrumenters.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::{CollectorError, Result};
use crate::modifiers::{LimitSentinels, ValueModifier};

/// Prometheus metric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Counter => write!(f, "counter"),
            MetricKind::Gauge => write!(f, "gauge"),
        }
    }
}

/// Groups of metrics sharing one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceGroup {
    NetworkLink,
    MemoryCap,
    CpuScheduling,
    FilesystemQuota,
    WallClock,
}

impl SourceGroup {
    pub const ALL: [SourceGroup; 5] = [
        SourceGroup::NetworkLink,
        SourceGroup::MemoryCap,
        SourceGroup::CpuScheduling,
        SourceGroup::FilesystemQuota,
        SourceGroup::WallClock,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SourceGroup::NetworkLink => "network-link",
            SourceGroup::MemoryCap => "memory-cap",
            SourceGroup::CpuScheduling => "cpu-scheduling",
            SourceGroup::FilesystemQuota => "filesystem-quota",
            SourceGroup::WallClock => "wall-clock",
        }
    }

    /// The `(module, class)` kstat filter, for groups backed by kstat.
    pub fn kstat_filter(&self) -> Option<(&'static str, &'static str)> {
        match self {
            SourceGroup::NetworkLink => Some(("link", "net")),
            SourceGroup::MemoryCap => Some(("memory_cap", "zone_memory_cap")),
            SourceGroup::CpuScheduling => Some(("zones", "zone_misc")),
            SourceGroup::FilesystemQuota | SourceGroup::WallClock => None,
        }
    }

    pub fn from_name(name: &str) -> Option<SourceGroup> {
        SourceGroup::ALL.into_iter().find(|g| g.name() == name)
    }
}

impl fmt::Display for SourceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One exposable metric and where its raw value comes from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDefinition {
    /// kstat module, `zfs` or `time`.
    pub source_module: String,
    /// Field name inside the source record.
    pub source_key: String,
    pub exposed_name: String,
    pub kind: MetricKind,
    pub help: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<ValueModifier>,
}

impl MetricDefinition {
    pub fn new(
        source_module: &str,
        source_key: &str,
        exposed_name: &str,
        kind: MetricKind,
        help: &str,
    ) -> Self {
        Self {
            source_module: source_module.to_string(),
            source_key: source_key.to_string(),
            exposed_name: exposed_name.to_string(),
            kind,
            help: help.to_string(),
            modifier: None,
        }
    }

    pub fn with_modifier(mut self, modifier: ValueModifier) -> Self {
        self.modifier = Some(modifier);
        self
    }
}

/// Immutable mapping of source group to its metric definitions.
#[derive(Debug, Clone, Serialize)]
pub struct MetricCatalog {
    groups: BTreeMap<SourceGroup, Vec<MetricDefinition>>,
}

impl MetricCatalog {
    /// Builds a catalog, rejecting duplicate exposed names.
    pub fn new(groups: BTreeMap<SourceGroup, Vec<MetricDefinition>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for def in groups.values().flatten() {
            if def.exposed_name.is_empty() {
                return Err(CollectorError::invalid("metric exposed name must not be empty"));
            }
            if !seen.insert(def.exposed_name.as_str()) {
                return Err(CollectorError::invalid(format!(
                    "duplicate metric name '{}' in catalog",
                    def.exposed_name
                )));
            }
        }
        Ok(Self { groups })
    }

    pub fn groups(&self) -> impl Iterator<Item = (SourceGroup, &[MetricDefinition])> {
        self.groups.iter().map(|(g, defs)| (*g, defs.as_slice()))
    }

    pub fn definitions(&self, group: SourceGroup) -> &[MetricDefinition] {
        self.groups.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn find(&self, exposed_name: &str) -> Option<&MetricDefinition> {
        self.groups
            .values()
            .flatten()
            .find(|d| d.exposed_name == exposed_name)
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MetricCatalog {
    fn default() -> Self {
        use MetricKind::{Counter, Gauge};

        let limit = ValueModifier::MemoryLimit(LimitSentinels::DEFAULT);
        let mut groups = BTreeMap::new();

        groups.insert(
            SourceGroup::NetworkLink,
            vec![
                MetricDefinition::new(
                    "link",
                    "ipackets64",
                    "net_agg_packets_in",
                    Counter,
                    "Aggregate inbound packets",
                ),
                MetricDefinition::new(
                    "link",
                    "opackets64",
                    "net_agg_packets_out",
                    Counter,
                    "Aggregate outbound packets",
                ),
                MetricDefinition::new(
                    "link",
                    "rbytes64",
                    "net_agg_bytes_in",
                    Counter,
                    "Aggregate inbound bytes",
                ),
                MetricDefinition::new(
                    "link",
                    "obytes64",
                    "net_agg_bytes_out",
                    Counter,
                    "Aggregate outbound bytes",
                ),
            ],
        );
        groups.insert(
            SourceGroup::MemoryCap,
            vec![
                MetricDefinition::new(
                    "memory_cap",
                    "rss",
                    "mem_agg_usage",
                    Gauge,
                    "Aggregate memory usage in bytes",
                ),
                MetricDefinition::new(
                    "memory_cap",
                    "physcap",
                    "mem_limit",
                    Gauge,
                    "Memory limit in bytes",
                )
                .with_modifier(limit),
                MetricDefinition::new("memory_cap", "swap", "mem_swap", Gauge, "Swap in bytes"),
                MetricDefinition::new(
                    "memory_cap",
                    "swapcap",
                    "mem_swap_limit",
                    Gauge,
                    "Swap limit in bytes",
                )
                .with_modifier(limit),
            ],
        );
        groups.insert(
            SourceGroup::CpuScheduling,
            vec![
                MetricDefinition::new(
                    "zones",
                    "nsec_user",
                    "cpu_user_usage",
                    Counter,
                    "User CPU utilization in nanoseconds",
                ),
                MetricDefinition::new(
                    "zones",
                    "nsec_sys",
                    "cpu_sys_usage",
                    Counter,
                    "System CPU usage in nanoseconds",
                ),
                MetricDefinition::new(
                    "zones",
                    "nsec_waitrq",
                    "cpu_wait_time",
                    Counter,
                    "CPU wait time in nanoseconds",
                ),
                MetricDefinition::new(
                    "zones",
                    "avenrun_1min",
                    "load_average",
                    Gauge,
                    "Load average",
                )
                .with_modifier(ValueModifier::LoadAverage),
            ],
        );
        groups.insert(
            SourceGroup::FilesystemQuota,
            vec![
                MetricDefinition::new("zfs", "used", "zfs_used", Gauge, "zfs space used in bytes"),
                MetricDefinition::new(
                    "zfs",
                    "available",
                    "zfs_available",
                    Gauge,
                    "zfs space available in bytes",
                ),
            ],
        );
        groups.insert(
            SourceGroup::WallClock,
            vec![MetricDefinition::new(
                "time",
                "now",
                "time_of_day",
                Counter,
                "System time in seconds since epoch",
            )],
        );

        Self { groups }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_names_are_unique() {
        let catalog = MetricCatalog::default();
        let rebuilt = MetricCatalog::new(catalog.groups.clone());
        assert!(rebuilt.is_ok());
        assert_eq!(catalog.len(), 15);
    }

    #[test]
    fn test_default_catalog_kinds_and_modifiers() {
        let catalog = MetricCatalog::default();

        let cpu = catalog.find("cpu_user_usage").unwrap();
        assert_eq!(cpu.kind, MetricKind::Counter);
        assert_eq!(cpu.source_key, "nsec_user");
        assert!(cpu.modifier.is_none());

        let load = catalog.find("load_average").unwrap();
        assert_eq!(load.kind, MetricKind::Gauge);
        assert_eq!(load.modifier, Some(ValueModifier::LoadAverage));

        let mem = catalog.find("mem_limit").unwrap();
        assert!(matches!(mem.modifier, Some(ValueModifier::MemoryLimit(_))));

        assert_eq!(catalog.definitions(SourceGroup::NetworkLink).len(), 4);
        assert_eq!(catalog.definitions(SourceGroup::WallClock).len(), 1);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut groups = BTreeMap::new();
        groups.insert(
            SourceGroup::MemoryCap,
            vec![MetricDefinition::new("memory_cap", "rss", "dup", MetricKind::Gauge, "a")],
        );
        groups.insert(
            SourceGroup::CpuScheduling,
            vec![MetricDefinition::new("zones", "nsec_sys", "dup", MetricKind::Counter, "b")],
        );
        let err = MetricCatalog::new(groups).unwrap_err();
        assert!(matches!(err, CollectorError::InvalidArgument(_)));
    }

    #[test]
    fn test_source_group_names() {
        for group in SourceGroup::ALL {
            assert_eq!(SourceGroup::from_name(group.name()), Some(group));
        }
        assert_eq!(SourceGroup::from_name("bogus"), None);
        assert_eq!(
            SourceGroup::MemoryCap.kstat_filter(),
            Some(("memory_cap", "zone_memory_cap"))
        );
        assert_eq!(SourceGroup::WallClock.kstat_filter(), None);
    }
}
