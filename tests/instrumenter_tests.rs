//! Integration tests for per-zone collection.
//!
//! These tests drive `ZoneInstrumenter::collect()` against in-memory
//! readers and check modifier application and partial-snapshot behavior.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use common::{full_kstat, sources, FakeKstat};
use zone_metrics_agent::{
    CollectorError, MetricCatalog, MetricDefinition, MetricKind, MetricValue, SourceGroup,
    ZoneInstrumenter,
};

const ZONE: &str = "c2d4f0a6-1b4e-4c2a-9f3c-6f0e5a1d2b3c";

fn default_catalog() -> Arc<MetricCatalog> {
    Arc::new(MetricCatalog::default())
}

fn instrumenter(kstat: FakeKstat) -> ZoneInstrumenter {
    ZoneInstrumenter::new(ZONE, 3, default_catalog(), sources(kstat)).unwrap()
}

#[test]
fn test_new_rejects_missing_identity() {
    let result = ZoneInstrumenter::new("", 3, default_catalog(), sources(FakeKstat::default()));
    assert!(matches!(result, Err(CollectorError::InvalidArgument(_))));
}

#[test]
fn test_new_rejects_invalid_instance() {
    for bad in [0, -1] {
        let result =
            ZoneInstrumenter::new(ZONE, bad, default_catalog(), sources(FakeKstat::default()));
        assert!(matches!(result, Err(CollectorError::InvalidArgument(_))), "{}", bad);
    }
}

#[test]
fn test_read_options_use_instance_for_every_group() {
    let zone =
        ZoneInstrumenter::new(ZONE, 7, default_catalog(), sources(FakeKstat::default())).unwrap();
    assert_eq!(zone.identity(), ZONE);
    assert_eq!(zone.instance().get(), 7);

    let link = zone.read_options(SourceGroup::NetworkLink).unwrap();
    assert_eq!((link.module.as_str(), link.class.as_str(), link.instance), ("link", "net", 7));

    let mem = zone.read_options(SourceGroup::MemoryCap).unwrap();
    assert_eq!(
        (mem.module.as_str(), mem.class.as_str(), mem.instance),
        ("memory_cap", "zone_memory_cap", 7)
    );

    let misc = zone.read_options(SourceGroup::CpuScheduling).unwrap();
    assert_eq!(
        (misc.module.as_str(), misc.class.as_str(), misc.instance),
        ("zones", "zone_misc", 7)
    );
}

#[test]
fn test_cpu_user_usage_passes_through() {
    let kstat = FakeKstat::default().with("zones", &[("nsec_user", 500_000_000)]);
    let snapshot = instrumenter(kstat).collect();

    let sample = snapshot.get("cpu_user_usage").expect("cpu_user_usage present");
    assert_eq!(sample.value, MetricValue::Integer(500_000_000));
    assert_eq!(sample.kind, MetricKind::Counter);
    assert_eq!(sample.help, "User CPU utilization in nanoseconds");
}

#[test]
fn test_zero_physcap_is_omitted() {
    let kstat = FakeKstat::default().with("memory_cap", &[("rss", 4096), ("physcap", 0)]);
    let snapshot = instrumenter(kstat).collect();

    assert!(snapshot.get("mem_limit").is_none());
    assert_eq!(snapshot.get("mem_agg_usage").unwrap().value, MetricValue::Integer(4096));
}

#[test]
fn test_full_snapshot() {
    let snapshot = instrumenter(full_kstat()).collect();

    assert!(snapshot.failed_groups.is_empty());
    // 15 catalog entries minus mem_swap_limit (unlimited sentinel)
    assert_eq!(snapshot.len(), 14);
    assert!(snapshot.get("mem_swap_limit").is_none());

    assert_eq!(snapshot.get("net_agg_packets_in").unwrap().value, MetricValue::Integer(15));
    assert_eq!(snapshot.get("net_agg_bytes_out").unwrap().value, MetricValue::Integer(450));
    assert_eq!(snapshot.get("mem_limit").unwrap().value, MetricValue::Integer(1 << 30));
    assert_eq!(snapshot.get("load_average").unwrap().value, MetricValue::Float(1.5));
    assert_eq!(snapshot.get("load_average").unwrap().kind, MetricKind::Gauge);
    assert_eq!(snapshot.get("zfs_used").unwrap().value, MetricValue::Integer(1024));
    assert_eq!(snapshot.get("zfs_available").unwrap().value, MetricValue::Integer(4096));

    let clock = snapshot.get("time_of_day").unwrap();
    assert_eq!(clock.value, MetricValue::Integer(1_700_000_000));
    assert_eq!(clock.kind, MetricKind::Counter);
}

#[test]
fn test_snapshot_follows_catalog_order() {
    let snapshot = instrumenter(full_kstat()).collect();
    let names: Vec<&str> = snapshot.samples.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names.first(), Some(&"net_agg_packets_in"));
    assert_eq!(names.last(), Some(&"time_of_day"));
}

#[test]
fn test_failed_link_read_keeps_other_groups() {
    let snapshot = instrumenter(full_kstat().failing("link")).collect();

    assert_eq!(snapshot.failed_groups, vec![SourceGroup::NetworkLink]);
    assert!(snapshot.get("net_agg_packets_in").is_none());
    assert!(snapshot.get("net_agg_bytes_in").is_none());
    assert!(snapshot.get("mem_agg_usage").is_some());
    assert!(snapshot.get("cpu_user_usage").is_some());
    assert!(snapshot.get("zfs_used").is_some());
    assert!(snapshot.get("time_of_day").is_some());
}

#[test]
fn test_every_kstat_group_failing_still_reports_clock() {
    let kstat = FakeKstat::default()
        .failing("link")
        .failing("memory_cap")
        .failing("zones");
    let snapshot = instrumenter(kstat).collect();

    assert_eq!(snapshot.failed_groups.len(), 3);
    assert!(snapshot.get("time_of_day").is_some());
}

#[test]
fn test_alternate_catalog() {
    let mut groups = BTreeMap::new();
    groups.insert(
        SourceGroup::CpuScheduling,
        vec![MetricDefinition::new("zones", "nsec_sys", "sys_ns", MetricKind::Counter, "sys")],
    );
    let catalog = Arc::new(MetricCatalog::new(groups).unwrap());
    let kstat = FakeKstat::default()
        .with("zones", &[("nsec_sys", 42)])
        .failing("link");

    let zone = ZoneInstrumenter::new(ZONE, 3, catalog, sources(kstat)).unwrap();
    let snapshot = zone.collect();

    // Groups absent from the catalog are never read
    assert!(snapshot.failed_groups.is_empty());
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.get("sys_ns").unwrap().value, MetricValue::Integer(42));
}

#[test]
fn test_concurrent_collection() {
    let catalog = Arc::new(MetricCatalog::default());
    let shared = sources(full_kstat());

    let zones: Vec<ZoneInstrumenter> = (1..=8)
        .map(|i| {
            ZoneInstrumenter::new(&format!("zone-{}", i), i, catalog.clone(), shared.clone())
                .unwrap()
        })
        .collect();

    std::thread::scope(|s| {
        let handles: Vec<_> = zones.iter().map(|z| s.spawn(move || z.collect())).collect();
        for handle in handles {
            let snapshot = handle.join().unwrap();
            assert_eq!(snapshot.len(), 14);
        }
    });
}
