//! In-memory data sources shared by the integration tests.

#![allow(dead_code)]

use ahash::AHashMap as HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use zone_metrics_agent::{
    CollectorError, KstatReader, KstatRecord, QuotaReader, ReadOptions, Sources, WallClock,
};

/// kstat reader returning canned records per module, failing for modules
/// listed in `failing`.
#[derive(Default)]
pub struct FakeKstat {
    pub records: HashMap<String, Vec<KstatRecord>>,
    pub failing: Vec<String>,
    pub reads: AtomicUsize,
}

impl FakeKstat {
    pub fn with(mut self, module: &str, fields: &[(&str, u64)]) -> Self {
        let record: KstatRecord = fields.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        self.records.entry(module.to_string()).or_default().push(record);
        self
    }

    pub fn failing(mut self, module: &str) -> Self {
        self.failing.push(module.to_string());
        self
    }
}

impl KstatReader for FakeKstat {
    fn read(&self, opts: &ReadOptions) -> Result<Vec<KstatRecord>, CollectorError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&opts.module) {
            return Err(CollectorError::read_failure(&opts.module, "zone went away"));
        }
        match self.records.get(&opts.module) {
            Some(records) => Ok(records.clone()),
            None => Err(CollectorError::read_failure(&opts.module, "no kstat matched")),
        }
    }
}

/// Quota reader returning fixed values, or failing when `fail` is set.
pub struct FakeQuota {
    pub used: u64,
    pub available: u64,
    pub fail: bool,
}

impl QuotaReader for FakeQuota {
    fn read(&self, dataset: &str) -> Result<HashMap<String, u64>, CollectorError> {
        if self.fail {
            return Err(CollectorError::read_failure("zfs", format!("{} not found", dataset)));
        }
        let mut props = HashMap::new();
        props.insert("used".to_string(), self.used);
        props.insert("available".to_string(), self.available);
        Ok(props)
    }
}

pub struct FixedClock(pub u64);

impl WallClock for FixedClock {
    fn now_seconds(&self) -> u64 {
        self.0
    }
}

pub fn sources(kstat: FakeKstat) -> Sources {
    Sources::new(
        Arc::new(kstat),
        Arc::new(FakeQuota {
            used: 1024,
            available: 4096,
            fail: false,
        }),
        Arc::new(FixedClock(1_700_000_000)),
    )
}

/// A kstat reader populated for every group of the default catalog.
pub fn full_kstat() -> FakeKstat {
    FakeKstat::default()
        .with(
            "link",
            &[
                ("ipackets64", 10),
                ("opackets64", 20),
                ("rbytes64", 300),
                ("obytes64", 400),
            ],
        )
        .with(
            "link",
            &[
                ("ipackets64", 5),
                ("opackets64", 5),
                ("rbytes64", 50),
                ("obytes64", 50),
            ],
        )
        .with(
            "memory_cap",
            &[
                ("rss", 2048),
                ("physcap", 1 << 30),
                ("swap", 512),
                ("swapcap", u64::MAX),
            ],
        )
        .with(
            "zones",
            &[
                ("nsec_user", 500_000_000),
                ("nsec_sys", 250_000_000),
                ("nsec_waitrq", 1000),
                ("avenrun_1min", 384),
            ],
        )
}
