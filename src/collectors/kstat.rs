//! Kernel statistics (kstat) readers.
//!
//! The production reader shells out to `kstat -p`, whose parseable output
//! looks like:
//!
//! ```text
//! memory_cap:3:a1b2c3d4-...:rss	2097152
//! memory_cap:3:a1b2c3d4-...:physcap	1073741824
//! ```

use ahash::AHashMap as HashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Mutex;

use super::run_command;
use crate::error::{CollectorError, Result};
use crate::read_options::ReadOptions;

/// Integer statistics of one kstat, keyed by statistic name.
pub type KstatRecord = HashMap<String, u64>;

/// Shared, thread-safe kstat reader.
///
/// An empty match is an error: the zone is gone or never had the kstat.
pub trait KstatReader: Send + Sync {
    fn read(&self, opts: &ReadOptions) -> Result<Vec<KstatRecord>>;
}

/// A reader that needs exclusive access for each read (e.g. a kstat chain
/// handle that must be updated before lookups).
pub trait KstatSource: Send {
    fn read(&mut self, opts: &ReadOptions) -> Result<Vec<KstatRecord>>;
}

/// Serializes all reads through one [`KstatSource`] so it can be shared by
/// concurrently collecting instrumenters.
pub struct SerializedReader<S> {
    inner: Mutex<S>,
}

impl<S: KstatSource> SerializedReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            inner: Mutex::new(source),
        }
    }
}

impl<S: KstatSource> KstatReader for SerializedReader<S> {
    fn read(&self, opts: &ReadOptions) -> Result<Vec<KstatRecord>> {
        let mut guard = self.inner.lock().map_err(|e| {
            CollectorError::read_failure(&opts.module, format!("reader lock poisoned: {}", e))
        })?;
        guard.read(opts)
    }
}

/// `module:instance:name:statistic<TAB>value`
static KSTAT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^:]+):(\d+):([^:]+):([^\t]+)\t(.*)$").expect("valid kstat line regex")
});

/// Reads kstats by invoking the `kstat(1M)` utility.
///
/// Each invocation is a separate process, so the reader is safe to share.
#[derive(Debug, Clone)]
pub struct KstatCommandReader {
    program: String,
}

impl KstatCommandReader {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for KstatCommandReader {
    fn default() -> Self {
        Self::new("/usr/bin/kstat")
    }
}

impl KstatReader for KstatCommandReader {
    fn read(&self, opts: &ReadOptions) -> Result<Vec<KstatRecord>> {
        let args = vec![
            "-p".to_string(),
            "-m".to_string(),
            opts.module.clone(),
            "-c".to_string(),
            opts.class.clone(),
            "-i".to_string(),
            opts.instance.to_string(),
        ];
        let stdout = run_command(&self.program, &args)
            .map_err(|e| CollectorError::read_failure(&opts.module, e.to_string()))?;

        let records = parse_kstat_output(&stdout);
        if records.is_empty() {
            return Err(CollectorError::read_failure(
                &opts.module,
                format!(
                    "no kstat matched module={} class={} instance={}",
                    opts.module, opts.class, opts.instance
                ),
            ));
        }
        Ok(records)
    }
}

/// Parses `kstat -p` output into one record per kstat name.
///
/// Non-integer statistics (`snaptime`, `zonename`, ...) are dropped.
pub fn parse_kstat_output(output: &str) -> Vec<KstatRecord> {
    let mut order: Vec<(String, String, String)> = Vec::new();
    let mut records: HashMap<(String, String, String), KstatRecord> = HashMap::new();

    for line in output.lines() {
        let Some(caps) = KSTAT_LINE.captures(line) else {
            continue;
        };
        let key = (caps[1].to_string(), caps[2].to_string(), caps[3].to_string());
        let Ok(value) = caps[5].trim().parse::<u64>() else {
            continue;
        };

        let record = records.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            KstatRecord::new()
        });
        record.insert(caps[4].to_string(), value);
    }

    order
        .into_iter()
        .filter_map(|key| records.remove(&key))
        .collect()
}

/// Sums every statistic across records, saturating on overflow.
pub fn merge_records(records: &[KstatRecord]) -> KstatRecord {
    let mut merged = KstatRecord::new();
    for record in records {
        for (key, value) in record {
            let slot = merged.entry(key.clone()).or_insert(0);
            *slot = slot.saturating_add(*value);
        }
    }
    merged
}
