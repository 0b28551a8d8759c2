//! ZFS dataset accounting for zone quota metrics.

use ahash::AHashMap as HashMap;

use super::run_command;
use crate::error::{CollectorError, Result};

/// Pool holding one dataset per zone, named after the zone UUID.
pub const DEFAULT_ZFS_POOL: &str = "zones";

/// Properties requested from `zfs list`, in output column order.
const ZFS_PROPERTIES: [&str; 2] = ["used", "available"];

/// Reads space accounting for a dataset.
pub trait QuotaReader: Send + Sync {
    /// Returns property name -> bytes for `dataset`.
    fn read(&self, dataset: &str) -> Result<HashMap<String, u64>>;

    /// Dataset backing the zone with the given identity.
    fn dataset_for(&self, identity: &str) -> String {
        format!("{}/{}", DEFAULT_ZFS_POOL, identity)
    }
}

/// Runs `zfs list -Hp -o used,available <dataset>`.
#[derive(Debug, Clone)]
pub struct ZfsCommandReader {
    program: String,
    pool: String,
}

impl ZfsCommandReader {
    pub fn new(program: impl Into<String>, pool: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            pool: pool.into(),
        }
    }
}

impl Default for ZfsCommandReader {
    fn default() -> Self {
        Self::new("/usr/sbin/zfs", DEFAULT_ZFS_POOL)
    }
}

impl QuotaReader for ZfsCommandReader {
    fn read(&self, dataset: &str) -> Result<HashMap<String, u64>> {
        let args = vec![
            "list".to_string(),
            "-Hp".to_string(),
            "-o".to_string(),
            ZFS_PROPERTIES.join(","),
            dataset.to_string(),
        ];
        let stdout = run_command(&self.program, &args)
            .map_err(|e| CollectorError::read_failure("zfs", e.to_string()))?;
        parse_zfs_list(&stdout)
    }

    fn dataset_for(&self, identity: &str) -> String {
        format!("{}/{}", self.pool, identity)
    }
}

/// Parses the single tab-separated line printed by `zfs list -Hp`.
pub fn parse_zfs_list(output: &str) -> Result<HashMap<String, u64>> {
    let line = output
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| CollectorError::read_failure("zfs", "empty zfs list output"))?;

    let values: Vec<&str> = line.split('\t').collect();
    if values.len() < ZFS_PROPERTIES.len() {
        return Err(CollectorError::read_failure(
            "zfs",
            format!("expected {} columns, got {}", ZFS_PROPERTIES.len(), values.len()),
        ));
    }

    let mut props = HashMap::new();
    for (name, raw) in ZFS_PROPERTIES.iter().zip(values) {
        let value = raw.trim().parse::<u64>().map_err(|e| {
            CollectorError::read_failure("zfs", format!("invalid {} value '{}': {}", name, raw, e))
        })?;
        props.insert(name.to_string(), value);
    }
    Ok(props)
}
