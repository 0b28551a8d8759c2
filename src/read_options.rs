//! Per-zone kstat query filters.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use crate::catalog::SourceGroup;
use crate::error::{CollectorError, Result};

/// Numeric zone id. Always positive; the global zone (0) is never instrumented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct InstanceId(NonZeroU32);

impl InstanceId {
    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<i64> for InstanceId {
    type Error = CollectorError;

    fn try_from(value: i64) -> Result<Self> {
        u32::try_from(value)
            .ok()
            .and_then(NonZeroU32::new)
            .map(InstanceId)
            .ok_or_else(|| {
                CollectorError::invalid(format!(
                    "instance id must be a positive integer, got {}",
                    value
                ))
            })
    }
}

impl FromStr for InstanceId {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self> {
        let value: i64 = s.trim().parse().map_err(|_| {
            CollectorError::invalid(format!("instance id must be an integer, got '{}'", s))
        })?;
        InstanceId::try_from(value)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Filter selecting the kstat record(s) of one source group for one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadOptions {
    pub module: String,
    pub class: String,
    pub instance: u32,
}

/// Derives the [`ReadOptions`] for every kstat-backed source group.
pub struct ReadOptionsBuilder;

impl ReadOptionsBuilder {
    /// Fails with `InvalidArgument` unless `instance_id` is a positive integer.
    pub fn build(instance_id: i64) -> Result<BTreeMap<SourceGroup, ReadOptions>> {
        let instance = InstanceId::try_from(instance_id)?;
        Ok(Self::for_instance(instance))
    }

    pub fn for_instance(instance: InstanceId) -> BTreeMap<SourceGroup, ReadOptions> {
        SourceGroup::ALL
            .into_iter()
            .filter_map(|group| {
                group.kstat_filter().map(|(module, class)| {
                    (
                        group,
                        ReadOptions {
                            module: module.to_string(),
                            class: class.to_string(),
                            instance: instance.get(),
                        },
                    )
                })
            })
            .collect()
    }
}
