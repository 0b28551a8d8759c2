//! Value modifiers applied to raw kstat readings.
//!
//! A modifier turns a raw `u64` counter into the value that is exposed,
//! or into `None` when the reading carries no meaning (e.g. "no limit").

use serde::Serialize;
use std::fmt;

/// Fixed-point scale of the kernel's `avenrun` load averages.
pub const FSCALE: u64 = 256;

/// Raw values the kernel uses to mean "no limit configured".
///
/// Kept as a named pair so other platforms can supply their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LimitSentinels {
    pub unlimited: u64,
    pub unset: u64,
}

impl LimitSentinels {
    pub const DEFAULT: LimitSentinels = LimitSentinels {
        unlimited: u64::MAX,
        unset: 0,
    };

    pub fn matches(&self, raw: u64) -> bool {
        raw == self.unlimited || raw == self.unset
    }
}

impl Default for LimitSentinels {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A metric value after modification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Integer(u64),
    Float(f64),
}

impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            MetricValue::Integer(v) => v as f64,
            MetricValue::Float(v) => v,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Integer(v) => write!(f, "{}", v),
            MetricValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Transform attached to a metric definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueModifier {
    /// Fixed-point scheduler load to floating point load average.
    LoadAverage,
    /// Memory/swap cap; sentinel values become absent.
    MemoryLimit(LimitSentinels),
}

impl ValueModifier {
    pub fn apply(&self, raw: u64) -> Option<MetricValue> {
        match self {
            ValueModifier::LoadAverage => Some(MetricValue::Float(calculate_load_avg(raw))),
            ValueModifier::MemoryLimit(sentinels) => {
                mem_limit_with(raw, sentinels).map(MetricValue::Integer)
            }
        }
    }
}

/// Applies an optional modifier; `None` passes the raw value through.
pub fn apply_modifier(modifier: Option<&ValueModifier>, raw: u64) -> Option<MetricValue> {
    match modifier {
        Some(m) => m.apply(raw),
        None => Some(MetricValue::Integer(raw)),
    }
}

/// Converts a raw `avenrun_*` value into a load average.
pub fn calculate_load_avg(raw: u64) -> f64 {
    raw as f64 / FSCALE as f64
}

/// Returns `None` for the default "no limit" sentinels, else the raw value.
pub fn mem_limit(raw: u64) -> Option<u64> {
    mem_limit_with(raw, &LimitSentinels::DEFAULT)
}

pub fn mem_limit_with(raw: u64, sentinels: &LimitSentinels) -> Option<u64> {
    if sentinels.matches(raw) {
        None
    } else {
        Some(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_avg_scales_by_fscale() {
        for v in [0u64, 1, 255, 256, 512, 1000, 123_456, u32::MAX as u64] {
            assert_eq!(calculate_load_avg(v), v as f64 / 256.0);
        }
        assert_eq!(calculate_load_avg(384), 1.5);
    }

    #[test]
    fn test_mem_limit_sentinels() {
        assert_eq!(mem_limit(0), None);
        assert_eq!(mem_limit(u64::MAX), None);
        assert_eq!(mem_limit(1), Some(1));
        assert_eq!(mem_limit(u64::MAX - 1), Some(u64::MAX - 1));
        assert_eq!(mem_limit(1_073_741_824), Some(1_073_741_824));
    }

    #[test]
    fn test_custom_sentinels() {
        let sentinels = LimitSentinels {
            unlimited: 1 << 62,
            unset: 0,
        };
        assert_eq!(mem_limit_with(1 << 62, &sentinels), None);
        assert_eq!(mem_limit_with(u64::MAX, &sentinels), Some(u64::MAX));
    }

    #[test]
    fn test_apply_modifier() {
        assert_eq!(apply_modifier(None, 42), Some(MetricValue::Integer(42)));
        assert_eq!(
            apply_modifier(Some(&ValueModifier::LoadAverage), 512),
            Some(MetricValue::Float(2.0))
        );
        let limit = ValueModifier::MemoryLimit(LimitSentinels::DEFAULT);
        assert_eq!(apply_modifier(Some(&limit), 0), None);
        assert_eq!(apply_modifier(Some(&limit), 4096), Some(MetricValue::Integer(4096)));
    }
}
