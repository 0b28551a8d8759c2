//! Wall-clock source for the `time_of_day` metric.

/// Source of the current time in whole seconds since the Unix epoch.
pub trait WallClock: Send + Sync {
    fn now_seconds(&self) -> u64;
}

/// System clock via chrono.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now_seconds(&self) -> u64 {
        // Clamp pre-epoch clocks to zero
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now_seconds() > 1_577_836_800);
    }
}
