//! Raw data sources consumed by the instrumenters.
//!
//! This module contains the readers for kernel statistics (kstat), ZFS
//! dataset accounting and the wall clock, plus the helper used to run the
//! host utilities they wrap.

pub mod clock;
pub mod kstat;
pub mod zfs;

use std::process::Command;
use std::sync::Arc;
use tracing::debug;

use crate::error::{CollectorError, Result};

pub use clock::{SystemClock, WallClock};
pub use kstat::{KstatCommandReader, KstatReader, KstatRecord, KstatSource, SerializedReader};
pub use zfs::{QuotaReader, ZfsCommandReader, DEFAULT_ZFS_POOL};

/// Shared handles to every data source an instrumenter reads from.
#[derive(Clone)]
pub struct Sources {
    pub kstat: Arc<dyn KstatReader>,
    pub quota: Arc<dyn QuotaReader>,
    pub clock: Arc<dyn WallClock>,
}

impl Sources {
    pub fn new(
        kstat: Arc<dyn KstatReader>,
        quota: Arc<dyn QuotaReader>,
        clock: Arc<dyn WallClock>,
    ) -> Self {
        Self { kstat, quota, clock }
    }
}

/// Runs `program args...` and returns its stdout.
///
/// Spawn failures and non-zero exits are reported as `Execution` errors.
pub fn run_command(program: &str, args: &[String]) -> Result<String> {
    let command_line = format!("{} {}", program, args.join(" "));
    debug!("Running: {}", command_line.trim_end());

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| CollectorError::Execution {
            command: command_line.clone(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CollectorError::Execution {
            command: command_line,
            reason: format!("exited with {}: {}", output.status, stderr.trim()),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
