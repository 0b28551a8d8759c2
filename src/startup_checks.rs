//! Startup requirement validation for zone-metrics-agent.
//!
//! This module validates that the agent has the privileges and host
//! utilities it needs before starting.

use nix::unistd::geteuid;
use std::path::Path;
use tracing::{error, info, warn};

use crate::config::Config;

/// Validate all runtime requirements
pub fn validate_requirements(config: &Config) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    check_user_privileges();
    check_utility("zoneadm", config.zoneadm_path())?;
    check_utility("kstat", config.kstat_path())?;

    if !Path::new(config.zfs_path()).exists() {
        warn!(
            "⚠️  zfs not found at {} - filesystem quota metrics will be omitted",
            config.zfs_path()
        );
    }

    info!("✅ All runtime requirements validated");
    Ok(())
}

/// Zone kstats of other zones are only visible from the global zone as root
fn check_user_privileges() {
    if !geteuid().is_root() {
        warn!("⚠️  Not running as root - kstats of other zones may be unreadable");
    } else {
        info!("✅ Running as root (uid=0)");
    }
}

fn check_utility(name: &str, path: &str) -> Result<(), ValidationError> {
    if Path::new(path).exists() {
        info!("✅ {} available at {}", name, path);
        Ok(())
    } else {
        error!("❌ {} not found at {}", name, path);
        Err(ValidationError::MissingUtility {
            name: name.to_string(),
            path: path.to_string(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Required utility {name} not found at {path}")]
    MissingUtility { name: String, path: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_utility_is_reported() {
        let err = check_utility("kstat", "/nonexistent/kstat-12345").unwrap_err();
        assert!(err.to_string().contains("kstat"));
    }

    #[test]
    fn test_existing_utility_passes() {
        assert!(check_utility("sh", "/bin/sh").is_ok());
    }
}
