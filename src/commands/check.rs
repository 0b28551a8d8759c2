//! Check command implementation.
//!
//! Validates host utilities and configuration.

use std::path::Path;

use crate::config::{validate_effective_config, Config};
use crate::state::build_engine;

/// Validates system requirements and configuration.
pub fn command_check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Zone Metrics Agent - System Check");
    println!("====================================");

    let mut all_ok = true;

    println!("\n🛠️  Checking host utilities...");
    for (name, path) in [
        ("zoneadm", config.zoneadm_path()),
        ("kstat", config.kstat_path()),
        ("zfs", config.zfs_path()),
    ] {
        if Path::new(path).exists() {
            println!("   ✅ {} found at {}", name, path);
        } else {
            println!("   ❌ {} not found at {}", name, path);
            all_ok = false;
        }
    }

    println!("\n📦 Checking zone discovery...");
    let engine = build_engine(config);
    match engine.refresh() {
        Ok(count) => println!("   ✅ Discovered {} zones", count),
        Err(e) => {
            println!("   ❌ Zone discovery failed: {}", e);
            all_ok = false;
        }
    }

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
