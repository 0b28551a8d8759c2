//! Test command implementation.
//!
//! Discovers zones, collects every zone once and displays the results.

use serde::Serialize;
use std::time::Instant;

use crate::cli::ConfigFormat;
use crate::config::Config;
use crate::state::build_engine;

#[derive(Serialize)]
struct ZoneReport<'a> {
    zone: &'a str,
    failed_groups: Vec<&'static str>,
    samples: Vec<zone_metrics_agent::instrumenter::SampleView<'a>>,
}

/// Tests metrics collection against the live host.
pub fn command_test(
    verbose: bool,
    format: ConfigFormat,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🧪 Zone Metrics Agent - Test Mode");
    println!("=================================");

    let engine = build_engine(config);

    let start = Instant::now();
    let zones = engine.refresh()?;
    println!(
        "   📁 Found {} zones in {:.2}ms",
        zones,
        start.elapsed().as_secs_f64() * 1000.0
    );

    let start = Instant::now();
    let results = engine.collect_all();
    println!(
        "   ⏱️  Collection duration: {:.2}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );

    let mut partial = 0usize;
    for (zone, snapshot) in &results {
        if !snapshot.failed_groups.is_empty() {
            partial += 1;
        }
        if verbose {
            let report = ZoneReport {
                zone,
                failed_groups: snapshot.failed_groups.iter().map(|g| g.name()).collect(),
                samples: snapshot.views(),
            };
            let rendered = match format {
                ConfigFormat::Json => serde_json::to_string_pretty(&report)?,
                ConfigFormat::Toml => toml::to_string_pretty(&report)?,
                ConfigFormat::Yaml => serde_yaml::to_string(&report)?,
            };
            println!("{}", rendered);
        } else {
            println!("   ├─ {}: {} metrics", zone, snapshot.len());
        }
    }

    println!("   📊 Collected: {} zones", results.len());
    println!("   ⚠️  Partial snapshots: {}", partial);
    println!("\n✅ Test completed successfully");
    Ok(())
}
