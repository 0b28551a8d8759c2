//! Catalog command implementation.
//!
//! Lists the metrics the agent exposes, grouped by source group.

use zone_metrics_agent::{MetricCatalog, SourceGroup, ValueModifier};

/// Lists the metric catalog, optionally filtered to one source group.
pub fn command_catalog(
    verbose: bool,
    group: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = match group.as_deref() {
        Some(name) => Some(
            SourceGroup::from_name(name)
                .ok_or_else(|| format!("Unknown source group '{}'", name))?,
        ),
        None => None,
    };

    println!("📊 Zone Metrics Agent - Metric Catalog");
    println!("======================================");

    let catalog = MetricCatalog::default();
    let mut shown = 0usize;

    for (source_group, definitions) in catalog.groups() {
        if filter.is_some_and(|f| f != source_group) {
            continue;
        }

        println!("\n🏷️  Group: {}", source_group);
        if let Some((module, class)) = source_group.kstat_filter() {
            println!("   kstat module={} class={}", module, class);
        }
        println!("{}", "─".repeat(50));

        for def in definitions {
            shown += 1;
            println!("   ├─ {} ({}) - {}", def.exposed_name, def.kind, def.help);
            if verbose {
                println!("   │  ├─ Source: {}:{}", def.source_module, def.source_key);
                let modifier = match def.modifier {
                    Some(ValueModifier::LoadAverage) => "load average (raw / 256)".to_string(),
                    Some(ValueModifier::MemoryLimit(s)) => {
                        format!("memory limit (omitted when {} or {})", s.unset, s.unlimited)
                    }
                    None => "none".to_string(),
                };
                println!("   │  └─ Modifier: {}", modifier);
            }
        }
    }

    println!("\n📋 Total: {} metrics", shown);
    Ok(())
}
