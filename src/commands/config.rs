//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates a configuration file with default values.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from(match format {
            ConfigFormat::Json => "zone-metrics-agent.json",
            ConfigFormat::Toml => "zone-metrics-agent.toml",
            ConfigFormat::Yaml => "zone-metrics-agent.yaml",
        }),
    };

    let content = render_config(&config, &format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}
