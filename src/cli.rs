//! CLI arguments and subcommands for zone-metrics-agent.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parses a level name from a config file, ignoring case.
    pub fn parse(name: &str) -> Option<LogLevel> {
        <LogLevel as ValueEnum>::from_str(name.trim(), true).ok()
    }

    pub fn filter(&self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "zone-metrics-agent",
    about = "Prometheus agent for per-zone kstat, ZFS and clock metrics",
    long_about = "Prometheus agent for per-zone kstat, ZFS and clock metrics.\n\n\
                  Discovers running zones on the host and exposes their network, memory cap, \
                  CPU scheduling and ZFS quota counters for scraping, one endpoint per zone.",
    version = "0.1.0",
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level (overrides the config file; default: info)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Cache per-zone snapshots for N seconds (0 disables caching)
    #[arg(long)]
    pub cache_ttl: Option<u64>,

    /// Path to the zone inventory utility
    #[arg(long)]
    pub zoneadm_path: Option<String>,

    /// Path to the kstat utility
    #[arg(long)]
    pub kstat_path: Option<String>,

    /// Path to the zfs utility
    #[arg(long)]
    pub zfs_path: Option<String>,

    /// ZFS pool holding the zone datasets
    #[arg(long)]
    pub zfs_pool: Option<String>,

    /// Parallel collection threads (0 = auto)
    #[arg(long)]
    pub parallelism: Option<usize>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration and host utilities
    Check,

    /// Generate configuration files
    Config {
        /// Output file path
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },

    /// List the metric catalog
    Catalog {
        /// Show source module, key and modifier of every metric
        #[arg(long)]
        verbose: bool,

        /// Filter by source group name (e.g. memory-cap)
        #[arg(short = 'g', long)]
        group: Option<String>,
    },

    /// Discover zones and collect every zone once
    Test {
        /// Show every sample instead of counts only
        #[arg(long)]
        verbose: bool,

        /// Output format for verbose samples
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },
}
