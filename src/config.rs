//! Configuration management for zone-metrics-agent.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat, LogLevel};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9163;
pub const DEFAULT_CACHE_TTL: u64 = 10;
pub const DEFAULT_ZONEADM_PATH: &str = "/usr/sbin/zoneadm";
pub const DEFAULT_KSTAT_PATH: &str = "/usr/bin/kstat";
pub const DEFAULT_ZFS_PATH: &str = "/usr/sbin/zfs";
pub const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Info;

/// Agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Collection
    #[serde(alias = "cache-ttl")]
    pub cache_ttl: Option<u64>,
    pub parallelism: Option<usize>,

    // Host utilities
    #[serde(alias = "zoneadm-path")]
    pub zoneadm_path: Option<String>,
    #[serde(alias = "kstat-path")]
    pub kstat_path: Option<String>,
    #[serde(alias = "zfs-path")]
    pub zfs_path: Option<String>,
    #[serde(alias = "zfs-pool")]
    pub zfs_pool: Option<String>,

    // Logging
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            cache_ttl: Some(DEFAULT_CACHE_TTL),
            parallelism: None,
            zoneadm_path: Some(DEFAULT_ZONEADM_PATH.to_string()),
            kstat_path: Some(DEFAULT_KSTAT_PATH.to_string()),
            zfs_path: Some(DEFAULT_ZFS_PATH.to_string()),
            zfs_pool: Some(zone_metrics_agent::collectors::DEFAULT_ZFS_POOL.to_string()),
            log_level: Some(DEFAULT_LOG_LEVEL.as_str().to_string()),
        }
    }
}

impl Config {
    pub fn zoneadm_path(&self) -> &str {
        self.zoneadm_path.as_deref().unwrap_or(DEFAULT_ZONEADM_PATH)
    }

    pub fn kstat_path(&self) -> &str {
        self.kstat_path.as_deref().unwrap_or(DEFAULT_KSTAT_PATH)
    }

    pub fn zfs_path(&self) -> &str {
        self.zfs_path.as_deref().unwrap_or(DEFAULT_ZFS_PATH)
    }

    /// Effective log level. Unparseable names are rejected by validation.
    pub fn log_level(&self) -> LogLevel {
        self.log_level
            .as_deref()
            .and_then(LogLevel::parse)
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn zfs_pool(&self) -> &str {
        self.zfs_pool
            .as_deref()
            .unwrap_or(zone_metrics_agent::collectors::DEFAULT_ZFS_POOL)
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if cfg.port == Some(0) {
        return Err("port must be non-zero".into());
    }

    let paths = [
        ("zoneadm_path", cfg.zoneadm_path.as_deref()),
        ("kstat_path", cfg.kstat_path.as_deref()),
        ("zfs_path", cfg.zfs_path.as_deref()),
        ("zfs_pool", cfg.zfs_pool.as_deref()),
    ];
    for (name, value) in paths {
        if value.is_some_and(|v| v.trim().is_empty()) {
            return Err(format!("{} must not be empty", name).into());
        }
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if LogLevel::parse(level).is_none() {
            return Err(format!(
                "Invalid log_level '{}': expected off, error, warn, info, debug or trace",
                level
            )
            .into());
        }
    }

    if let Some(bind) = cfg.bind.as_deref() {
        bind.parse::<std::net::IpAddr>()
            .map_err(|e| format!("Invalid bind address '{}': {}", bind, e))?;
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref().and_then(|p| p.to_str()))?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }
    if let Some(cache_ttl) = args.cache_ttl {
        config.cache_ttl = Some(cache_ttl);
    }
    if let Some(threads) = args.parallelism {
        config.parallelism = Some(threads);
    }
    if let Some(path) = &args.zoneadm_path {
        config.zoneadm_path = Some(path.clone());
    }
    if let Some(path) = &args.kstat_path {
        config.kstat_path = Some(path.clone());
    }
    if let Some(path) = &args.zfs_path {
        config.zfs_path = Some(path.clone());
    }
    if let Some(pool) = &args.zfs_pool {
        config.zfs_pool = Some(pool.clone());
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }

    Ok(config)
}

/// Configuration loading with multiple format support
pub fn load_config(path: Option<&str>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = if let Some(p) = path {
        PathBuf::from(p)
    } else {
        let defaults = [
            "/etc/zone-metrics-agent/config.yaml",
            "/etc/zone-metrics-agent/config.yml",
            "/etc/zone-metrics-agent/config.json",
            "./zone-metrics-agent.yaml",
            "./zone-metrics-agent.yml",
            "./zone-metrics-agent.json",
        ];

        defaults
            .iter()
            .find(|p| Path::new(p).exists())
            .map(PathBuf::from)
            .unwrap_or_default()
    };

    if path.as_os_str().is_empty() || !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Renders configuration in the requested format
pub fn render_config(
    config: &Config,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(
    config: &Config,
    format: ConfigFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}
