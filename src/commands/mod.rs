//! CLI command implementations for zone-metrics-agent.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: Host utility and configuration validation
//! - `config`: Configuration file generation
//! - `catalog`: Metric catalog listing
//! - `test`: One-shot discovery and collection

pub mod catalog;
pub mod check;
pub mod config;
pub mod test;

// Re-export command functions
pub use catalog::command_catalog;
pub use check::command_check;
pub use config::command_config;
pub use test::command_test;
