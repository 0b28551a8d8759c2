//! HTTP endpoint handlers for the agent.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/v1/{zone}/metrics`: Prometheus metrics for one zone
//! - `/v1/refresh`: Re-run zone discovery
//! - `/health`: Agent statistics

pub mod health;
pub mod metrics;
pub mod refresh;

// Re-export handlers
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use refresh::refresh_handler;
