//! Health check endpoint handler.
//!
//! This module provides the `/health` endpoint handler that returns
//! agent statistics as a plain-text table.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::config::DEFAULT_CACHE_TTL;
use crate::state::{AgentStats, SharedState};

// Time conversion constants
const SECONDS_PER_HOUR: f64 = 3600.0;
const MINUTES_PER_HOUR: f64 = 60.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");

    let uptime_hours = state.start_time.elapsed().as_secs_f64() / SECONDS_PER_HOUR;
    let uptime_str = if uptime_hours < 1.0 {
        format!("{:.1} minutes", uptime_hours * MINUTES_PER_HOUR)
    } else if uptime_hours < HOURS_PER_DAY {
        format!("{:.1} hours", uptime_hours)
    } else {
        format!("{:.1} days", uptime_hours / HOURS_PER_DAY)
    };

    let stats = &state.stats;
    let rows = [
        ("zones_known", state.engine.zone_count() as u64),
        ("cached_snapshots", state.cache.len() as u64),
        ("scrapes", AgentStats::get(&stats.scrapes)),
        ("cache_hits", AgentStats::get(&stats.cache_hits)),
        ("unknown_zones", AgentStats::get(&stats.unknown_zones)),
        ("partial_snapshots", AgentStats::get(&stats.partial_snapshots)),
        ("refreshes", AgentStats::get(&stats.refreshes)),
        ("enumeration_failures", AgentStats::get(&stats.enumeration_failures)),
    ];

    let mut out = String::new();
    writeln!(out, "OK").ok();
    writeln!(out).ok();
    writeln!(out, "Uptime: {}", uptime_str).ok();
    writeln!(
        out,
        "Cache TTL: {} seconds",
        state.config.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL)
    )
    .ok();
    writeln!(out).ok();
    writeln!(out, "{:25} | {:>12}", "Statistic", "Value").ok();
    writeln!(out, "{}", "-".repeat(40)).ok();
    for (name, value) in rows {
        writeln!(out, "{:25} | {:>12}", name, value).ok();
    }

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=utf-8")],
        out,
    )
}
