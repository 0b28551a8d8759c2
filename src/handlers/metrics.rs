//! Per-zone metrics endpoint handler for Prometheus scraping.
//!
//! This module provides the `/v1/{zone}/metrics` endpoint handler that returns
//! one zone's snapshot in Prometheus text format.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use prometheus::{Counter, Encoder, Gauge, Registry, TextEncoder};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, instrument};
use zone_metrics_agent::{MetricKind, MetricSnapshot};

use crate::state::{AgentStats, SharedState};

/// Buffer capacity for metrics encoding.
const BUFFER_CAP: usize = 8 * 1024;

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    UnknownZone(String),
    Collection(String),
    EncodingFailed,
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> axum::response::Response {
        match self {
            MetricsError::UnknownZone(zone) => {
                (StatusCode::NOT_FOUND, format!("container {} not found", zone)).into_response()
            }
            MetricsError::Collection(reason) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to collect metrics: {}", reason),
            )
                .into_response(),
            MetricsError::EncodingFailed => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
            }
        }
    }
}

/// Handler for the /v1/{zone}/metrics endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler(
    State(state): State<SharedState>,
    Path(zone): Path<String>,
) -> Result<String, MetricsError> {
    let start = Instant::now();
    debug!("Processing metrics request for zone {}", zone);
    AgentStats::inc(&state.stats.scrapes);

    let snapshot = match state.cache.get_fresh(&zone) {
        Some(snapshot) => {
            AgentStats::inc(&state.stats.cache_hits);
            snapshot
        }
        None => collect_zone(&state, &zone).await?,
    };

    let body = encode_snapshot(&snapshot).map_err(|e| {
        error!("Failed to encode metrics for zone {}: {}", zone, e);
        MetricsError::EncodingFailed
    })?;

    debug!(
        "Metrics request completed: zone {}, {} samples, {:.3}ms",
        zone,
        snapshot.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(body)
}

/// Collects on the blocking pool and stores the result in the cache.
async fn collect_zone(
    state: &SharedState,
    zone: &str,
) -> Result<Arc<MetricSnapshot>, MetricsError> {
    let engine = state.engine.clone();
    let identity = zone.to_string();

    let result = tokio::task::spawn_blocking(move || engine.collect(&identity))
        .await
        .map_err(|e| MetricsError::Collection(e.to_string()))?;

    match result {
        Ok(Some(snapshot)) => {
            if !snapshot.failed_groups.is_empty() {
                AgentStats::inc(&state.stats.partial_snapshots);
            }
            Ok(state.cache.insert(zone, snapshot))
        }
        Ok(None) => {
            AgentStats::inc(&state.stats.unknown_zones);
            state.cache.remove(zone);
            Err(MetricsError::UnknownZone(zone.to_string()))
        }
        Err(e) => {
            AgentStats::inc(&state.stats.enumeration_failures);
            error!("Zone discovery failed while resolving {}: {}", zone, e);
            Err(MetricsError::Collection(e.to_string()))
        }
    }
}

/// Encodes a snapshot in the Prometheus text exposition format.
pub fn encode_snapshot(snapshot: &MetricSnapshot) -> Result<String, prometheus::Error> {
    let registry = Registry::new();

    for sample in &snapshot.samples {
        let value = sample.value.as_f64();
        match sample.kind {
            MetricKind::Counter => {
                let counter = Counter::new(sample.name.as_str(), sample.help.as_str())?;
                counter.inc_by(value);
                registry.register(Box::new(counter))?;
            }
            MetricKind::Gauge => {
                let gauge = Gauge::new(sample.name.as_str(), sample.help.as_str())?;
                gauge.set(value);
                registry.register(Box::new(gauge))?;
            }
        }
    }

    let mut buffer = Vec::with_capacity(BUFFER_CAP);
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
