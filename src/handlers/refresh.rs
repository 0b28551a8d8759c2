//! Zone list refresh endpoint handler.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use tracing::{error, info, instrument};

use crate::state::{AgentStats, SharedState};

/// Handler for POST /v1/refresh: re-runs zone discovery and drops cached snapshots.
#[instrument(skip(state))]
pub async fn refresh_handler(State(state): State<SharedState>) -> impl IntoResponse {
    AgentStats::inc(&state.stats.refreshes);
    let engine = state.engine.clone();

    match tokio::task::spawn_blocking(move || engine.refresh()).await {
        Ok(Ok(count)) => {
            state.cache.clear();
            info!("Refresh complete: {} zones", count);
            (StatusCode::OK, format!("{} zones\n", count))
        }
        Ok(Err(e)) => {
            AgentStats::inc(&state.stats.enumeration_failures);
            error!("Zone refresh failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{}\n", e))
        }
        Err(e) => {
            error!("Zone refresh task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{}\n", e))
        }
    }
}
