use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use divbridge_core::cache::CacheStats;
use serde::Serialize;

use crate::metrics::MetricsSnapshot;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/metrics", get(get_metrics))
}

/// Response for GET /metrics
#[derive(Serialize, utoipa::ToSchema)]
pub struct MetricsResponse {
    pub counters: MetricsSnapshot,
    pub cache: CacheStats,
}

/// Request and build counters plus render cache statistics
#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Process counters", body = MetricsResponse)
    ),
    tag = "system"
)]
pub async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        counters: state.metrics.snapshot(),
        cache: state.renderer.cache().stats(),
    })
}
