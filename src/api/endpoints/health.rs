//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub demo: bool,
    pub uptime_secs: u64,
    pub requests_served: u64,
    pub active_listeners: usize,
}

/// `GET /api/health` — liveness and a few runtime counters.
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        demo: ctx.core.config.demo,
        uptime_secs: ctx.core.uptime_secs(),
        requests_served: ctx.core.requests_served(),
        active_listeners: ctx.store().active_listeners(),
    }))
}
