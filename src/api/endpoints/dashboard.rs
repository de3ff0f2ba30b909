//! `GET /api/dashboard`

use axum::extract::State;
use axum::Json;
use chrono::Utc;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::dashboard::{build_dashboard, Dashboard};

pub async fn overview(State(ctx): State<ApiContext>) -> Result<Json<Dashboard>, ApiError> {
    let now = Utc::now();
    Ok(Json(build_dashboard(ctx.store(), now.date_naive(), now)?))
}
