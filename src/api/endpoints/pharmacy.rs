//! Pharmacy endpoints: stock alerts and dispensing.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiQuery};
use crate::db::Stored;
use crate::models::Prescription;
use crate::pharmacy::{self, PharmacyAlerts};

/// Expiry look-ahead when the client does not ask for one.
const DEFAULT_EXPIRY_WINDOW_DAYS: i64 = 30;
const MAX_EXPIRY_WINDOW_DAYS: i64 = 3650;

#[derive(Debug, Default, Deserialize)]
pub struct AlertParams {
    pub days: Option<i64>,
}

/// `GET /api/pharmacy/alerts?days=`
pub async fn alerts(
    State(ctx): State<ApiContext>,
    ApiQuery(params): ApiQuery<AlertParams>,
) -> Result<Json<PharmacyAlerts>, ApiError> {
    let days = params.days.unwrap_or(DEFAULT_EXPIRY_WINDOW_DAYS);
    if !(0..=MAX_EXPIRY_WINDOW_DAYS).contains(&days) {
        return Err(ApiError::BadRequest(format!(
            "days must be between 0 and {MAX_EXPIRY_WINDOW_DAYS}"
        )));
    }
    let today = Utc::now().date_naive();
    Ok(Json(pharmacy::pharmacy_alerts(ctx.store(), today, days)?))
}

/// `POST /api/prescriptions/:id/dispense`
pub async fn dispense(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Stored<Prescription>>, ApiError> {
    Ok(Json(pharmacy::dispense_prescription(ctx.store(), &id)?))
}
