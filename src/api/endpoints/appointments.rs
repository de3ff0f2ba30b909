//! Appointment endpoints.
//!
//! - `GET /api/appointments` — filtered schedule plus summary figures
//! - `PUT /api/appointments/:id/status` — move an appointment along

use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{parse_optional, ApiContext, ApiJson, ApiQuery};
use crate::appointment::{self, AppointmentStats, StoredAppointment};
use crate::models::enums::AppointmentStatus;
use crate::models::filters::AppointmentFilter;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub date: Option<String>,
    pub doctor_id: Option<String>,
}

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<StoredAppointment>,
    pub stats: AppointmentStats,
}

/// `GET /api/appointments?search=&status=&date=&doctorId=`
pub async fn list(
    State(ctx): State<ApiContext>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<AppointmentsResponse>, ApiError> {
    let date = match params.date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| ApiError::BadRequest(format!("Invalid date: {raw}")))?,
        ),
    };
    let filter = AppointmentFilter {
        search: params.search,
        status: parse_optional(params.status.as_deref())?,
        date,
        doctor_id: params.doctor_id.filter(|d| !d.trim().is_empty()),
    };

    let appointments = appointment::list_appointments(ctx.store(), &filter)?;
    let stats = appointment::appointment_stats(appointments.iter().map(|a| &a.record));
    Ok(Json(AppointmentsResponse { appointments, stats }))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// `PUT /api/appointments/:id/status`
pub async fn set_status(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> Result<Json<StoredAppointment>, ApiError> {
    let status: AppointmentStatus = request.status.parse()?;
    let saved = appointment::update_appointment_status(ctx.store(), &id, status)?;
    Ok(Json(saved))
}
