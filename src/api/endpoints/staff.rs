//! Staff directory endpoints.

use axum::extract::State;
use axum::Json;
use chrono::{Datelike, Utc, Weekday};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{parse_optional, ApiContext, ApiQuery};
use crate::models::filters::StaffFilter;
use crate::models::Staff;
use crate::staff::{self, StaffDirectory, StoredStaff};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub status: Option<String>,
}

/// `GET /api/staff?role=&department=&status=&search=`
pub async fn list(
    State(ctx): State<ApiContext>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<StaffDirectory>, ApiError> {
    let filter = StaffFilter {
        search: params.search,
        role: parse_optional(params.role.as_deref())?,
        department: params
            .department
            .filter(|d| !d.trim().is_empty() && d != "all"),
        status: parse_optional(params.status.as_deref())?,
    };
    Ok(Json(staff::list_staff(ctx.store(), &filter)?))
}

#[derive(Debug, Default, Deserialize)]
pub struct OnDutyParams {
    pub day: Option<String>,
}

/// `GET /api/staff/on-duty?day=` — active staff with a shift that day,
/// today when no day is given.
pub async fn on_duty(
    State(ctx): State<ApiContext>,
    ApiQuery(params): ApiQuery<OnDutyParams>,
) -> Result<Json<Vec<StoredStaff>>, ApiError> {
    let day = match params.day.as_deref() {
        Some(raw) => raw
            .parse::<Weekday>()
            .map_err(|_| ApiError::BadRequest(format!("Invalid day: {raw}")))?,
        None => Utc::now().weekday(),
    };
    let all = ctx.store().fetch_all::<Staff>()?;
    let on_shift = staff::scheduled_on(&all, day).into_iter().cloned().collect();
    Ok(Json(on_shift))
}
