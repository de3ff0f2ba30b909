//! Waiting list endpoints.
//!
//! Every write answers with the updated entry or the refreshed queue so the
//! desk view can redraw without a second round trip.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{parse_optional, ApiContext, ApiJson, ApiQuery};
use crate::config::MAX_MINUTES_PER_PATIENT;
use crate::models::enums::WaitingStatus;
use crate::models::filters::WaitingListFilter;
use crate::models::NewWaitingEntry;
use crate::status_style::{Badge, StatusBadge};
use crate::waiting_list::{self, MoveDirection, QueueStats, SortMode, WaitingEntry, WaitingList};

/// A queue entry with its badges resolved.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntryView {
    #[serde(flatten)]
    pub entry: WaitingEntry,
    pub status_badge: Badge,
    pub priority_badge: Badge,
}

impl From<&WaitingEntry> for QueueEntryView {
    fn from(entry: &WaitingEntry) -> Self {
        Self {
            status_badge: entry.status.badge(),
            priority_badge: entry.priority.badge(),
            entry: entry.clone(),
        }
    }
}

fn render(queue: &WaitingList, filter: &WaitingListFilter, sort: SortMode) -> Vec<QueueEntryView> {
    queue.view(filter, sort).into_iter().map(QueueEntryView::from).collect()
}

fn build_filter(status: Option<&str>, search: Option<String>) -> Result<WaitingListFilter, ApiError> {
    Ok(WaitingListFilter {
        status: parse_optional(status)?,
        search,
    })
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Serialize)]
pub struct QueueResponse {
    pub entries: Vec<QueueEntryView>,
    pub stats: QueueStats,
}

/// `GET /api/waiting-list?status=&search=&sort=`
pub async fn list(
    State(ctx): State<ApiContext>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<QueueResponse>, ApiError> {
    let filter = build_filter(params.status.as_deref(), params.search)?;
    let sort = parse_optional::<SortMode>(params.sort.as_deref())?.unwrap_or_default();
    let queue = waiting_list::load_queue(ctx.store())?;
    Ok(Json(QueueResponse {
        entries: render(&queue, &filter, sort),
        stats: queue.stats(Utc::now()),
    }))
}

/// `GET /api/waiting-list/stats`
pub async fn stats(State(ctx): State<ApiContext>) -> Result<Json<QueueStats>, ApiError> {
    let queue = waiting_list::load_queue(ctx.store())?;
    Ok(Json(queue.stats(Utc::now())))
}

// ─── Membership ──────────────────────────────────────────────

/// `POST /api/waiting-list`
pub async fn add(
    State(ctx): State<ApiContext>,
    ApiJson(entry): ApiJson<NewWaitingEntry>,
) -> Result<(StatusCode, Json<QueueEntryView>), ApiError> {
    if entry.patient_id.trim().is_empty() || entry.patient_name.trim().is_empty() {
        return Err(ApiError::BadRequest("patientId and patientName are required".into()));
    }
    let stored = waiting_list::add_to_queue(ctx.store(), entry, Utc::now())?;
    Ok((StatusCode::CREATED, Json(QueueEntryView::from(&stored))))
}

/// `DELETE /api/waiting-list/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    waiting_list::remove_from_queue(ctx.store(), &id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Ordering ────────────────────────────────────────────────

/// The move is resolved against the view the client is looking at, so the
/// request carries that view's filter.
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub direction: MoveDirection,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Serialize)]
pub struct MoveResponse {
    pub moved: bool,
    pub entries: Vec<QueueEntryView>,
}

/// `POST /api/waiting-list/:id/move`
pub async fn move_entry(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<MoveRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let filter = build_filter(request.status.as_deref(), request.search)?;
    let (moved, queue) = waiting_list::move_entry(ctx.store(), &id, request.direction, &filter)?;
    Ok(Json(MoveResponse {
        moved,
        entries: render(&queue, &filter, SortMode::Position),
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub minutes_per_patient: Option<u32>,
}

/// `POST /api/waiting-list/estimate` — recompute wait estimates for
/// everyone still waiting.
pub async fn estimate(
    State(ctx): State<ApiContext>,
    ApiJson(request): ApiJson<EstimateRequest>,
) -> Result<Json<QueueResponse>, ApiError> {
    let minutes = request
        .minutes_per_patient
        .unwrap_or(ctx.core.config.minutes_per_patient);
    if !(1..=MAX_MINUTES_PER_PATIENT).contains(&minutes) {
        return Err(ApiError::BadRequest(format!(
            "minutesPerPatient must be between 1 and {MAX_MINUTES_PER_PATIENT}"
        )));
    }
    let queue = waiting_list::refresh_wait_estimates(ctx.store(), minutes)?;
    Ok(Json(QueueResponse {
        entries: render(&queue, &WaitingListFilter::default(), SortMode::Position),
        stats: queue.stats(Utc::now()),
    }))
}

// ─── Status ──────────────────────────────────────────────────

fn transition(ctx: &ApiContext, id: &str, status: WaitingStatus) -> Result<Json<QueueEntryView>, ApiError> {
    let entry = waiting_list::update_status(ctx.store(), id, status, Utc::now())?;
    tracing::info!(id, status = %status, "Waiting list status changed");
    Ok(Json(QueueEntryView::from(&entry)))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// `PUT /api/waiting-list/:id/status`
pub async fn set_status(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> Result<Json<QueueEntryView>, ApiError> {
    let status: WaitingStatus = request.status.parse()?;
    transition(&ctx, &id, status)
}

/// `POST /api/waiting-list/:id/call`
pub async fn call(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<QueueEntryView>, ApiError> {
    transition(&ctx, &id, WaitingStatus::Called)
}

/// `POST /api/waiting-list/:id/no-response`
pub async fn no_response(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<QueueEntryView>, ApiError> {
    transition(&ctx, &id, WaitingStatus::NoResponse)
}

/// `POST /api/waiting-list/:id/recall` — call again after no response.
pub async fn recall(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<QueueEntryView>, ApiError> {
    transition(&ctx, &id, WaitingStatus::Called)
}

/// `POST /api/waiting-list/:id/seen`
pub async fn seen(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<QueueEntryView>, ApiError> {
    transition(&ctx, &id, WaitingStatus::Seen)
}

/// `POST /api/waiting-list/:id/remind`
pub async fn remind(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<QueueEntryView>, ApiError> {
    let entry = waiting_list::send_reminder(ctx.store(), &id)?;
    tracing::info!(id, reminders = entry.reminders_sent, "Reminder sent");
    Ok(Json(QueueEntryView::from(&entry)))
}
