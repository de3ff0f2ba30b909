//! Snapshot listener administration.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenersResponse {
    pub active_listeners: usize,
}

#[derive(Serialize)]
pub struct UnsubscribedResponse {
    pub cancelled: usize,
}

/// `GET /api/listeners`
pub async fn count(State(ctx): State<ApiContext>) -> Json<ListenersResponse> {
    Json(ListenersResponse {
        active_listeners: ctx.store().active_listeners(),
    })
}

/// `POST /api/listeners/unsubscribe-all` — cancel every open snapshot
/// listener. Their sockets close once the cancellation is observed.
pub async fn unsubscribe_all(State(ctx): State<ApiContext>) -> Json<UnsubscribedResponse> {
    Json(UnsubscribedResponse {
        cancelled: ctx.store().unsubscribe_all(),
    })
}
