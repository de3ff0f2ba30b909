//! `GET /api/status-badges` — the styling table for every status value.

use axum::Json;

use crate::status_style::{badge_table, BadgeTable};

pub async fn table() -> Json<BadgeTable> {
    Json(badge_table())
}
