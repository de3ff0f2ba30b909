//! Shared types for the API layer.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts};

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::db::DocumentStore;
use crate::models::enums::Collection;

// ═══════════════════════════════════════════════════════════
// API context — shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }

    pub fn store(&self) -> &DocumentStore {
        self.core.store()
    }
}

// ═══════════════════════════════════════════════════════════
// Extractors — rejections answer with the uniform error body
// ═══════════════════════════════════════════════════════════

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

// ═══════════════════════════════════════════════════════════
// Parameter parsing
// ═══════════════════════════════════════════════════════════

/// Parse a collection name from a path segment. Unknown names are 404s.
pub fn parse_collection(name: &str) -> Result<Collection, ApiError> {
    Collection::from_str(name).map_err(|_| ApiError::NotFound(format!("Unknown collection: {name}")))
}

/// Parse an optional enum query value. Blank or `all` means no filter.
pub fn parse_optional<T>(raw: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: FromStr,
    T::Err: Into<ApiError>,
{
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(Into::into),
    }
}
