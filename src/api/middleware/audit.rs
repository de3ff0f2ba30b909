//! Access logging middleware.
//!
//! Logs every API request with method, path, response status and latency.

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::ApiContext;

/// Log API access.
/// Accesses `ApiContext` from request extensions.
pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let ctx = req.extensions().get::<ApiContext>().cloned();
    let started = Instant::now();

    let response = next.run(req).await;

    if let Some(ctx) = ctx {
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        ctx.core
            .log_access(&method, &path, response.status().as_u16(), elapsed_ms);
    }

    response
}
