//! HTTP API.
//!
//! Exposes the front-desk modules and the raw document store as JSON
//! endpoints, plus WebSocket snapshot listeners. Routes are nested under
//! `/api/`; listeners live under `/ws/`.
//!
//! The router is composable — `api_router()` returns a `Router` that can
//! be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;
pub mod websocket;

pub use router::api_router;
pub use server::{start_api_server_on, ApiServer, ApiSession};
pub use types::ApiContext;
