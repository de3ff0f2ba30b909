//! API middleware.
//!
//! Only access logging today; it wraps every route including the
//! WebSocket upgrade.

pub mod audit;
