//! API endpoint handlers.
//!
//! Each module covers one area of the front desk. Handlers stay thin: they
//! parse the request, call the domain module, and shape the response.

pub mod appointments;
pub mod badges;
pub mod billing;
pub mod collections;
pub mod dashboard;
pub mod health;
pub mod listeners;
pub mod pharmacy;
pub mod staff;
pub mod waiting_list;
