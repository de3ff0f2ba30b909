use chrono::NaiveDate;
use serde::Deserialize;

use super::enums::{AppointmentStatus, EmploymentStatus, StaffRole, WaitingStatus};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct AppointmentFilter {
    pub search: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
    pub doctor_id: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct WaitingListFilter {
    /// `None` shows every status.
    pub status: Option<WaitingStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct StaffFilter {
    pub search: Option<String>,
    pub role: Option<StaffRole>,
    pub department: Option<String>,
    pub status: Option<EmploymentStatus>,
}

/// Case-insensitive substring match of `term` against any of `fields`.
///
/// A blank term matches everything.
pub fn matches_search<'a>(term: Option<&str>, fields: impl IntoIterator<Item = Option<&'a str>>) -> bool {
    let term = match term.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_lowercase(),
        _ => return true,
    };
    fields
        .into_iter()
        .flatten()
        .any(|f| f.to_lowercase().contains(&term))
}
