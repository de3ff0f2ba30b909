use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::enums::{EmploymentStatus, StaffRole};
use crate::db::Entity;
use crate::models::enums::Collection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: StaffRole,
    pub department: String,
    #[serde(default)]
    pub specialization: Option<String>,
    pub employment_status: EmploymentStatus,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
    #[serde(default)]
    pub schedule: Vec<Shift>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub day: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Entity for Staff {
    const COLLECTION: Collection = Collection::Staff;
}
