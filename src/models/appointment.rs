use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::enums::{AppointmentStatus, AppointmentType, Priority};
use crate::db::Entity;
use crate::models::enums::Collection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub patient_id: String,
    pub patient_name: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_duration() -> u32 {
    30
}

impl Appointment {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

impl Entity for Appointment {
    const COLLECTION: Collection = Collection::Appointments;
}
