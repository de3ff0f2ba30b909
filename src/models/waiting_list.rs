use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{Priority, WaitingStatus};
use crate::db::Entity;
use crate::models::enums::Collection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingListItem {
    pub patient_id: String,
    pub patient_name: String,
    #[serde(default)]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// 1-based queue order.
    pub position: u32,
    #[serde(default)]
    pub priority: Priority,
    /// Minutes.
    #[serde(default)]
    pub estimated_wait_time: u32,
    pub status: WaitingStatus,
    #[serde(default)]
    pub reminders_sent: u32,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub called_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Fields supplied when a patient joins the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWaitingEntry {
    pub patient_id: String,
    pub patient_name: String,
    #[serde(default)]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub estimated_wait_time: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Entity for WaitingListItem {
    const COLLECTION: Collection = Collection::WaitingList;
}
