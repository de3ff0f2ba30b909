use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{LabOrderStatus, StudyStatus};
use crate::db::Entity;
use crate::models::enums::Collection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabOrder {
    pub patient_id: String,
    pub patient_name: String,
    pub test_name: String,
    pub ordered_by: String,
    pub status: LabOrderStatus,
    pub ordered_at: DateTime<Utc>,
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadiologyStudy {
    pub patient_id: String,
    pub patient_name: String,
    pub modality: String,
    pub body_part: String,
    pub status: StudyStatus,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub report: Option<String>,
}

impl Entity for LabOrder {
    const COLLECTION: Collection = Collection::LabOrders;
}

impl Entity for RadiologyStudy {
    const COLLECTION: Collection = Collection::RadiologyStudies;
}
