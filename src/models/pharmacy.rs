use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::PrescriptionStatus;
use crate::db::Entity;
use crate::models::enums::Collection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub quantity: u32,
    pub unit: String,
    pub reorder_level: u32,
    pub max_stock: u32,
    pub unit_price: f64,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub name: String,
    #[serde(default)]
    pub generic_name: Option<String>,
    pub dosage_form: String,
    pub strength: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    pub stock_quantity: u32,
    pub reorder_level: u32,
    pub unit_price: f64,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub requires_prescription: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub patient_id: String,
    pub patient_name: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub medications: Vec<PrescribedMedication>,
    pub status: PrescriptionStatus,
    #[serde(default)]
    pub filled: bool,
    #[serde(default)]
    pub dispensed: bool,
    pub issued_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescribedMedication {
    pub medication_id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub quantity: u32,
}

impl Entity for InventoryItem {
    const COLLECTION: Collection = Collection::Inventory;
}

impl Entity for Medication {
    const COLLECTION: Collection = Collection::Medications;
}

impl Entity for Prescription {
    const COLLECTION: Collection = Collection::Prescriptions;
}
