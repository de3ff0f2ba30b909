//! Pharmacy stock monitoring and prescription dispensing.

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeDelta};
use serde::Serialize;
use serde_json::{json, Map};

use crate::db::{DatabaseError, DocumentStore, Stored, WriteOp};
use crate::format::percentage;
use crate::models::enums::{Collection, PrescriptionStatus};
use crate::models::{InventoryItem, Medication, Prescription};

pub fn is_low_stock(item: &InventoryItem) -> bool {
    item.quantity <= item.reorder_level
}

pub fn is_out_of_stock(item: &InventoryItem) -> bool {
    item.quantity == 0
}

/// Expires today or within the next `days` days. A window reaching past the
/// calendar's end covers every future date.
pub fn expires_within(expiry: Option<NaiveDate>, today: NaiveDate, days: i64) -> bool {
    let horizon = TimeDelta::try_days(days)
        .and_then(|window| today.checked_add_signed(window))
        .unwrap_or(NaiveDate::MAX);
    expiry.is_some_and(|d| d >= today && d <= horizon)
}

pub fn is_expired(expiry: Option<NaiveDate>, today: NaiveDate) -> bool {
    expiry.is_some_and(|d| d < today)
}

/// Fill level for progress bars, 0..=100.
pub fn stock_percentage(item: &InventoryItem) -> u8 {
    percentage(f64::from(item.quantity), f64::from(item.max_stock))
}

pub fn inventory_value<'a>(items: impl IntoIterator<Item = &'a InventoryItem>) -> f64 {
    items
        .into_iter()
        .map(|i| f64::from(i.quantity) * i.unit_price)
        .sum()
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyAlerts {
    pub low_stock: Vec<Stored<InventoryItem>>,
    pub out_of_stock: Vec<Stored<InventoryItem>>,
    pub expiring_soon: Vec<Stored<InventoryItem>>,
    pub expired: Vec<Stored<InventoryItem>>,
    pub low_stock_medications: Vec<Stored<Medication>>,
    pub expiring_medications: Vec<Stored<Medication>>,
    pub inventory_value: f64,
}

pub fn build_alerts(
    inventory: &[Stored<InventoryItem>],
    medications: &[Stored<Medication>],
    today: NaiveDate,
    days: i64,
) -> PharmacyAlerts {
    let pick = |f: &dyn Fn(&InventoryItem) -> bool| -> Vec<Stored<InventoryItem>> {
        inventory.iter().filter(|i| f(&i.record)).cloned().collect()
    };
    PharmacyAlerts {
        low_stock: pick(&is_low_stock),
        out_of_stock: pick(&is_out_of_stock),
        expiring_soon: pick(&|i: &InventoryItem| expires_within(i.expiry_date, today, days)),
        expired: pick(&|i: &InventoryItem| is_expired(i.expiry_date, today)),
        low_stock_medications: medications
            .iter()
            .filter(|m| m.stock_quantity <= m.reorder_level)
            .cloned()
            .collect(),
        expiring_medications: medications
            .iter()
            .filter(|m| expires_within(m.expiry_date, today, days))
            .cloned()
            .collect(),
        inventory_value: inventory_value(inventory.iter().map(|i| &i.record)),
    }
}

pub fn pharmacy_alerts(
    store: &DocumentStore,
    today: NaiveDate,
    days: i64,
) -> Result<PharmacyAlerts, DatabaseError> {
    let inventory = store.fetch_all::<InventoryItem>()?;
    let medications = store.fetch_all::<Medication>()?;
    Ok(build_alerts(&inventory, &medications, today, days))
}

/// Dispense a prescription: take every prescribed quantity out of stock and
/// mark the prescription filled and dispensed.
///
/// All writes go in one version-guarded batch. Insufficient stock for any
/// line, or a concurrent edit of any touched document, writes nothing.
pub fn dispense_prescription(
    store: &DocumentStore,
    prescription_id: &str,
) -> Result<Stored<Prescription>, DatabaseError> {
    let prescription = store.fetch::<Prescription>(prescription_id)?;
    match prescription.status {
        PrescriptionStatus::Dispensed => {
            return Err(DatabaseError::ConstraintViolation(format!(
                "prescription {prescription_id} is already dispensed"
            )))
        }
        PrescriptionStatus::Cancelled => {
            return Err(DatabaseError::ConstraintViolation(format!(
                "prescription {prescription_id} is cancelled"
            )))
        }
        PrescriptionStatus::Pending | PrescriptionStatus::Filled => {}
    }

    let mut needed: BTreeMap<&str, u32> = BTreeMap::new();
    for line in &prescription.medications {
        let total = needed.entry(line.medication_id.as_str()).or_default();
        *total = total.checked_add(line.quantity).ok_or_else(|| {
            DatabaseError::ConstraintViolation(format!(
                "prescribed quantity of {} is too large",
                line.medication_id
            ))
        })?;
    }

    let mut ops = Vec::with_capacity(needed.len() + 1);
    for (medication_id, quantity) in needed {
        let medication = store.fetch::<Medication>(medication_id)?;
        if medication.stock_quantity < quantity {
            tracing::warn!(
                prescription = prescription_id,
                medication = medication_id,
                have = medication.stock_quantity,
                need = quantity,
                "Dispense refused: insufficient stock"
            );
            return Err(DatabaseError::ConstraintViolation(format!(
                "insufficient stock for {}: {} on hand, {} needed",
                medication.name, medication.stock_quantity, quantity
            )));
        }
        ops.push(WriteOp::Update {
            collection: Collection::Medications,
            id: medication.id.clone(),
            patch: Map::from_iter([(
                "stockQuantity".to_string(),
                json!(medication.stock_quantity - quantity),
            )]),
            expected_version: Some(medication.version),
        });
    }

    ops.push(WriteOp::Update {
        collection: Collection::Prescriptions,
        id: prescription.id.clone(),
        patch: Map::from_iter([
            ("status".to_string(), json!(PrescriptionStatus::Dispensed)),
            ("filled".to_string(), json!(true)),
            ("dispensed".to_string(), json!(true)),
        ]),
        expected_version: Some(prescription.version),
    });

    store.commit_batch(ops)?;
    tracing::info!(prescription = prescription_id, "Prescription dispensed");
    store.fetch(prescription_id)
}
