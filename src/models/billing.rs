use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{ClaimStatus, InvoiceStatus, PaymentMethod};
use crate::db::Entity;
use crate::models::enums::Collection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub invoice_number: String,
    pub patient_id: String,
    pub patient_name: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub items: Vec<LineItem>,
    /// Fraction, e.g. 0.05 for 5%.
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub subtotal: f64,
    #[serde(default)]
    pub tax: f64,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub amount_paid: f64,
    pub status: InvoiceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub invoice_id: String,
    pub amount: f64,
    pub method: PaymentMethod,
    pub paid_at: DateTime<Utc>,
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceClaim {
    pub invoice_id: String,
    pub patient_id: String,
    pub provider: String,
    pub policy_number: String,
    pub claim_amount: f64,
    #[serde(default)]
    pub approved_amount: Option<f64>,
    pub status: ClaimStatus,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Entity for Invoice {
    const COLLECTION: Collection = Collection::Invoices;
}

impl Entity for Payment {
    const COLLECTION: Collection = Collection::Payments;
}

impl Entity for InsuranceClaim {
    const COLLECTION: Collection = Collection::InsuranceClaims;
}
