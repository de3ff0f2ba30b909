//! Aggregate figures for the front-desk dashboard.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::appointment::{appointment_stats, AppointmentStats};
use crate::billing::{outstanding_balance, round_cents};
use crate::db::{DatabaseError, DocumentStore};
use crate::format::percentage;
use crate::models::enums::{
    Collection, EmploymentStatus, InvoiceStatus, LabOrderStatus, PrescriptionStatus, StudyStatus,
};
use crate::models::{
    Appointment, InventoryItem, Invoice, LabOrder, Payment, Prescription, RadiologyStudy, Staff,
};
use crate::pharmacy::{is_low_stock, is_out_of_stock};
use crate::waiting_list::{load_queue, QueueStats};

/// Fill levels for the dashboard progress bars, each 0..=100.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressBars {
    pub appointments_completed: u8,
    pub queue_seen: u8,
    pub stock_healthy: u8,
    pub invoices_paid: u8,
    pub staff_active: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub date: NaiveDate,
    pub patients: usize,
    pub appointments_today: AppointmentStats,
    pub queue: QueueStats,
    pub low_stock_items: usize,
    pub out_of_stock_items: usize,
    pub pending_prescriptions: usize,
    pub open_lab_orders: usize,
    pub open_radiology_studies: usize,
    pub revenue_collected: f64,
    pub outstanding_balance: f64,
    pub active_staff: usize,
    pub total_staff: usize,
    pub progress: ProgressBars,
}

pub fn build_dashboard(
    store: &DocumentStore,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<Dashboard, DatabaseError> {
    let appointments = store.fetch_all::<Appointment>()?;
    let todays = appointment_stats(
        appointments
            .iter()
            .filter(|a| a.date == today)
            .map(|a| &a.record),
    );

    let queue = load_queue(store)?.stats(now);

    let inventory = store.fetch_all::<InventoryItem>()?;
    let low_stock_items = inventory.iter().filter(|i| is_low_stock(i)).count();
    let out_of_stock_items = inventory.iter().filter(|i| is_out_of_stock(i)).count();

    let pending_prescriptions = store
        .fetch_all::<Prescription>()?
        .iter()
        .filter(|p| p.status == PrescriptionStatus::Pending)
        .count();
    let open_lab_orders = store
        .fetch_all::<LabOrder>()?
        .iter()
        .filter(|o| {
            matches!(
                o.status,
                LabOrderStatus::Ordered | LabOrderStatus::Collected | LabOrderStatus::InProgress
            )
        })
        .count();
    let open_radiology_studies = store
        .fetch_all::<RadiologyStudy>()?
        .iter()
        .filter(|s| matches!(s.status, StudyStatus::Scheduled | StudyStatus::InProgress))
        .count();

    let invoices = store.fetch_all::<Invoice>()?;
    let billable: Vec<&Invoice> = invoices
        .iter()
        .map(|i| &i.record)
        .filter(|i| !matches!(i.status, InvoiceStatus::Draft | InvoiceStatus::Cancelled))
        .collect();
    let paid_invoices = billable
        .iter()
        .filter(|i| i.status == InvoiceStatus::Paid)
        .count();
    let revenue_collected = round_cents(
        store
            .fetch_all::<Payment>()?
            .iter()
            .map(|p| p.amount)
            .sum(),
    );

    let staff = store.fetch_all::<Staff>()?;
    let active_staff = staff
        .iter()
        .filter(|s| s.employment_status == EmploymentStatus::Active)
        .count();

    let progress = ProgressBars {
        appointments_completed: todays.completion_rate,
        queue_seen: percentage(queue.seen as f64, queue.total as f64),
        stock_healthy: percentage(
            (inventory.len() - low_stock_items) as f64,
            inventory.len() as f64,
        ),
        invoices_paid: percentage(paid_invoices as f64, billable.len() as f64),
        staff_active: percentage(active_staff as f64, staff.len() as f64),
    };

    Ok(Dashboard {
        date: today,
        patients: store.count(Collection::Patients)?,
        appointments_today: todays,
        queue,
        low_stock_items,
        out_of_stock_items,
        pending_prescriptions,
        open_lab_orders,
        open_radiology_studies,
        revenue_collected,
        outstanding_balance: outstanding_balance(billable.iter().copied()),
        active_staff,
        total_staff: staff.len(),
        progress,
    })
}
