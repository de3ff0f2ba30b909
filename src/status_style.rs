//! Badge styling for every status value, from one lookup per enum.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::enums::{
    AppointmentStatus, ClaimStatus, EmploymentStatus, InvoiceStatus, LabOrderStatus,
    PrescriptionStatus, Priority, StudyStatus, WaitingStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Neutral,
    Info,
    Success,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: &'static str,
    pub tone: Tone,
    pub icon: &'static str,
}

pub trait StatusBadge {
    /// Table key, e.g. "waitingStatus".
    const KIND: &'static str;

    fn badge(&self) -> Badge;
}

macro_rules! badges {
    ($name:ident, $kind:literal { $($variant:ident => ($label:literal, $tone:ident, $icon:literal)),+ $(,)? }) => {
        impl StatusBadge for $name {
            const KIND: &'static str = $kind;

            fn badge(&self) -> Badge {
                match self {
                    $($name::$variant => Badge { label: $label, tone: Tone::$tone, icon: $icon }),+
                }
            }
        }
    };
}

badges!(WaitingStatus, "waitingStatus" {
    Waiting => ("Waiting", Info, "clock"),
    Called => ("Called", Warning, "megaphone"),
    NoResponse => ("No response", Danger, "phone-missed"),
    Seen => ("Seen", Success, "check"),
});

badges!(Priority, "priority" {
    Urgent => ("Urgent", Danger, "alert-triangle"),
    High => ("High", Warning, "arrow-up"),
    Medium => ("Medium", Info, "minus"),
    Low => ("Low", Neutral, "arrow-down"),
});

badges!(AppointmentStatus, "appointmentStatus" {
    Scheduled => ("Scheduled", Info, "calendar"),
    Confirmed => ("Confirmed", Success, "calendar-check"),
    InProgress => ("In progress", Warning, "activity"),
    Completed => ("Completed", Success, "check-circle"),
    Cancelled => ("Cancelled", Neutral, "x-circle"),
    NoShow => ("No-show", Danger, "user-x"),
});

badges!(PrescriptionStatus, "prescriptionStatus" {
    Pending => ("Pending", Warning, "clock"),
    Filled => ("Filled", Info, "package"),
    Dispensed => ("Dispensed", Success, "check"),
    Cancelled => ("Cancelled", Neutral, "x-circle"),
});

badges!(LabOrderStatus, "labOrderStatus" {
    Ordered => ("Ordered", Info, "clipboard"),
    Collected => ("Collected", Info, "droplet"),
    InProgress => ("In progress", Warning, "activity"),
    Completed => ("Completed", Success, "check-circle"),
    Cancelled => ("Cancelled", Neutral, "x-circle"),
});

badges!(StudyStatus, "studyStatus" {
    Scheduled => ("Scheduled", Info, "calendar"),
    InProgress => ("In progress", Warning, "activity"),
    Completed => ("Completed", Success, "image"),
    Reported => ("Reported", Success, "file-text"),
    Cancelled => ("Cancelled", Neutral, "x-circle"),
});

badges!(InvoiceStatus, "invoiceStatus" {
    Draft => ("Draft", Neutral, "edit"),
    Pending => ("Pending", Warning, "clock"),
    PartiallyPaid => ("Partially paid", Info, "pie-chart"),
    Paid => ("Paid", Success, "check-circle"),
    Overdue => ("Overdue", Danger, "alert-circle"),
    Cancelled => ("Cancelled", Neutral, "x-circle"),
});

badges!(ClaimStatus, "claimStatus" {
    Draft => ("Draft", Neutral, "edit"),
    Submitted => ("Submitted", Info, "send"),
    UnderReview => ("Under review", Warning, "search"),
    Approved => ("Approved", Success, "check-circle"),
    Rejected => ("Rejected", Danger, "x-octagon"),
    Paid => ("Paid", Success, "dollar-sign"),
});

badges!(EmploymentStatus, "employmentStatus" {
    Active => ("Active", Success, "user-check"),
    OnLeave => ("On leave", Warning, "sun"),
    Suspended => ("Suspended", Danger, "pause-circle"),
    Terminated => ("Terminated", Neutral, "user-minus"),
});

pub type BadgeTable = BTreeMap<&'static str, BTreeMap<&'static str, Badge>>;

fn add_kind<E: StatusBadge + Copy>(table: &mut BadgeTable, values: &[E], key: impl Fn(&E) -> &'static str) {
    let entries = values.iter().map(|v| (key(v), v.badge())).collect();
    table.insert(E::KIND, entries);
}

/// Every badge, keyed by status kind then wire value.
pub fn badge_table() -> BadgeTable {
    let mut table = BadgeTable::new();
    add_kind(&mut table, WaitingStatus::ALL, |v| v.as_str());
    add_kind(&mut table, Priority::ALL, |v| v.as_str());
    add_kind(&mut table, AppointmentStatus::ALL, |v| v.as_str());
    add_kind(&mut table, PrescriptionStatus::ALL, |v| v.as_str());
    add_kind(&mut table, LabOrderStatus::ALL, |v| v.as_str());
    add_kind(&mut table, StudyStatus::ALL, |v| v.as_str());
    add_kind(&mut table, InvoiceStatus::ALL, |v| v.as_str());
    add_kind(&mut table, ClaimStatus::ALL, |v| v.as_str());
    add_kind(&mut table, EmploymentStatus::ALL, |v| v.as_str());
    table
}
