use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form is also the serde wire form.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Collection {
    Patients => "patients",
    Appointments => "appointments",
    WaitingList => "waitingList",
    Staff => "staff",
    Inventory => "inventory",
    Medications => "medications",
    Prescriptions => "prescriptions",
    LabOrders => "labOrders",
    RadiologyStudies => "radiologyStudies",
    Invoices => "invoices",
    Payments => "payments",
    InsuranceClaims => "insuranceClaims",
});

str_enum!(Priority {
    Urgent => "urgent",
    High => "high",
    Medium => "medium",
    Low => "low",
});

impl Priority {
    /// Sort rank: higher is more pressing.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Urgent => 4,
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

str_enum!(AppointmentStatus {
    Scheduled => "scheduled",
    Confirmed => "confirmed",
    InProgress => "in-progress",
    Completed => "completed",
    Cancelled => "cancelled",
    NoShow => "no-show",
});

str_enum!(AppointmentType {
    Consultation => "consultation",
    FollowUp => "follow-up",
    Emergency => "emergency",
    RoutineCheckup => "routine-checkup",
    Procedure => "procedure",
});

str_enum!(WaitingStatus {
    Waiting => "waiting",
    Called => "called",
    NoResponse => "no-response",
    Seen => "seen",
});

str_enum!(PrescriptionStatus {
    Pending => "pending",
    Filled => "filled",
    Dispensed => "dispensed",
    Cancelled => "cancelled",
});

str_enum!(LabOrderStatus {
    Ordered => "ordered",
    Collected => "collected",
    InProgress => "in-progress",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(StudyStatus {
    Scheduled => "scheduled",
    InProgress => "in-progress",
    Completed => "completed",
    Reported => "reported",
    Cancelled => "cancelled",
});

str_enum!(InvoiceStatus {
    Draft => "draft",
    Pending => "pending",
    PartiallyPaid => "partially-paid",
    Paid => "paid",
    Overdue => "overdue",
    Cancelled => "cancelled",
});

str_enum!(PaymentMethod {
    Cash => "cash",
    Card => "card",
    Insurance => "insurance",
    BankTransfer => "bank-transfer",
});

str_enum!(ClaimStatus {
    Draft => "draft",
    Submitted => "submitted",
    UnderReview => "under-review",
    Approved => "approved",
    Rejected => "rejected",
    Paid => "paid",
});

str_enum!(StaffRole {
    Doctor => "doctor",
    Nurse => "nurse",
    Pharmacist => "pharmacist",
    Receptionist => "receptionist",
    Technician => "technician",
    Administrator => "administrator",
});

str_enum!(EmploymentStatus {
    Active => "active",
    OnLeave => "on-leave",
    Suspended => "suspended",
    Terminated => "terminated",
});
