//! Appointment scheduling views: filtering, today's schedule, status
//! changes and per-status counts.

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::{DatabaseError, DocumentStore, Stored};
use crate::format::percentage;
use crate::models::enums::AppointmentStatus;
use crate::models::filters::{matches_search, AppointmentFilter};
use crate::models::Appointment;

// ─── Types ────────────────────────────────────────────────────────────────────

pub type StoredAppointment = Stored<Appointment>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentStats {
    pub total: usize,
    pub scheduled: usize,
    pub confirmed: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub no_show: usize,
    /// Completed share of appointments that were not cancelled.
    pub completion_rate: u8,
}

// ─── Views ────────────────────────────────────────────────────────────────────

fn matches(appt: &Appointment, filter: &AppointmentFilter) -> bool {
    filter.status.map_or(true, |s| appt.status == s)
        && filter.date.map_or(true, |d| appt.date == d)
        && filter
            .doctor_id
            .as_deref()
            .map_or(true, |d| appt.doctor_id == d)
        && matches_search(
            filter.search.as_deref(),
            [
                Some(appt.patient_name.as_str()),
                Some(appt.doctor_name.as_str()),
                appt.department.as_deref(),
                appt.reason.as_deref(),
            ],
        )
}

/// Appointments matching `filter`, earliest first.
pub fn filter_appointments<'a>(
    appointments: &'a [StoredAppointment],
    filter: &AppointmentFilter,
) -> Vec<&'a StoredAppointment> {
    let mut out: Vec<_> = appointments.iter().filter(|a| matches(a, filter)).collect();
    out.sort_by_key(|a| a.starts_at());
    out
}

pub fn todays_schedule(appointments: &[StoredAppointment], today: NaiveDate) -> Vec<&StoredAppointment> {
    filter_appointments(
        appointments,
        &AppointmentFilter {
            date: Some(today),
            ..Default::default()
        },
    )
}

pub fn appointment_stats<'a>(appointments: impl IntoIterator<Item = &'a Appointment>) -> AppointmentStats {
    let mut stats = AppointmentStats::default();
    for appt in appointments {
        stats.total += 1;
        match appt.status {
            AppointmentStatus::Scheduled => stats.scheduled += 1,
            AppointmentStatus::Confirmed => stats.confirmed += 1,
            AppointmentStatus::InProgress => stats.in_progress += 1,
            AppointmentStatus::Completed => stats.completed += 1,
            AppointmentStatus::Cancelled => stats.cancelled += 1,
            AppointmentStatus::NoShow => stats.no_show += 1,
        }
    }
    stats.completion_rate = percentage(
        stats.completed as f64,
        (stats.total - stats.cancelled) as f64,
    );
    stats
}

// ─── Store operations ─────────────────────────────────────────────────────────

pub fn list_appointments(
    store: &DocumentStore,
    filter: &AppointmentFilter,
) -> Result<Vec<StoredAppointment>, DatabaseError> {
    let all = store.fetch_all::<Appointment>()?;
    Ok(filter_appointments(&all, filter).into_iter().cloned().collect())
}

pub fn update_appointment_status(
    store: &DocumentStore,
    id: &str,
    status: AppointmentStatus,
) -> Result<StoredAppointment, DatabaseError> {
    let mut appt = store.fetch::<Appointment>(id)?;
    let previous = appt.status;
    appt.status = status;
    let saved = store.replace(&appt)?;
    tracing::info!(id, from = %previous, to = %status, "Appointment status changed");
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{AppointmentType, Priority};
    use chrono::NaiveTime;

    fn appt(patient: &str, day: u32, hour: u32, status: AppointmentStatus) -> Appointment {
        Appointment {
            patient_id: format!("pat-{patient}"),
            patient_name: patient.to_string(),
            doctor_id: "doc-1".into(),
            doctor_name: "Dr. Nour Haddad".into(),
            date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            duration_minutes: 30,
            appointment_type: AppointmentType::Consultation,
            status,
            priority: Priority::Medium,
            department: Some("Cardiology".into()),
            reason: Some("Chest pain".into()),
            notes: None,
        }
    }

    fn sample() -> Vec<StoredAppointment> {
        vec![
            Stored::detached(appt("Omar", 3, 11, AppointmentStatus::Scheduled)),
            Stored::detached(appt("Lina", 3, 9, AppointmentStatus::Completed)),
            Stored::detached(appt("Yusuf", 4, 10, AppointmentStatus::Cancelled)),
            Stored::detached(appt("Huda", 3, 14, AppointmentStatus::NoShow)),
        ]
    }

    fn names(items: &[&StoredAppointment]) -> Vec<String> {
        items.iter().map(|a| a.patient_name.clone()).collect()
    }

    #[test]
    fn todays_schedule_sorted_by_time() {
        let all = sample();
        let today = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        assert_eq!(names(&todays_schedule(&all, today)), vec!["Lina", "Omar", "Huda"]);
    }

    #[test]
    fn filter_by_status_and_search() {
        let all = sample();
        let f = AppointmentFilter {
            status: Some(AppointmentStatus::Cancelled),
            ..Default::default()
        };
        assert_eq!(names(&filter_appointments(&all, &f)), vec!["Yusuf"]);

        let f = AppointmentFilter {
            search: Some("cardio".into()),
            ..Default::default()
        };
        assert_eq!(filter_appointments(&all, &f).len(), 4);

        let f = AppointmentFilter {
            search: Some("huda".into()),
            ..Default::default()
        };
        assert_eq!(names(&filter_appointments(&all, &f)), vec!["Huda"]);
    }

    #[test]
    fn stats_exclude_cancelled_from_completion() {
        let all = sample();
        let stats = appointment_stats(all.iter().map(|a| &a.record));
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.no_show, 1);
        assert_eq!(stats.completion_rate, 33);
    }

    #[test]
    fn empty_stats() {
        let stats = appointment_stats(std::iter::empty());
        assert_eq!(stats, AppointmentStats::default());
    }

    #[test]
    fn status_update_persists() {
        let store = DocumentStore::open_in_memory().unwrap();
        let saved = store
            .insert(&appt("Omar", 3, 11, AppointmentStatus::Scheduled))
            .unwrap();
        let updated = update_appointment_status(&store, &saved.id, AppointmentStatus::Confirmed).unwrap();
        assert_eq!(updated.status, AppointmentStatus::Confirmed);
        assert_eq!(updated.version, 2);

        let f = AppointmentFilter {
            status: Some(AppointmentStatus::Confirmed),
            ..Default::default()
        };
        assert_eq!(list_appointments(&store, &f).unwrap().len(), 1);
        assert!(update_appointment_status(&store, "missing", AppointmentStatus::Completed).is_err());
    }
}
