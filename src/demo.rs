//! Sample records for demo mode.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc, Weekday};

use crate::billing::{create_invoice, record_payment, NewInvoice, NewPayment};
use crate::db::{DatabaseError, DocumentStore};
use crate::models::enums::{
    AppointmentStatus, AppointmentType, ClaimStatus, EmploymentStatus, LabOrderStatus, PaymentMethod,
    PrescriptionStatus, Priority, StaffRole, StudyStatus,
};
use crate::models::*;
use crate::waiting_list::add_to_queue;

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

fn patient(first: &str, last: &str, phone: &str, allergies: &[&str]) -> Patient {
    Patient {
        first_name: first.into(),
        last_name: last.into(),
        date_of_birth: None,
        gender: None,
        email: None,
        phone: Some(phone.into()),
        address: None,
        blood_type: None,
        allergies: allergies.iter().map(|a| a.to_string()).collect(),
        medical_history: Vec::new(),
        emergency_contact: None,
        insurance: None,
    }
}

fn staff(first: &str, last: &str, role: StaffRole, dept: &str, days: &[Weekday]) -> Staff {
    Staff {
        first_name: first.into(),
        last_name: last.into(),
        email: format!("{}.{}@clinicdesk.local", first.to_lowercase(), last.to_lowercase()),
        phone: None,
        role,
        department: dept.into(),
        specialization: None,
        employment_status: EmploymentStatus::Active,
        hire_date: None,
        schedule: days
            .iter()
            .map(|day| Shift {
                day: *day,
                start: time(8, 0),
                end: time(16, 0),
            })
            .collect(),
    }
}

/// Populate an empty store with a small, internally consistent clinic.
pub fn seed_demo_data(store: &DocumentStore, today: NaiveDate, now: DateTime<Utc>) -> Result<(), DatabaseError> {
    let weekdays = [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri];

    let patients = [
        patient("Ali", "Ahmed", "+20 100 555 0101", &["penicillin"]),
        patient("Mariam", "Saeed", "+20 100 555 0102", &[]),
        patient("Youssef", "Hassan", "+20 100 555 0103", &[]),
        patient("Nadia", "Fares", "+20 100 555 0104", &["latex"]),
    ];
    let mut patient_ids = Vec::new();
    for p in &patients {
        patient_ids.push(store.insert(p)?.id);
    }

    let doctor = store.insert(&staff("Nour", "Haddad", StaffRole::Doctor, "General Medicine", &weekdays))?;
    let cardiologist = store.insert(&staff("Adel", "Barakat", StaffRole::Doctor, "Cardiology", &weekdays[..3]))?;
    store.insert(&staff("Salma", "Idris", StaffRole::Nurse, "Emergency", &weekdays))?;
    store.insert(&staff("Dina", "Farah", StaffRole::Pharmacist, "Pharmacy", &weekdays))?;

    let visits = [
        (0, &doctor, time(9, 0), AppointmentType::Consultation, AppointmentStatus::Completed),
        (1, &doctor, time(10, 30), AppointmentType::FollowUp, AppointmentStatus::Confirmed),
        (2, &cardiologist, time(11, 0), AppointmentType::Procedure, AppointmentStatus::Scheduled),
        (3, &doctor, time(14, 0), AppointmentType::RoutineCheckup, AppointmentStatus::Scheduled),
    ];
    for (idx, doc, at, kind, status) in visits {
        store.insert(&Appointment {
            patient_id: patient_ids[idx].clone(),
            patient_name: patients[idx].full_name(),
            doctor_id: doc.id.clone(),
            doctor_name: format!("Dr. {}", doc.full_name()),
            date: today,
            time: at,
            duration_minutes: 30,
            appointment_type: kind,
            status,
            priority: Priority::Medium,
            department: Some(doc.department.clone()),
            reason: None,
            notes: None,
        })?;
    }

    let queue = [
        (1, Priority::Medium, "Follow-up on blood pressure"),
        (2, Priority::Urgent, "Chest tightness"),
        (3, Priority::Low, "Prescription renewal"),
    ];
    for (i, (idx, priority, reason)) in queue.into_iter().enumerate() {
        add_to_queue(
            store,
            NewWaitingEntry {
                patient_id: patient_ids[idx].clone(),
                patient_name: patients[idx].full_name(),
                doctor_id: Some(doctor.id.clone()),
                doctor_name: Some(format!("Dr. {}", doctor.full_name())),
                department: Some(doctor.department.clone()),
                reason: Some(reason.into()),
                phone: patients[idx].phone.clone(),
                priority,
                estimated_wait_time: 15 * (i as u32 + 1),
                notes: None,
            },
            now - Duration::minutes(40 - 10 * i as i64),
        )?;
    }

    let supplies = [
        ("Nitrile gloves", "Supplies", 400, "box", 100, 1000, 6.5, Some(180)),
        ("Saline 0.9% 500ml", "Fluids", 12, "bag", 30, 200, 1.8, Some(20)),
        ("Syringe 5ml", "Supplies", 0, "piece", 200, 2000, 0.12, None),
    ];
    for (name, category, quantity, unit, reorder_level, max_stock, unit_price, expires_in) in supplies {
        store.insert(&InventoryItem {
            name: name.into(),
            category: category.into(),
            sku: None,
            quantity,
            unit: unit.into(),
            reorder_level,
            max_stock,
            unit_price,
            supplier: None,
            expiry_date: expires_in.map(|d| today + Duration::days(d)),
            location: Some("Store room A".into()),
        })?;
    }

    let amoxicillin = store.insert(&Medication {
        name: "Amoxicillin".into(),
        generic_name: Some("amoxicillin".into()),
        dosage_form: "capsule".into(),
        strength: "500mg".into(),
        manufacturer: None,
        stock_quantity: 240,
        reorder_level: 50,
        unit_price: 0.35,
        expiry_date: Some(today + Duration::days(300)),
        requires_prescription: true,
    })?;
    store.insert(&Medication {
        name: "Paracetamol".into(),
        generic_name: None,
        dosage_form: "tablet".into(),
        strength: "500mg".into(),
        manufacturer: None,
        stock_quantity: 30,
        reorder_level: 100,
        unit_price: 0.05,
        expiry_date: Some(today + Duration::days(25)),
        requires_prescription: false,
    })?;

    store.insert(&Prescription {
        patient_id: patient_ids[1].clone(),
        patient_name: patients[1].full_name(),
        doctor_id: doctor.id.clone(),
        doctor_name: format!("Dr. {}", doctor.full_name()),
        medications: vec![PrescribedMedication {
            medication_id: amoxicillin.id.clone(),
            name: amoxicillin.name.clone(),
            dosage: "500mg".into(),
            frequency: "3x daily".into(),
            duration: "7 days".into(),
            quantity: 21,
        }],
        status: PrescriptionStatus::Pending,
        filled: false,
        dispensed: false,
        issued_date: today,
        notes: None,
    })?;

    store.insert(&LabOrder {
        patient_id: patient_ids[2].clone(),
        patient_name: patients[2].full_name(),
        test_name: "Troponin I".into(),
        ordered_by: cardiologist.full_name(),
        status: LabOrderStatus::Ordered,
        ordered_at: now,
        result: None,
    })?;
    store.insert(&RadiologyStudy {
        patient_id: patient_ids[2].clone(),
        patient_name: patients[2].full_name(),
        modality: "X-ray".into(),
        body_part: "Chest".into(),
        status: StudyStatus::Scheduled,
        scheduled_at: now + Duration::hours(2),
        report: None,
    })?;

    let invoice = create_invoice(
        store,
        NewInvoice {
            patient_id: patient_ids[0].clone(),
            patient_name: patients[0].full_name(),
            issue_date: Some(today),
            due_date: None,
            items: vec![
                LineItem {
                    description: "General consultation".into(),
                    quantity: 1,
                    unit_price: 60.0,
                },
                LineItem {
                    description: "ECG".into(),
                    quantity: 1,
                    unit_price: 45.0,
                },
            ],
            tax_rate: 0.14,
            discount: 5.0,
        },
        today,
    )?;
    record_payment(
        store,
        &invoice.id,
        NewPayment {
            amount: 50.0,
            method: PaymentMethod::Card,
            reference: None,
        },
        now,
    )?;
    store.insert(&InsuranceClaim {
        invoice_id: invoice.id.clone(),
        patient_id: patient_ids[0].clone(),
        provider: "Nile Mutual".into(),
        policy_number: "NM-88213".into(),
        claim_amount: 64.0,
        approved_amount: None,
        status: ClaimStatus::Draft,
        submitted_at: None,
    })?;

    tracing::info!("Demo data seeded");
    Ok(())
}
