//! Appointment Lifecycle Engine — creation rules, status transitions, and
//! the accept race.
//!
//! Lifecycle: `Pending → Confirmed → In Progress → Completed`. The only
//! exit from `Pending` is acceptance, which is committed as a single
//! conditional UPDATE so that of N concurrent accepting doctors exactly
//! one wins. All other mutations are guarded by ownership checks —
//! only the assigned doctor can advance a record, so read-check-write
//! is safe there.

use chrono::{NaiveTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::{
    accept_pending, count_for_patient_on_date, get_appointment, get_user, insert_appointment,
    set_prescription, update_status,
};
use crate::db::DatabaseError;
use crate::models::{Appointment, AppointmentStatus, Prescription, Role};

/// Maximum appointments one patient may hold on a single calendar day.
pub const DAILY_LIMIT: i64 = 2;

/// Business hours: appointments start between 09:00 and 16:59.
pub const OPENING_HOUR: u32 = 9;
pub const CLOSING_HOUR: u32 = 17;

pub const CONCERN_MIN_LEN: usize = 10;
pub const CONCERN_MAX_LEN: usize = 200;

const PRESCRIPTION_FIELD_MIN_LEN: usize = 2;

/// Booking request as submitted by a patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub preferred_doctor: Uuid,
    pub date: chrono::NaiveDate,
    pub time: String,
    pub concern: String,
}

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Invalid doctor selection")]
    InvalidDoctor,

    #[error("You cannot book more than {DAILY_LIMIT} appointments on the same day")]
    DailyLimitExceeded,

    #[error("Invalid time format. Use HH:MM format.")]
    InvalidTimeFormat,

    #[error("Appointment time must be between 9:00 AM and 5:00 PM")]
    OutsideBusinessHours,

    #[error("Health concern must be between {CONCERN_MIN_LEN} and {CONCERN_MAX_LEN} characters")]
    InvalidConcern,

    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment is no longer pending")]
    NotPending,

    #[error("Appointment was already accepted by another doctor")]
    AlreadyAccepted,

    #[error("Invalid status transition")]
    InvalidTransition,

    #[error("Only the assigned doctor can act on this appointment")]
    Forbidden,

    #[error("Prescription can only be added to completed appointments")]
    PrescriptionNotAllowed,

    #[error("Prescription {field} must be at least {PRESCRIPTION_FIELD_MIN_LEN} characters")]
    InvalidPrescription { field: &'static str },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Create a new appointment for `patient_id`.
///
/// Validation order is fixed; the first failing check wins:
/// 1. preferred doctor must exist with role `Doctor`
/// 2. the patient's daily booking limit
/// 3. time format, 4. business hours, 5. concern length
pub fn create_appointment(
    conn: &Connection,
    patient_id: &Uuid,
    req: &NewAppointment,
) -> Result<Appointment, BookingError> {
    match get_user(conn, &req.preferred_doctor) {
        Ok(user) if user.role == Role::Doctor => {}
        Ok(_) | Err(DatabaseError::NotFound { .. }) => return Err(BookingError::InvalidDoctor),
        Err(other) => return Err(other.into()),
    }

    let existing = count_for_patient_on_date(conn, patient_id, &req.date)?;
    if existing >= DAILY_LIMIT {
        tracing::debug!(%patient_id, date = %req.date, existing, "daily booking limit hit");
        return Err(BookingError::DailyLimitExceeded);
    }

    let time = NaiveTime::parse_from_str(&req.time, "%H:%M")
        .map_err(|_| BookingError::InvalidTimeFormat)?;
    let hour = chrono::Timelike::hour(&time);
    if !(OPENING_HOUR..CLOSING_HOUR).contains(&hour) {
        return Err(BookingError::OutsideBusinessHours);
    }

    let concern = req.concern.trim();
    if concern.chars().count() < CONCERN_MIN_LEN || concern.chars().count() > CONCERN_MAX_LEN {
        return Err(BookingError::InvalidConcern);
    }

    let now = Utc::now();
    let appointment = Appointment {
        id: Uuid::new_v4(),
        patient_id: *patient_id,
        preferred_doctor_id: req.preferred_doctor,
        doctor_id: None,
        date: req.date,
        time: format!("{:02}:{:02}", hour, chrono::Timelike::minute(&time)),
        concern: concern.to_string(),
        status: AppointmentStatus::Pending,
        prescription: None,
        created_at: now,
        updated_at: now,
    };
    insert_appointment(conn, &appointment)?;

    tracing::info!(appointment_id = %appointment.id, %patient_id, "appointment booked");
    Ok(appointment)
}

/// Accept a pending appointment on behalf of `doctor_id`.
///
/// The pre-read only classifies the failure (`NotFound` vs `NotPending`);
/// the claim itself is the atomic conditional update in the store. When
/// the pre-read saw `Pending` but the update changes no row, this caller
/// lost the race — `AlreadyAccepted`, never a silent no-op.
pub fn accept_appointment(
    conn: &Connection,
    appointment_id: &Uuid,
    doctor_id: &Uuid,
) -> Result<Appointment, BookingError> {
    let current = match get_appointment(conn, appointment_id) {
        Ok(appt) => appt,
        Err(DatabaseError::NotFound { .. }) => return Err(BookingError::NotFound),
        Err(other) => return Err(other.into()),
    };
    if current.status != AppointmentStatus::Pending {
        return Err(BookingError::NotPending);
    }

    let changed = accept_pending(conn, appointment_id, doctor_id, Utc::now())?;
    if changed == 0 {
        tracing::info!(%appointment_id, %doctor_id, "lost accept race");
        return Err(BookingError::AlreadyAccepted);
    }

    tracing::info!(%appointment_id, %doctor_id, "appointment accepted");
    Ok(get_appointment(conn, appointment_id)?)
}

/// Advance an appointment to `target` on behalf of the assigned doctor.
///
/// Legal edges: `Confirmed → In Progress` and `In Progress → Completed`.
pub fn advance_status(
    conn: &Connection,
    appointment_id: &Uuid,
    doctor_id: &Uuid,
    target: AppointmentStatus,
) -> Result<Appointment, BookingError> {
    let current = match get_appointment(conn, appointment_id) {
        Ok(appt) => appt,
        Err(DatabaseError::NotFound { .. }) => return Err(BookingError::NotFound),
        Err(other) => return Err(other.into()),
    };

    if current.doctor_id != Some(*doctor_id) {
        return Err(BookingError::Forbidden);
    }
    if current.status.advance_target() != Some(target) {
        return Err(BookingError::InvalidTransition);
    }

    update_status(conn, appointment_id, target, Utc::now())?;

    tracing::info!(%appointment_id, status = target.as_str(), "appointment advanced");
    Ok(get_appointment(conn, appointment_id)?)
}

/// File (or overwrite) the prescription for a completed appointment.
pub fn add_prescription(
    conn: &Connection,
    appointment_id: &Uuid,
    doctor_id: &Uuid,
    prescription: &Prescription,
) -> Result<Appointment, BookingError> {
    let current = match get_appointment(conn, appointment_id) {
        Ok(appt) => appt,
        Err(DatabaseError::NotFound { .. }) => return Err(BookingError::NotFound),
        Err(other) => return Err(other.into()),
    };

    if current.doctor_id != Some(*doctor_id) {
        return Err(BookingError::Forbidden);
    }
    if current.status != AppointmentStatus::Completed {
        return Err(BookingError::PrescriptionNotAllowed);
    }

    let trimmed = Prescription {
        medicine: validated_field(&prescription.medicine, "medicine")?,
        dosage: validated_field(&prescription.dosage, "dosage")?,
        frequency: validated_field(&prescription.frequency, "frequency")?,
    };
    set_prescription(conn, appointment_id, &trimmed, Utc::now())?;

    tracing::info!(%appointment_id, "prescription filed");
    Ok(get_appointment(conn, appointment_id)?)
}

fn validated_field(value: &str, field: &'static str) -> Result<String, BookingError> {
    let trimmed = value.trim();
    if trimmed.chars().count() < PRESCRIPTION_FIELD_MIN_LEN {
        return Err(BookingError::InvalidPrescription { field });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::db::repository::insert_user;
    use crate::db::sqlite::{open_database, open_memory_database};
    use crate::models::User;

    fn seed_user(conn: &Connection, role: Role, email: &str) -> Uuid {
        let user = User {
            id: Uuid::new_v4(),
            name: email.split('@').next().unwrap_or("user").to_string(),
            email: email.into(),
            password_hash: "hash".into(),
            role,
            created_at: Utc::now(),
        };
        insert_user(conn, &user).unwrap();
        user.id
    }

    fn request(doctor: Uuid, time: &str) -> NewAppointment {
        NewAppointment {
            preferred_doctor: doctor,
            date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            time: time.into(),
            concern: "Persistent dry cough for two weeks".into(),
        }
    }

    #[test]
    fn create_happy_path_is_pending_and_unassigned() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, Role::Patient, "pat@t.test");
        let doctor = seed_user(&conn, Role::Doctor, "doc@t.test");

        let appt = create_appointment(&conn, &patient, &request(doctor, "10:00")).unwrap();
        assert_eq!(appt.status, AppointmentStatus::Pending);
        assert!(appt.doctor_id.is_none());
        assert_eq!(appt.time, "10:00");
    }

    #[test]
    fn create_rejects_non_doctor_and_unknown_doctor() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, Role::Patient, "pat@t.test");
        let other_patient = seed_user(&conn, Role::Patient, "other@t.test");

        let result = create_appointment(&conn, &patient, &request(other_patient, "10:00"));
        assert!(matches!(result, Err(BookingError::InvalidDoctor)));

        let result = create_appointment(&conn, &patient, &request(Uuid::new_v4(), "10:00"));
        assert!(matches!(result, Err(BookingError::InvalidDoctor)));
    }

    #[test]
    fn third_booking_on_same_day_hits_daily_limit() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, Role::Patient, "pat@t.test");
        let doctor = seed_user(&conn, Role::Doctor, "doc@t.test");

        create_appointment(&conn, &patient, &request(doctor, "09:00")).unwrap();
        create_appointment(&conn, &patient, &request(doctor, "10:00")).unwrap();

        let third = create_appointment(&conn, &patient, &request(doctor, "11:00"));
        assert!(matches!(third, Err(BookingError::DailyLimitExceeded)));

        // A different day is a fresh bucket
        let mut other_day = request(doctor, "11:00");
        other_day.date = NaiveDate::from_ymd_opt(2026, 9, 2).unwrap();
        assert!(create_appointment(&conn, &patient, &other_day).is_ok());
    }

    #[test]
    fn daily_limit_is_per_patient() {
        let conn = open_memory_database().unwrap();
        let patient_a = seed_user(&conn, Role::Patient, "a@t.test");
        let patient_b = seed_user(&conn, Role::Patient, "b@t.test");
        let doctor = seed_user(&conn, Role::Doctor, "doc@t.test");

        create_appointment(&conn, &patient_a, &request(doctor, "09:00")).unwrap();
        create_appointment(&conn, &patient_a, &request(doctor, "10:00")).unwrap();
        // Other patient unaffected on the same day
        assert!(create_appointment(&conn, &patient_b, &request(doctor, "10:00")).is_ok());
    }

    #[test]
    fn time_validation_boundaries() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, Role::Patient, "pat@t.test");
        let doctor = seed_user(&conn, Role::Doctor, "doc@t.test");

        for bad in ["8:60", "25:00", "noon", "10-30", ""] {
            let result = create_appointment(&conn, &patient, &request(doctor, bad));
            assert!(
                matches!(result, Err(BookingError::InvalidTimeFormat)),
                "expected InvalidTimeFormat for {bad:?}"
            );
        }

        for outside in ["08:59", "17:00", "00:00", "23:59"] {
            let result = create_appointment(&conn, &patient, &request(doctor, outside));
            assert!(
                matches!(result, Err(BookingError::OutsideBusinessHours)),
                "expected OutsideBusinessHours for {outside:?}"
            );
        }

        assert!(create_appointment(&conn, &patient, &request(doctor, "09:00")).is_ok());
        assert!(create_appointment(&conn, &patient, &request(doctor, "16:59")).is_ok());
    }

    #[test]
    fn concern_length_bounds_after_trim() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, Role::Patient, "pat@t.test");
        let doctor = seed_user(&conn, Role::Doctor, "doc@t.test");

        let mut req = request(doctor, "10:00");
        req.concern = "  too short  ".into(); // 9 chars trimmed
        assert!(matches!(
            create_appointment(&conn, &patient, &req),
            Err(BookingError::InvalidConcern)
        ));

        req.concern = "x".repeat(201);
        assert!(matches!(
            create_appointment(&conn, &patient, &req),
            Err(BookingError::InvalidConcern)
        ));

        req.concern = format!("  {}  ", "x".repeat(200));
        assert!(create_appointment(&conn, &patient, &req).is_ok());
    }

    #[test]
    fn accept_assigns_doctor_and_confirms() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, Role::Patient, "pat@t.test");
        let preferred = seed_user(&conn, Role::Doctor, "doc@t.test");
        let other = seed_user(&conn, Role::Doctor, "other@t.test");

        let appt = create_appointment(&conn, &patient, &request(preferred, "10:00")).unwrap();

        // Any doctor may accept, not only the preferred one
        let accepted = accept_appointment(&conn, &appt.id, &other).unwrap();
        assert_eq!(accepted.status, AppointmentStatus::Confirmed);
        assert_eq!(accepted.doctor_id, Some(other));
    }

    #[test]
    fn accept_missing_and_non_pending() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, Role::Patient, "pat@t.test");
        let doctor = seed_user(&conn, Role::Doctor, "doc@t.test");

        assert!(matches!(
            accept_appointment(&conn, &Uuid::new_v4(), &doctor),
            Err(BookingError::NotFound)
        ));

        let appt = create_appointment(&conn, &patient, &request(doctor, "10:00")).unwrap();
        accept_appointment(&conn, &appt.id, &doctor).unwrap();

        assert!(matches!(
            accept_appointment(&conn, &appt.id, &doctor),
            Err(BookingError::NotPending)
        ));
    }

    #[test]
    fn concurrent_accept_has_exactly_one_winner() {
        use std::sync::{Arc, Barrier};

        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("race.db");

        let (patient, appt_id, doctors) = {
            let conn = open_database(&db_path).unwrap();
            let patient = seed_user(&conn, Role::Patient, "pat@t.test");
            let d1 = seed_user(&conn, Role::Doctor, "d1@t.test");
            let d2 = seed_user(&conn, Role::Doctor, "d2@t.test");
            let appt = create_appointment(&conn, &patient, &request(d1, "10:00")).unwrap();
            (patient, appt.id, [d1, d2])
        };
        let _ = patient;

        let barrier = Arc::new(Barrier::new(2));
        let mut handles = Vec::new();
        for doctor in doctors {
            let barrier = Arc::clone(&barrier);
            let db_path = db_path.clone();
            handles.push(std::thread::spawn(move || {
                let conn = open_database(&db_path).unwrap();
                barrier.wait();
                accept_appointment(&conn, &appt_id, &doctor)
            }));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1, "exactly one accept must win: {results:?}");

        let loser = results.iter().find(|r| r.is_err()).unwrap();
        assert!(matches!(
            loser,
            Err(BookingError::AlreadyAccepted) | Err(BookingError::NotPending)
        ));

        // Stored doctor equals the winner's identity
        let conn = open_database(&db_path).unwrap();
        let stored = get_appointment(&conn, &appt_id).unwrap();
        let winner = results
            .iter()
            .find_map(|r| r.as_ref().ok())
            .and_then(|a| a.doctor_id);
        assert_eq!(stored.status, AppointmentStatus::Confirmed);
        assert_eq!(stored.doctor_id, winner);
    }

    #[test]
    fn advance_walks_the_lifecycle_in_order() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, Role::Patient, "pat@t.test");
        let doctor = seed_user(&conn, Role::Doctor, "doc@t.test");

        let appt = create_appointment(&conn, &patient, &request(doctor, "10:00")).unwrap();

        // advance from Pending is never legal — accept is the only exit
        assert!(matches!(
            advance_status(&conn, &appt.id, &doctor, AppointmentStatus::InProgress),
            Err(BookingError::Forbidden) // no assigned doctor yet
        ));

        accept_appointment(&conn, &appt.id, &doctor).unwrap();

        // Skipping a state is rejected
        assert!(matches!(
            advance_status(&conn, &appt.id, &doctor, AppointmentStatus::Completed),
            Err(BookingError::InvalidTransition)
        ));

        let in_progress =
            advance_status(&conn, &appt.id, &doctor, AppointmentStatus::InProgress).unwrap();
        assert_eq!(in_progress.status, AppointmentStatus::InProgress);

        let completed =
            advance_status(&conn, &appt.id, &doctor, AppointmentStatus::Completed).unwrap();
        assert_eq!(completed.status, AppointmentStatus::Completed);

        // Completed is terminal
        for target in [
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
            AppointmentStatus::InProgress,
            AppointmentStatus::Completed,
        ] {
            assert!(matches!(
                advance_status(&conn, &appt.id, &doctor, target),
                Err(BookingError::InvalidTransition)
            ));
        }
    }

    #[test]
    fn advance_requires_assigned_doctor() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, Role::Patient, "pat@t.test");
        let doctor = seed_user(&conn, Role::Doctor, "doc@t.test");
        let rival = seed_user(&conn, Role::Doctor, "rival@t.test");

        let appt = create_appointment(&conn, &patient, &request(doctor, "10:00")).unwrap();
        accept_appointment(&conn, &appt.id, &doctor).unwrap();

        // Another valid doctor is still forbidden
        assert!(matches!(
            advance_status(&conn, &appt.id, &rival, AppointmentStatus::InProgress),
            Err(BookingError::Forbidden)
        ));
    }

    fn completed_appointment(conn: &Connection, patient: Uuid, doctor: Uuid) -> Uuid {
        let appt = create_appointment(conn, &patient, &request(doctor, "10:00")).unwrap();
        accept_appointment(conn, &appt.id, &doctor).unwrap();
        advance_status(conn, &appt.id, &doctor, AppointmentStatus::InProgress).unwrap();
        advance_status(conn, &appt.id, &doctor, AppointmentStatus::Completed).unwrap();
        appt.id
    }

    #[test]
    fn prescription_requires_completed_status() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, Role::Patient, "pat@t.test");
        let doctor = seed_user(&conn, Role::Doctor, "doc@t.test");

        let appt = create_appointment(&conn, &patient, &request(doctor, "10:00")).unwrap();
        accept_appointment(&conn, &appt.id, &doctor).unwrap();

        let rx = Prescription {
            medicine: "Metformin".into(),
            dosage: "500mg".into(),
            frequency: "Twice daily".into(),
        };
        assert!(matches!(
            add_prescription(&conn, &appt.id, &doctor, &rx),
            Err(BookingError::PrescriptionNotAllowed)
        ));
    }

    #[test]
    fn prescription_requires_assigned_doctor_and_valid_fields() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, Role::Patient, "pat@t.test");
        let doctor = seed_user(&conn, Role::Doctor, "doc@t.test");
        let rival = seed_user(&conn, Role::Doctor, "rival@t.test");

        let appt_id = completed_appointment(&conn, patient, doctor);

        let rx = Prescription {
            medicine: "Metformin".into(),
            dosage: "500mg".into(),
            frequency: "Twice daily".into(),
        };
        assert!(matches!(
            add_prescription(&conn, &appt_id, &rival, &rx),
            Err(BookingError::Forbidden)
        ));

        let short = Prescription {
            medicine: "M".into(),
            dosage: "500mg".into(),
            frequency: "Twice daily".into(),
        };
        assert!(matches!(
            add_prescription(&conn, &appt_id, &doctor, &short),
            Err(BookingError::InvalidPrescription { field: "medicine" })
        ));

        let stored = add_prescription(&conn, &appt_id, &doctor, &rx).unwrap();
        assert_eq!(stored.prescription.unwrap().medicine, "Metformin");
    }
}
