use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, ToSql};
use uuid::Uuid;

use crate::db::repository::user::{parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::{
    Appointment, AppointmentDetail, AppointmentStatus, PartyRef, Prescription,
};

/// Which appointments to list. Patients see their own; doctors see all,
/// their own assignments, or the pending pool.
#[derive(Debug, Clone)]
pub enum AppointmentScope {
    Patient(Uuid),
    Doctor(Uuid),
    Pending,
    All,
}

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, patient_id, preferred_doctor_id, doctor_id, date, time,
         concern, status, prescription_medicine, prescription_dosage, prescription_frequency,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            appt.id.to_string(),
            appt.patient_id.to_string(),
            appt.preferred_doctor_id.to_string(),
            appt.doctor_id.map(|id| id.to_string()),
            appt.date.to_string(),
            appt.time,
            appt.concern,
            appt.status.as_str(),
            appt.prescription.as_ref().map(|p| p.medicine.as_str()),
            appt.prescription.as_ref().map(|p| p.dosage.as_str()),
            appt.prescription.as_ref().map(|p| p.frequency.as_str()),
            appt.created_at.to_rfc3339(),
            appt.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Appointment, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            params![id.to_string()],
            appointment_row_from_rusqlite,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
                entity_type: "Appointment".into(),
                id: id.to_string(),
            },
            other => DatabaseError::from(other),
        })?;
    appointment_from_row(row)
}

/// Number of appointments a patient holds on one calendar date.
///
/// Dates are stored as `YYYY-MM-DD`, so the calendar-day bucket is an
/// exact string match — no range arithmetic needed.
pub fn count_for_patient_on_date(
    conn: &Connection,
    patient_id: &Uuid,
    date: &NaiveDate,
) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE patient_id = ?1 AND date = ?2",
        params![patient_id.to_string(), date.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// List appointments with populated party refs, newest first.
pub fn list_appointments(
    conn: &Connection,
    scope: &AppointmentScope,
) -> Result<Vec<AppointmentDetail>, DatabaseError> {
    let (where_clause, filter): (&str, Option<String>) = match scope {
        AppointmentScope::Patient(id) => ("WHERE a.patient_id = ?1", Some(id.to_string())),
        AppointmentScope::Doctor(id) => ("WHERE a.doctor_id = ?1", Some(id.to_string())),
        AppointmentScope::Pending => ("WHERE a.status = 'Pending'", None),
        AppointmentScope::All => ("", None),
    };

    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS_PREFIXED},
                p.name, p.email,
                pd.name, pd.email,
                d.name, d.email
         FROM appointments a
         JOIN users p ON p.id = a.patient_id
         JOIN users pd ON pd.id = a.preferred_doctor_id
         LEFT JOIN users d ON d.id = a.doctor_id
         {where_clause}
         ORDER BY a.created_at DESC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let args: Vec<&dyn ToSql> = match &filter {
        Some(value) => vec![value],
        None => vec![],
    };

    let rows = stmt.query_map(args.as_slice(), |row| {
        let appt = appointment_row_from_rusqlite(row)?;
        let patient_name: String = row.get(13)?;
        let patient_email: String = row.get(14)?;
        let preferred_name: String = row.get(15)?;
        let preferred_email: String = row.get(16)?;
        let doctor_name: Option<String> = row.get(17)?;
        let doctor_email: Option<String> = row.get(18)?;
        Ok((
            appt,
            patient_name,
            patient_email,
            preferred_name,
            preferred_email,
            doctor_name,
            doctor_email,
        ))
    })?;

    let mut details = Vec::new();
    for row in rows {
        let (raw, p_name, p_email, pd_name, pd_email, d_name, d_email) = row?;
        let appointment = appointment_from_row(raw)?;
        let doctor = match (appointment.doctor_id, d_name, d_email) {
            (Some(id), Some(name), Some(email)) => Some(PartyRef { id, name, email }),
            _ => None,
        };
        details.push(AppointmentDetail {
            patient: PartyRef {
                id: appointment.patient_id,
                name: p_name,
                email: p_email,
            },
            preferred_doctor: PartyRef {
                id: appointment.preferred_doctor_id,
                name: pd_name,
                email: pd_email,
            },
            doctor,
            appointment,
        });
    }
    Ok(details)
}

/// Atomic conditional accept: claims the appointment for `doctor_id` only
/// if it is still `Pending` at commit time. Returns the number of rows
/// changed — 0 means another doctor already won (or the row is gone).
///
/// This must stay a single UPDATE statement; a read-then-write here would
/// reintroduce the accept race.
pub fn accept_pending(
    conn: &Connection,
    appointment_id: &Uuid,
    doctor_id: &Uuid,
    now: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments
         SET status = 'Confirmed', doctor_id = ?1, updated_at = ?2
         WHERE id = ?3 AND status = 'Pending'",
        params![
            doctor_id.to_string(),
            now.to_rfc3339(),
            appointment_id.to_string()
        ],
    )?;
    Ok(changed)
}

pub fn update_status(
    conn: &Connection,
    appointment_id: &Uuid,
    status: AppointmentStatus,
    now: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now.to_rfc3339(), appointment_id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: appointment_id.to_string(),
        });
    }
    Ok(())
}

/// Overwrites any previous prescription — single current value, no history.
pub fn set_prescription(
    conn: &Connection,
    appointment_id: &Uuid,
    prescription: &Prescription,
    now: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments
         SET prescription_medicine = ?1, prescription_dosage = ?2,
             prescription_frequency = ?3, updated_at = ?4
         WHERE id = ?5",
        params![
            prescription.medicine,
            prescription.dosage,
            prescription.frequency,
            now.to_rfc3339(),
            appointment_id.to_string()
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: appointment_id.to_string(),
        });
    }
    Ok(())
}

const APPOINTMENT_COLUMNS: &str = "id, patient_id, preferred_doctor_id, doctor_id, date, time, \
     concern, status, prescription_medicine, prescription_dosage, prescription_frequency, \
     created_at, updated_at";

const APPOINTMENT_COLUMNS_PREFIXED: &str =
    "a.id, a.patient_id, a.preferred_doctor_id, a.doctor_id, a.date, a.time, \
     a.concern, a.status, a.prescription_medicine, a.prescription_dosage, \
     a.prescription_frequency, a.created_at, a.updated_at";

// Internal row type for Appointment mapping
struct AppointmentRow {
    id: String,
    patient_id: String,
    preferred_doctor_id: String,
    doctor_id: Option<String>,
    date: String,
    time: String,
    concern: String,
    status: String,
    prescription_medicine: Option<String>,
    prescription_dosage: Option<String>,
    prescription_frequency: Option<String>,
    created_at: String,
    updated_at: String,
}

fn appointment_row_from_rusqlite(
    row: &rusqlite::Row<'_>,
) -> Result<AppointmentRow, rusqlite::Error> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        preferred_doctor_id: row.get(2)?,
        doctor_id: row.get(3)?,
        date: row.get(4)?,
        time: row.get(5)?,
        concern: row.get(6)?,
        status: row.get(7)?,
        prescription_medicine: row.get(8)?,
        prescription_dosage: row.get(9)?,
        prescription_frequency: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    let prescription = match (
        row.prescription_medicine,
        row.prescription_dosage,
        row.prescription_frequency,
    ) {
        (Some(medicine), Some(dosage), Some(frequency)) => Some(Prescription {
            medicine,
            dosage,
            frequency,
        }),
        _ => None,
    };

    Ok(Appointment {
        id: parse_uuid(&row.id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        preferred_doctor_id: parse_uuid(&row.preferred_doctor_id)?,
        doctor_id: row.doctor_id.as_deref().map(parse_uuid).transpose()?,
        date: NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
            .map_err(|e| DatabaseError::ConstraintViolation(format!("bad date {}: {e}", row.date)))?,
        time: row.time,
        concern: row.concern,
        status: AppointmentStatus::from_str(&row.status)?,
        prescription,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    })
}
