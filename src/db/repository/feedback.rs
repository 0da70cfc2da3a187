use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::repository::user::{parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::Feedback;

pub fn insert_feedback(conn: &Connection, fb: &Feedback) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO feedback (id, appointment_id, patient_id, doctor_id, rating, comment, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            fb.id.to_string(),
            fb.appointment_id.to_string(),
            fb.patient_id.to_string(),
            fb.doctor_id.to_string(),
            fb.rating,
            fb.comment,
            fb.created_at.to_rfc3339(),
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation(format!(
                "feedback already exists for appointment {}",
                fb.appointment_id
            ))
        }
        other => DatabaseError::from(other),
    })?;
    Ok(())
}

pub fn get_feedback_by_appointment(
    conn: &Connection,
    appointment_id: &Uuid,
) -> Result<Option<Feedback>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, appointment_id, patient_id, doctor_id, rating, comment, created_at
         FROM feedback WHERE appointment_id = ?1",
    )?;
    let mut rows = stmt.query_map(params![appointment_id.to_string()], feedback_row)?;
    match rows.next() {
        Some(row) => Ok(Some(feedback_from_row(row?)?)),
        None => Ok(None),
    }
}

/// All feedback for a doctor, newest first.
pub fn list_feedback_by_doctor(
    conn: &Connection,
    doctor_id: &Uuid,
) -> Result<Vec<Feedback>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, appointment_id, patient_id, doctor_id, rating, comment, created_at
         FROM feedback WHERE doctor_id = ?1 ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map(params![doctor_id.to_string()], feedback_row)?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(feedback_from_row(row?)?);
    }
    Ok(entries)
}

// Internal row type for Feedback mapping
struct FeedbackRow {
    id: String,
    appointment_id: String,
    patient_id: String,
    doctor_id: String,
    rating: i64,
    comment: Option<String>,
    created_at: String,
}

fn feedback_row(row: &rusqlite::Row<'_>) -> Result<FeedbackRow, rusqlite::Error> {
    Ok(FeedbackRow {
        id: row.get(0)?,
        appointment_id: row.get(1)?,
        patient_id: row.get(2)?,
        doctor_id: row.get(3)?,
        rating: row.get(4)?,
        comment: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn feedback_from_row(row: FeedbackRow) -> Result<Feedback, DatabaseError> {
    Ok(Feedback {
        id: parse_uuid(&row.id)?,
        appointment_id: parse_uuid(&row.appointment_id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        doctor_id: parse_uuid(&row.doctor_id)?,
        rating: u8::try_from(row.rating)
            .map_err(|_| DatabaseError::ConstraintViolation(format!("bad rating {}", row.rating)))?,
        comment: row.comment,
        created_at: parse_timestamp(&row.created_at)?,
    })
}
