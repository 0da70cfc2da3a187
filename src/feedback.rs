//! Feedback Ledger — one patient review per completed appointment, plus
//! the aggregate rating a doctor carries.
//!
//! The doctor credited is always copied from the appointment record at
//! submission time, never taken from the request, so feedback can only
//! land on whoever actually handled the visit.

use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::{
    get_appointment, get_feedback_by_appointment, insert_feedback, list_feedback_by_doctor,
};
use crate::db::DatabaseError;
use crate::models::{AppointmentStatus, DoctorFeedbackSummary, Feedback};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
pub const COMMENT_MAX_LEN: usize = 150;

#[derive(Debug, Clone, Deserialize)]
pub struct NewFeedback {
    pub appointment_id: Uuid,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Error, Debug)]
pub enum FeedbackError {
    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Feedback is only allowed on completed appointments")]
    NotCompleted,

    #[error("Only the patient of this appointment can leave feedback")]
    Forbidden,

    #[error("Feedback has already been submitted for this appointment")]
    Duplicate,

    #[error("Rating must be between {MIN_RATING} and {MAX_RATING}")]
    InvalidRating,

    #[error("Comment must be at most {COMMENT_MAX_LEN} characters")]
    CommentTooLong,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Submit feedback for a completed appointment on behalf of `patient_id`.
pub fn submit_feedback(
    conn: &Connection,
    patient_id: &Uuid,
    req: &NewFeedback,
) -> Result<Feedback, FeedbackError> {
    let appointment = match get_appointment(conn, &req.appointment_id) {
        Ok(appt) => appt,
        Err(DatabaseError::NotFound { .. }) => return Err(FeedbackError::AppointmentNotFound),
        Err(other) => return Err(other.into()),
    };

    if appointment.status != AppointmentStatus::Completed {
        return Err(FeedbackError::NotCompleted);
    }
    if appointment.patient_id != *patient_id {
        return Err(FeedbackError::Forbidden);
    }
    if get_feedback_by_appointment(conn, &req.appointment_id)?.is_some() {
        return Err(FeedbackError::Duplicate);
    }
    if !(MIN_RATING..=MAX_RATING).contains(&req.rating) {
        return Err(FeedbackError::InvalidRating);
    }

    let comment = match req.comment.as_deref().map(str::trim) {
        Some("") | None => None,
        Some(text) if text.chars().count() > COMMENT_MAX_LEN => {
            return Err(FeedbackError::CommentTooLong)
        }
        Some(text) => Some(text.to_string()),
    };

    // Credited doctor comes from the record, not the caller
    let doctor_id = appointment
        .doctor_id
        .unwrap_or(appointment.preferred_doctor_id);

    let feedback = Feedback {
        id: Uuid::new_v4(),
        appointment_id: req.appointment_id,
        patient_id: *patient_id,
        doctor_id,
        rating: req.rating,
        comment,
        created_at: Utc::now(),
    };
    insert_feedback(conn, &feedback).map_err(|e| match e {
        // Concurrent duplicate submits resolve on the UNIQUE index
        DatabaseError::ConstraintViolation(_) => FeedbackError::Duplicate,
        other => FeedbackError::Database(other),
    })?;

    tracing::info!(appointment_id = %feedback.appointment_id, rating = feedback.rating, "feedback recorded");
    Ok(feedback)
}

/// Every feedback entry for a doctor plus the aggregate, average rounded
/// to one decimal place. An unreviewed doctor reads as 0.0 over 0 entries.
pub fn doctor_feedback(
    conn: &Connection,
    doctor_id: &Uuid,
) -> Result<DoctorFeedbackSummary, FeedbackError> {
    let entries = list_feedback_by_doctor(conn, doctor_id)?;

    let average_rating = if entries.is_empty() {
        0.0
    } else {
        let sum: u32 = entries.iter().map(|f| u32::from(f.rating)).sum();
        let avg = f64::from(sum) / entries.len() as f64;
        (avg * 10.0).round() / 10.0
    };

    Ok(DoctorFeedbackSummary {
        total_feedback: entries.len(),
        average_rating,
        entries,
    })
}

/// Feedback attached to one appointment, if any.
pub fn appointment_feedback(
    conn: &Connection,
    appointment_id: &Uuid,
) -> Result<Option<Feedback>, FeedbackError> {
    Ok(get_feedback_by_appointment(conn, appointment_id)?)
}
