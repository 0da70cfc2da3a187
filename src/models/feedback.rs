use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One rating for a completed appointment. At most one per appointment.
///
/// `doctor_id` is copied from the appointment at submission time, never
/// supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// All feedback for a doctor plus the aggregate rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorFeedbackSummary {
    pub entries: Vec<Feedback>,
    /// Arithmetic mean rounded to one decimal; 0.0 when no feedback exists.
    pub average_rating: f64,
    pub total_feedback: usize,
}
