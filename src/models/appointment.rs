use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AppointmentStatus;
use super::user::PartyRef;

/// A booked appointment record.
///
/// `doctor_id` is NULL until a doctor accepts and is set exactly once.
/// `prescription` is present only once the visit is `Completed` and the
/// assigned doctor has filed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub preferred_doctor_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time: String,
    pub concern: String,
    pub status: AppointmentStatus,
    pub prescription: Option<Prescription>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub medicine: String,
    pub dosage: String,
    pub frequency: String,
}

/// Appointment with populated party references for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDetail {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient: PartyRef,
    pub preferred_doctor: PartyRef,
    pub doctor: Option<PartyRef>,
}
