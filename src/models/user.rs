use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Role;

/// A registered account. The password hash never leaves the db layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Doctor projection for the booking selector ({name, email} only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Party reference embedded in appointment listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}
