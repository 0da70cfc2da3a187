//! Appointment endpoints: booking, listing, acceptance, status
//! transitions, and prescriptions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::booking::{self, NewAppointment};
use crate::db::repository::{self, AppointmentScope};
use crate::models::{Appointment, AppointmentDetail, AppointmentStatus, DoctorInfo, Prescription, Role};

/// `GET /api/appointments/doctors` — selectable doctors for booking.
pub async fn doctors(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<DoctorInfo>>, ApiError> {
    let conn = ctx.state.open_db()?;
    Ok(Json(repository::list_doctors(&conn)?))
}

/// `POST /api/appointments` — book a new appointment (Patient only).
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthUser>,
    Json(req): Json<NewAppointment>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    caller.require_role(Role::Patient)?;
    let conn = ctx.state.open_db()?;
    let appointment = booking::create_appointment(&conn, &caller.id, &req)?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub mine: bool,
}

/// `GET /api/appointments` — patients see their own bookings; doctors
/// see every appointment, or only their assigned ones via `?mine=true`.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<AppointmentDetail>>, ApiError> {
    let scope = match caller.role {
        Role::Patient => AppointmentScope::Patient(caller.id),
        Role::Doctor if query.mine => AppointmentScope::Doctor(caller.id),
        Role::Doctor => AppointmentScope::All,
    };
    let conn = ctx.state.open_db()?;
    Ok(Json(repository::list_appointments(&conn, &scope)?))
}

/// `GET /api/appointments/pending` — the open queue (Doctor only).
pub async fn pending(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthUser>,
) -> Result<Json<Vec<AppointmentDetail>>, ApiError> {
    caller.require_role(Role::Doctor)?;
    let conn = ctx.state.open_db()?;
    Ok(Json(repository::list_appointments(
        &conn,
        &AppointmentScope::Pending,
    )?))
}

/// `PUT /api/appointments/:id/accept` — claim a pending appointment
/// (Doctor only). Losing the race returns 409.
pub async fn accept(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, ApiError> {
    caller.require_role(Role::Doctor)?;
    let conn = ctx.state.open_db()?;
    let appointment = booking::accept_appointment(&conn, &id, &caller.id)?;
    Ok(Json(appointment))
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// `PUT /api/appointments/:id/status` — advance the lifecycle
/// (assigned doctor only).
pub async fn update_status(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<Appointment>, ApiError> {
    caller.require_role(Role::Doctor)?;
    let target = AppointmentStatus::from_str(&body.status)
        .map_err(|_| ApiError::BadRequest(format!("Unknown status: {}", body.status)))?;

    let conn = ctx.state.open_db()?;
    let appointment = booking::advance_status(&conn, &id, &caller.id, target)?;
    Ok(Json(appointment))
}

/// `PUT /api/appointments/:id/prescription` — file a prescription on a
/// completed appointment (assigned doctor only).
pub async fn prescription(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<Prescription>,
) -> Result<Json<Appointment>, ApiError> {
    caller.require_role(Role::Doctor)?;
    let conn = ctx.state.open_db()?;
    let appointment = booking::add_prescription(&conn, &id, &caller.id, &body)?;
    Ok(Json(appointment))
}
