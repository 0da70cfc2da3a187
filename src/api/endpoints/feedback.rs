//! Feedback endpoints: submission plus the doctor and appointment views.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::feedback::{self, NewFeedback};
use crate::models::{DoctorFeedbackSummary, Feedback, Role};

/// `POST /api/feedback` — review a completed appointment (Patient only).
pub async fn submit(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthUser>,
    Json(req): Json<NewFeedback>,
) -> Result<(StatusCode, Json<Feedback>), ApiError> {
    caller.require_role(Role::Patient)?;
    let conn = ctx.state.open_db()?;
    let entry = feedback::submit_feedback(&conn, &caller.id, &req)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// `GET /api/feedback/doctor/:doctor_id` — all reviews for a doctor
/// plus the aggregate rating.
pub async fn by_doctor(
    State(ctx): State<ApiContext>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<DoctorFeedbackSummary>, ApiError> {
    let conn = ctx.state.open_db()?;
    Ok(Json(feedback::doctor_feedback(&conn, &doctor_id)?))
}

/// `GET /api/feedback/appointment/:appointment_id` — the review for one
/// appointment, or `null`.
pub async fn by_appointment(
    State(ctx): State<ApiContext>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Option<Feedback>>, ApiError> {
    let conn = ctx.state.open_db()?;
    Ok(Json(feedback::appointment_feedback(&conn, &appointment_id)?))
}
