//! Registration, login, and profile endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::auth::{self, Credentials, Registration};
use crate::models::{Role, User};

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// `POST /api/auth/register` — create an account and open a session.
pub async fn register(
    State(ctx): State<ApiContext>,
    Json(req): Json<Registration>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let conn = ctx.state.open_db()?;
    let user = auth::register(&conn, &req)?;
    let token = issue_session(&ctx, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// `POST /api/auth/login` — verify credentials and open a session.
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(creds): Json<Credentials>,
) -> Result<Json<SessionResponse>, ApiError> {
    let conn = ctx.state.open_db()?;
    let user = auth::login(&conn, &creds)?;
    let token = issue_session(&ctx, &user)?;

    Ok(Json(SessionResponse {
        token,
        user: user.into(),
    }))
}

/// `GET /api/auth/profile` — the authenticated account.
pub async fn profile(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthUser>,
) -> Result<Json<UserResponse>, ApiError> {
    let conn = ctx.state.open_db()?;
    let user = crate::db::repository::get_user(&conn, &caller.id)?;
    Ok(Json(user.into()))
}

fn issue_session(ctx: &ApiContext, user: &User) -> Result<String, ApiError> {
    let mut sessions = ctx
        .sessions
        .lock()
        .map_err(|_| ApiError::Internal("session lock".into()))?;
    Ok(sessions.issue(AuthUser {
        id: user.id,
        name: user.name.clone(),
        role: user.role,
    }))
}
