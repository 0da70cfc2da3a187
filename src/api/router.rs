//! HTTP router.
//!
//! Routes live under `/api/`. Registration, login, and the health check
//! are open; everything else requires a bearer token. Middleware uses
//! `Extension<ApiContext>` (injected as the outermost layer), handlers
//! use `State<ApiContext>`.

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::state::AppState;

/// Build the full application router.
pub fn api_router(state: Arc<AppState>) -> Router {
    build_router(ApiContext::new(state))
}

fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/auth/profile", get(endpoints::auth::profile))
        .route(
            "/appointments",
            get(endpoints::appointments::list).post(endpoints::appointments::create),
        )
        .route(
            "/appointments/doctors",
            get(endpoints::appointments::doctors),
        )
        .route(
            "/appointments/pending",
            get(endpoints::appointments::pending),
        )
        .route(
            "/appointments/:id/accept",
            put(endpoints::appointments::accept),
        )
        .route(
            "/appointments/:id/status",
            put(endpoints::appointments::update_status),
        )
        .route(
            "/appointments/:id/prescription",
            put(endpoints::appointments::prescription),
        )
        .route("/feedback", post(endpoints::feedback::submit))
        .route(
            "/feedback/doctor/:doctor_id",
            get(endpoints::feedback::by_doctor),
        )
        .route(
            "/feedback/appointment/:appointment_id",
            get(endpoints::feedback::by_appointment),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/register", post(endpoints::auth::register))
        .route("/auth/login", post(endpoints::auth::login))
        .with_state(ctx);

    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
        .layer(CorsLayer::permissive())
}
