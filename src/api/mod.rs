//! HTTP API layer.
//!
//! Routes are nested under `/api/`. Registration, login, and the
//! health check are open; the rest requires a bearer token issued at
//! login. The router is composable — `api_router()` returns a `Router`
//! that can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_server_on, ApiServer};
pub use types::ApiContext;
