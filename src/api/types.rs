//! Shared types for the HTTP layer: request context, bearer sessions,
//! and the authenticated-caller extension.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::api::error::ApiError;
use crate::models::Role;
use crate::state::AppState;

/// Shared context for all routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub state: Arc<AppState>,
    pub sessions: Arc<Mutex<SessionStore>>,
}

impl ApiContext {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            sessions: Arc::new(Mutex::new(SessionStore::new())),
        }
    }
}

/// Authenticated caller, injected into request extensions by the auth
/// middleware after token validation.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
}

impl AuthUser {
    /// Guard for role-restricted handlers.
    pub fn require_role(&self, role: Role) -> Result<(), ApiError> {
        if self.role == role {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "This action requires the {} role",
                role.as_str()
            )))
        }
    }
}

/// In-memory bearer session store. Only SHA-256 hashes of tokens are
/// kept; a restart invalidates all sessions.
pub struct SessionStore {
    sessions: HashMap<[u8; 32], AuthUser>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Issue a fresh token bound to `user`. The plaintext token is
    /// returned once and never stored.
    pub fn issue(&mut self, user: AuthUser) -> String {
        let token = generate_token();
        self.sessions.insert(hash_token(&token), user);
        token
    }

    pub fn validate(&self, token: &str) -> Option<AuthUser> {
        self.sessions.get(&hash_token(token)).cloned()
    }

    pub fn revoke(&mut self, token: &str) {
        self.sessions.remove(&hash_token(token));
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
