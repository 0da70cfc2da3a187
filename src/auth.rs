//! Identity provider — registration, login, and password storage.
//!
//! Passwords are stored as PBKDF2-SHA256 PHC strings; verification
//! re-derives from the embedded salt and parameters. No plaintext ever
//! touches the database or the logs.

use chrono::Utc;
use pbkdf2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::Pbkdf2;
use rusqlite::Connection;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::{get_user_by_email, insert_user};
use crate::db::DatabaseError;
use crate::models::{Role, User};

pub const NAME_MIN_LEN: usize = 2;
pub const PASSWORD_MIN_LEN: usize = 6;

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Name must be at least {NAME_MIN_LEN} characters")]
    InvalidName,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Password must be at least {PASSWORD_MIN_LEN} characters")]
    WeakPassword,

    #[error("Email is already registered")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Password hashing failed")]
    Hashing,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Register a new account. Emails are stored lowercased so lookups are
/// case-insensitive.
pub fn register(conn: &Connection, req: &Registration) -> Result<User, AuthError> {
    let name = req.name.trim();
    if name.chars().count() < NAME_MIN_LEN {
        return Err(AuthError::InvalidName);
    }

    let email = req.email.trim().to_lowercase();
    if !is_plausible_email(&email) {
        return Err(AuthError::InvalidEmail);
    }

    if req.password.chars().count() < PASSWORD_MIN_LEN {
        return Err(AuthError::WeakPassword);
    }

    let user = User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email,
        password_hash: hash_password(&req.password)?,
        role: req.role,
        created_at: Utc::now(),
    };

    insert_user(conn, &user).map_err(|e| match e {
        DatabaseError::ConstraintViolation(_) => AuthError::EmailTaken,
        other => AuthError::Database(other),
    })?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "account registered");
    Ok(user)
}

/// Verify credentials and return the account.
///
/// Missing account and wrong password collapse into the same error so
/// login probing cannot enumerate emails.
pub fn login(conn: &Connection, creds: &Credentials) -> Result<User, AuthError> {
    let email = creds.email.trim().to_lowercase();
    let user = get_user_by_email(conn, &email)?.ok_or(AuthError::InvalidCredentials)?;

    let parsed = PasswordHash::new(&user.password_hash).map_err(|_| AuthError::Hashing)?;
    Pbkdf2
        .verify_password(creds.password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)?;

    tracing::info!(user_id = %user.id, "login succeeded");
    Ok(user)
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Pbkdf2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| AuthError::Hashing)
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn registration(email: &str) -> Registration {
        Registration {
            name: "Ada Wong".into(),
            email: email.into(),
            password: "secret123".into(),
            role: Role::Patient,
        }
    }

    #[test]
    fn register_then_login_round_trip() {
        let conn = open_memory_database().unwrap();
        let created = register(&conn, &registration("ada@clinic.test")).unwrap();
        assert_ne!(created.password_hash, "secret123");
        assert!(created.password_hash.starts_with("$pbkdf2"));

        let user = login(
            &conn,
            &Credentials {
                email: "ada@clinic.test".into(),
                password: "secret123".into(),
            },
        )
        .unwrap();
        assert_eq!(user.id, created.id);
    }

    #[test]
    fn email_is_normalized_to_lowercase() {
        let conn = open_memory_database().unwrap();
        register(&conn, &registration("Ada@Clinic.Test")).unwrap();

        let user = login(
            &conn,
            &Credentials {
                email: "ada@clinic.test".into(),
                password: "secret123".into(),
            },
        )
        .unwrap();
        assert_eq!(user.email, "ada@clinic.test");
    }

    #[test]
    fn validation_rejections() {
        let conn = open_memory_database().unwrap();

        let mut bad = registration("ada@clinic.test");
        bad.name = " a ".into();
        assert!(matches!(register(&conn, &bad), Err(AuthError::InvalidName)));

        for email in ["no-at-sign", "@clinic.test", "ada@nodot", "ada@.test"] {
            assert!(
                matches!(register(&conn, &registration(email)), Err(AuthError::InvalidEmail)),
                "expected InvalidEmail for {email:?}"
            );
        }

        let mut weak = registration("ada@clinic.test");
        weak.password = "12345".into();
        assert!(matches!(register(&conn, &weak), Err(AuthError::WeakPassword)));
    }

    #[test]
    fn duplicate_email_is_taken() {
        let conn = open_memory_database().unwrap();
        register(&conn, &registration("ada@clinic.test")).unwrap();
        assert!(matches!(
            register(&conn, &registration("ada@clinic.test")),
            Err(AuthError::EmailTaken)
        ));
    }

    #[test]
    fn wrong_password_and_unknown_email_look_identical() {
        let conn = open_memory_database().unwrap();
        register(&conn, &registration("ada@clinic.test")).unwrap();

        let wrong = login(
            &conn,
            &Credentials {
                email: "ada@clinic.test".into(),
                password: "not-it-at-all".into(),
            },
        );
        let unknown = login(
            &conn,
            &Credentials {
                email: "nobody@clinic.test".into(),
                password: "secret123".into(),
            },
        );
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
    }
}
