use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{DoctorInfo, Role, User};

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.id.to_string(),
            user.name,
            user.email,
            user.password_hash,
            user.role.as_str(),
            user.created_at.to_rfc3339(),
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation(format!("email already registered: {}", user.email))
        }
        other => DatabaseError::from(other),
    })?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<User, DatabaseError> {
    conn.query_row(
        "SELECT id, name, email, password_hash, role, created_at
         FROM users WHERE id = ?1",
        params![id.to_string()],
        user_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
            entity_type: "User".into(),
            id: id.to_string(),
        },
        other => DatabaseError::from(other),
    })
    .and_then(|r| r)
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, password_hash, role, created_at
         FROM users WHERE email = ?1",
    )?;
    let mut rows = stmt.query_map(params![email], user_from_row)?;
    match rows.next() {
        Some(row) => Ok(Some(row??)),
        None => Ok(None),
    }
}

/// All registered doctors, `{name, email}` projection, for the booking selector.
pub fn list_doctors(conn: &Connection) -> Result<Vec<DoctorInfo>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email FROM users WHERE role = 'Doctor' ORDER BY name ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut doctors = Vec::new();
    for row in rows {
        let (id, name, email) = row?;
        doctors.push(DoctorInfo {
            id: parse_uuid(&id)?,
            name,
            email,
        });
    }
    Ok(doctors)
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<User, DatabaseError>> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let email: String = row.get(2)?;
    let password_hash: String = row.get(3)?;
    let role: String = row.get(4)?;
    let created_at: String = row.get(5)?;

    Ok((|| {
        Ok(User {
            id: parse_uuid(&id)?,
            name,
            email,
            password_hash,
            role: Role::from_str(&role)?,
            created_at: parse_timestamp(&created_at)?,
        })
    })())
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad timestamp {s}: {e}")))
}
