// src/db/users.rs
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::lead::Role;
use crate::errors::ServerError;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// A resolved fan-out target: just enough for template building.
#[derive(Debug, Clone)]
pub struct RecipientInfo {
    pub user_id: i64,
    pub name: String,
    pub role: Role,
}

/// Insert a user if they don't exist, then return the user id.
/// Email should already be normalized by caller (trim/lowercase).
pub fn get_or_create_user(
    conn: &Connection,
    name: &str,
    email: &str,
    role: Role,
    now: i64,
) -> Result<i64, ServerError> {
    conn.execute(
        "insert or ignore into users (name, email, role, created_at) values (?, ?, ?, ?)",
        params![name, email, role.as_str(), now],
    )
    .map_err(|e| ServerError::DbError(format!("insert user failed: {e}")))?;

    let id: i64 = conn
        .query_row(
            "select id from users where email = ?",
            params![email],
            |row| row.get(0),
        )
        .map_err(|e| ServerError::DbError(format!("select user id failed: {e}")))?;

    Ok(id)
}

pub fn get_user(conn: &Connection, user_id: i64) -> Result<Option<UserRow>, ServerError> {
    let row = conn
        .query_row(
            "select id, name, email, role from users where id = ?",
            params![user_id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                ))
            },
        )
        .optional()
        .map_err(|e| ServerError::DbError(format!("select user failed: {e}")))?;

    match row {
        Some((id, name, email, role)) => Ok(Some(UserRow {
            id,
            name,
            email,
            role: Role::parse(&role)?,
        })),
        None => Ok(None),
    }
}

pub fn is_user_admin(conn: &Connection, user_id: i64) -> Result<bool, ServerError> {
    let role: Option<String> = conn
        .query_row(
            "select role from users where id = ?",
            params![user_id],
            |r| r.get(0),
        )
        .optional()
        .map_err(|e| ServerError::DbError(format!("select role failed: {e}")))?;

    Ok(role.as_deref() == Some("Admin"))
}

/// Resolve a single fan-out recipient.
pub fn get_recipient(conn: &Connection, user_id: i64) -> Result<Option<RecipientInfo>, ServerError> {
    Ok(get_user(conn, user_id)?.map(|u| RecipientInfo {
        user_id: u.id,
        name: u.name,
        role: u.role,
    }))
}

/// Resolve every user except the excluded role, ordered by id so chunked
/// fan-out batches are deterministic.
pub fn list_recipients_except_role(
    conn: &Connection,
    excluded: Role,
) -> Result<Vec<RecipientInfo>, ServerError> {
    let mut stmt = conn
        .prepare("select id, name, role from users where role <> ? order by id")
        .map_err(|e| ServerError::DbError(format!("prepare recipients failed: {e}")))?;

    let rows = stmt
        .query_map(params![excluded.as_str()], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .map_err(|e| ServerError::DbError(format!("query recipients failed: {e}")))?;

    let mut out = Vec::new();
    for r in rows {
        let (user_id, name, role) =
            r.map_err(|e| ServerError::DbError(format!("read recipient failed: {e}")))?;
        out.push(RecipientInfo {
            user_id,
            name,
            role: Role::parse(&role)?,
        });
    }
    Ok(out)
}
