// src/auth/sessions.rs
//
// The identity collaborator. Everything downstream trusts the
// (id, name, role) triple this module resolves from a session token; the
// core performs no verification of its own.

use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::auth::token::{generate_token_default, hash_token};
use crate::domain::lead::Role;
use crate::errors::ServerError;

const SESSION_TTL_SECS: i64 = 60 * 60 * 24 * 7; // 7 days

/// The acting identity attached to every core call.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub id: i64,
    pub name: String,
    pub role: Role,
}

impl AuthedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Issue a session for a user; returns the raw token (only the hash is
/// stored).
pub fn create_session(conn: &Connection, user_id: i64, now: i64) -> Result<String, ServerError> {
    let raw_token = generate_token_default();
    let hash = hash_token(&raw_token);
    let expires_at = now + SESSION_TTL_SECS;

    conn.execute(
        r#"
        insert into sessions (user_id, token_hash, created_at, expires_at)
        values (?, ?, ?, ?)
        "#,
        params![user_id, hash.as_slice(), now, expires_at],
    )
    .map_err(|e| ServerError::DbError(format!("create session failed: {e}")))?;

    Ok(raw_token)
}

/// Resolve a raw session token to the acting user, or None when the token
/// is unknown, expired, or revoked.
pub fn load_user_from_session(
    conn: &Connection,
    raw_token: &str,
    now: i64,
) -> Result<Option<AuthedUser>, ServerError> {
    let hash = Sha256::digest(raw_token.as_bytes());

    let row: Option<(i64, String, String)> = conn
        .query_row(
            r#"
            select u.id, u.name, u.role
            from sessions s
            join users u on u.id = s.user_id
            where s.token_hash = ?
              and s.expires_at > ?
              and s.revoked_at is null
            "#,
            params![hash.as_slice(), now],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()
        .map_err(|e| ServerError::DbError(format!("session lookup failed: {e}")))?;

    match row {
        Some((id, name, role)) => Ok(Some(AuthedUser {
            id,
            name,
            role: Role::parse(&role)?,
        })),
        None => Ok(None),
    }
}
