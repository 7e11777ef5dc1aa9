use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::sessions::create_session;
use crate::db::connection::Database;
use crate::db::users::get_or_create_user;
use crate::domain::lead::Role;
use crate::errors::ServerError;

pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

fn unique_temp_db_path() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("router_test_{nanos}.sqlite"));
    p.to_string_lossy().to_string()
}

/// Initialize a fresh temp-file test DB using the production schema.
pub fn init_test_db() -> Database {
    let db = Database::new(unique_temp_db_path());
    db.with_conn(|conn| {
        conn.execute_batch(include_str!("../../sql/schema.sql"))
            .map_err(|e| ServerError::DbError(e.to_string()))?;
        Ok(())
    })
    .unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    db
}

/// Seed a user with a live session; returns (user_id, session_token).
pub fn seed_session(db: &Database, name: &str, email: &str, role: Role) -> (i64, String) {
    let now = now_unix();
    db.with_conn(|conn| {
        let user_id = get_or_create_user(conn, name, email, role, now)?;
        let token = create_session(conn, user_id, now)?;
        Ok((user_id, token))
    })
    .expect("seeding session failed")
}
