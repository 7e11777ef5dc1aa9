// src/db/notifications.rs
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::domain::lead::DealType;
use crate::errors::ServerError;

/// Structured payload for UI deep-linking. A weak back-reference only —
/// the referenced lead/listing may be gone by the time it is followed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_type: Option<DealType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: i64,
    /// Tag: 'announcement', 'lead_captured', 'purchase_inquiry',
    /// 'rental_inquiry', 'viewing_booked', 'property_boosted', ...
    pub kind: String,
    pub title: String,
    pub message: String,
    pub metadata: Option<NotificationMeta>,
}

#[derive(Debug)]
pub struct NotificationRow {
    pub id: i64,
    pub user_id: i64,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub metadata: Option<NotificationMeta>,
    pub created_at: i64,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub created: usize,
    /// Recipient ids whose insert did not land (e.g. the user row vanished
    /// between resolution and insert).
    pub failed_user_ids: Vec<i64>,
}

fn meta_to_json(meta: &Option<NotificationMeta>) -> Result<Option<String>, ServerError> {
    match meta {
        Some(m) => serde_json::to_string(m)
            .map(Some)
            .map_err(|e| ServerError::DbError(format!("encode metadata failed: {e}"))),
        None => Ok(None),
    }
}

fn meta_from_json(raw: Option<String>) -> Option<NotificationMeta> {
    // Unreadable stored metadata degrades to None rather than failing the
    // whole listing; it is a UI hint, not data of record.
    raw.and_then(|s| serde_json::from_str(&s).ok())
}

pub fn create_notification(
    conn: &Connection,
    input: &NewNotification,
    now: i64,
) -> Result<i64, ServerError> {
    conn.execute(
        r#"
        insert into notifications (user_id, kind, title, message, read, metadata, created_at)
        values (?1, ?2, ?3, ?4, 0, ?5, ?6)
        "#,
        params![
            input.user_id,
            input.kind,
            input.title,
            input.message,
            meta_to_json(&input.metadata)?,
            now
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert notification failed: {e}")))?;

    Ok(conn.last_insert_rowid())
}

/// Bulk insert in one transaction, isolating per-row failures: each insert
/// is guarded on the recipient still existing, so one bad recipient skips
/// that row and the rest of the batch lands. Failed ids are reported so the
/// caller can re-issue selectively.
pub fn insert_batch(
    conn: &mut Connection,
    batch: &[NewNotification],
    now: i64,
) -> Result<BatchOutcome, ServerError> {
    let tx = conn
        .transaction()
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut outcome = BatchOutcome::default();

    for n in batch {
        let metadata = meta_to_json(&n.metadata)?;
        let inserted = tx
            .execute(
                r#"
                insert into notifications (user_id, kind, title, message, read, metadata, created_at)
                select ?1, ?2, ?3, ?4, 0, ?5, ?6
                where exists (select 1 from users where id = ?1)
                "#,
                params![n.user_id, n.kind, n.title, n.message, metadata, now],
            )
            .map_err(|e| ServerError::DbError(format!("batch insert failed: {e}")))?;

        if inserted == 1 {
            outcome.created += 1;
        } else {
            outcome.failed_user_ids.push(n.user_id);
        }
    }

    tx.commit()
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    Ok(outcome)
}

/// Unread badge count. An indexed count over (user_id, read) — derived and
/// recomputable, so it stays correct across multiple server instances.
pub fn unread_count(conn: &Connection, user_id: i64) -> Result<i64, ServerError> {
    conn.query_row(
        "select count(*) from notifications where user_id = ? and read = 0",
        params![user_id],
        |r| r.get(0),
    )
    .map_err(|e| ServerError::DbError(format!("unread count failed: {e}")))
}

/// Mark one notification read. Only the recipient may do this; the flag
/// moves false -> true exactly once and re-marking is a silent success.
pub fn mark_as_read(
    conn: &Connection,
    notification_id: i64,
    acting_user_id: i64,
) -> Result<(), ServerError> {
    let row: Option<i64> = conn
        .query_row(
            "select user_id from notifications where id = ?",
            params![notification_id],
            |r| r.get(0),
        )
        .optional()
        .map_err(|e| ServerError::DbError(format!("select notification failed: {e}")))?;

    let recipient = row.ok_or(ServerError::NotFound)?;
    if recipient != acting_user_id {
        return Err(ServerError::Forbidden);
    }

    conn.execute(
        "update notifications set read = 1 where id = ?",
        params![notification_id],
    )
    .map_err(|e| ServerError::DbError(format!("mark read failed: {e}")))?;

    Ok(())
}

/// Newest first. `page` is 1-based; `page_size` is clamped to 1..=100 so a
/// bad caller cannot turn this into an unbounded scan.
pub fn list_notifications(
    conn: &Connection,
    user_id: i64,
    page: u32,
    page_size: u32,
) -> Result<Vec<NotificationRow>, ServerError> {
    let page = page.max(1);
    let page_size = page_size.clamp(1, 100);
    let offset = (page - 1) as i64 * page_size as i64;

    let mut stmt = conn
        .prepare(
            r#"
            select id, user_id, kind, title, message, read, metadata, created_at
            from notifications
            where user_id = ?1
            order by created_at desc, id desc
            limit ?2 offset ?3
            "#,
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![user_id, page_size as i64, offset], |row| {
            Ok(NotificationRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                kind: row.get(2)?,
                title: row.get(3)?,
                message: row.get(4)?,
                read: row.get::<_, i64>(5)? != 0,
                metadata: meta_from_json(row.get(6)?),
                created_at: row.get(7)?,
            })
        })
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}
