// src/db/leads.rs
use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use time::OffsetDateTime;

use crate::db::listings::ListingSnapshot;
use crate::domain::lead::{ChatMessage, ChatRole, ClientInfo, DealType, LeadStatus};
use crate::errors::ServerError;

const SQL_LEAD_STATS: &str = include_str!("../../sql/lead_stats.sql");

pub struct NewLead {
    pub listing_id: Option<i64>,
    pub client: ClientInfo,
    pub deal_type: DealType,
    pub created_by: i64,
    pub messages: Vec<ChatMessage>,
    pub notes: Option<String>,
}

#[derive(Debug)]
pub struct LeadRow {
    pub id: i64,
    pub listing_id: Option<i64>,
    /// Resolved weak reference; `None` when the listing has been deleted.
    pub listing: Option<ListingSnapshot>,
    pub client: ClientInfo,
    pub deal_type: DealType,
    pub status: LeadStatus,
    pub created_by: i64,
    pub notes: Option<String>,
    pub created_at: i64,
    pub closed_at: Option<i64>,
}

#[derive(Debug)]
pub struct MessageRow {
    pub seq: i64,
    pub role: ChatRole,
    pub sender_name: Option<String>,
    pub body: String,
    pub created_at: i64,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub deal_type: Option<DealType>,
    /// Scope to one owner (non-admin callers see only their own leads).
    pub created_by: Option<i64>,
}

#[derive(Debug)]
pub struct LeadStats {
    pub total: i64,
    pub by_status: Vec<(LeadStatus, i64)>,
    pub by_deal_type: Vec<(DealType, i64)>,
    pub closed_this_month: i64,
}

/// Insert the lead and its conversation snapshot in one transaction.
/// Message order is fixed by `seq`, assigned from insertion order here and
/// never reassigned.
pub fn create_lead(conn: &mut Connection, input: &NewLead, now: i64) -> Result<i64, ServerError> {
    let tx = conn
        .transaction()
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    tx.execute(
        r#"
        insert into leads (
            listing_id,
            client_name, client_address, client_contact, client_email, client_whatsapp,
            deal_type, status, created_by, notes, created_at
        ) values (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'new', ?8, ?9, ?10)
        "#,
        params![
            input.listing_id,
            input.client.name,
            input.client.address,
            input.client.contact,
            input.client.email,
            input.client.whatsapp_number,
            input.deal_type.as_str(),
            input.created_by,
            input.notes,
            now
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert lead failed: {e}")))?;

    let lead_id = tx.last_insert_rowid();

    for (i, msg) in input.messages.iter().enumerate() {
        tx.execute(
            r#"
            insert into lead_messages (lead_id, seq, role, sender_name, body, created_at)
            values (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                lead_id,
                (i + 1) as i64,
                msg.role.as_str(),
                msg.sender_name,
                msg.text,
                now
            ],
        )
        .map_err(|e| ServerError::DbError(format!("insert lead message failed: {e}")))?;
    }

    tx.commit()
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    Ok(lead_id)
}

const LEAD_SELECT: &str = r#"
select
    l.id,              -- 0
    l.listing_id,      -- 1
    l.client_name,     -- 2
    l.client_address,  -- 3
    l.client_contact,  -- 4
    l.client_email,    -- 5
    l.client_whatsapp, -- 6
    l.deal_type,       -- 7
    l.status,          -- 8
    l.created_by,      -- 9
    l.notes,           -- 10
    l.created_at,      -- 11
    li.title,          -- 12
    li.location,       -- 13
    li.price,          -- 14
    li.price_type,     -- 15
    l.closed_at        -- 16
from leads l
left join listings li on li.id = l.listing_id
"#;

fn finish_lead(row: &rusqlite::Row<'_>) -> Result<LeadRow, ServerError> {
    let db_err = |e: rusqlite::Error| ServerError::DbError(e.to_string());

    let listing_id: Option<i64> = row.get(1).map_err(db_err)?;
    let deal_type: String = row.get(7).map_err(db_err)?;
    let status: String = row.get(8).map_err(db_err)?;

    // A dangling weak reference joins to nothing; the snapshot is simply
    // absent and readers degrade to "listing unavailable".
    let listing_title: Option<String> = row.get(12).map_err(db_err)?;
    let listing = match (listing_id, listing_title) {
        (Some(id), Some(title)) => Some(ListingSnapshot {
            id,
            title,
            location: row.get(13).map_err(db_err)?,
            price: row.get(14).map_err(db_err)?,
            price_type: row.get(15).map_err(db_err)?,
        }),
        _ => None,
    };

    Ok(LeadRow {
        id: row.get(0).map_err(db_err)?,
        listing_id,
        listing,
        client: ClientInfo {
            name: row.get(2).map_err(db_err)?,
            address: row.get(3).map_err(db_err)?,
            contact: row.get(4).map_err(db_err)?,
            email: row.get(5).map_err(db_err)?,
            whatsapp_number: row.get(6).map_err(db_err)?,
        },
        deal_type: DealType::parse(&deal_type)?,
        status: LeadStatus::parse(&status)?,
        created_by: row.get(9).map_err(db_err)?,
        notes: row.get(10).map_err(db_err)?,
        created_at: row.get(11).map_err(db_err)?,
        closed_at: row.get(16).map_err(db_err)?,
    })
}

pub fn get_lead(conn: &Connection, lead_id: i64) -> Result<Option<LeadRow>, ServerError> {
    let sql = format!("{LEAD_SELECT} where l.id = ?");
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut rows = stmt
        .query(params![lead_id])
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    match rows
        .next()
        .map_err(|e| ServerError::DbError(e.to_string()))?
    {
        Some(row) => Ok(Some(finish_lead(row)?)),
        None => Ok(None),
    }
}

pub fn list_leads(conn: &Connection, filter: &LeadFilter) -> Result<Vec<LeadRow>, ServerError> {
    let mut where_extra = String::new();
    let mut bind: Vec<&dyn ToSql> = Vec::new();

    let status_s;
    if let Some(status) = filter.status {
        status_s = status.as_str();
        where_extra.push_str(" and l.status = ?");
        bind.push(&status_s);
    }

    let deal_s;
    if let Some(deal_type) = filter.deal_type {
        deal_s = deal_type.as_str();
        where_extra.push_str(" and l.deal_type = ?");
        bind.push(&deal_s);
    }

    let owner;
    if let Some(created_by) = filter.created_by {
        owner = created_by;
        where_extra.push_str(" and l.created_by = ?");
        bind.push(&owner);
    }

    let sql = format!(
        "{LEAD_SELECT} where 1=1 {where_extra} order by l.created_at desc, l.id desc"
    );

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut rows = stmt
        .query(params_from_iter(bind))
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut out = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|e| ServerError::DbError(e.to_string()))?
    {
        out.push(finish_lead(row)?);
    }
    Ok(out)
}

/// The conversation snapshot, in insertion order.
pub fn get_conversation(conn: &Connection, lead_id: i64) -> Result<Vec<MessageRow>, ServerError> {
    let mut stmt = conn
        .prepare(
            r#"
            select seq, role, sender_name, body, created_at
            from lead_messages
            where lead_id = ?
            order by seq
            "#,
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![lead_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut out = Vec::new();
    for r in rows {
        let (seq, role, sender_name, body, created_at) =
            r.map_err(|e| ServerError::DbError(e.to_string()))?;
        out.push(MessageRow {
            seq,
            role: ChatRole::parse(&role)?,
            sender_name,
            body,
            created_at,
        });
    }
    Ok(out)
}

pub fn update_notes(
    conn: &Connection,
    lead_id: i64,
    notes: Option<&str>,
) -> Result<(), ServerError> {
    let changed = conn
        .execute(
            "update leads set notes = ? where id = ?",
            params![notes, lead_id],
        )
        .map_err(|e| ServerError::DbError(format!("update notes failed: {e}")))?;

    if changed == 0 {
        return Err(ServerError::NotFound);
    }
    Ok(())
}

pub fn delete_lead(conn: &Connection, lead_id: i64) -> Result<(), ServerError> {
    let changed = conn
        .execute("delete from leads where id = ?", params![lead_id])
        .map_err(|e| ServerError::DbError(format!("delete lead failed: {e}")))?;

    if changed == 0 {
        return Err(ServerError::NotFound);
    }
    // The conversation goes with the lead.
    conn.execute(
        "delete from lead_messages where lead_id = ?",
        params![lead_id],
    )
    .map_err(|e| ServerError::DbError(format!("delete lead messages failed: {e}")))?;
    Ok(())
}

/// Optimistic status write: only succeeds if the lead is still in
/// `expected`. Entering `closed` stamps `closed_at` in the same statement;
/// no other status ever touches it. A zero-row update means either the
/// lead vanished (`NotFound`) or someone transitioned it first
/// (`StaleState`); the caller re-reads and retries.
pub fn transition_status(
    conn: &Connection,
    lead_id: i64,
    expected: LeadStatus,
    to: LeadStatus,
    now: i64,
) -> Result<(), ServerError> {
    let changed = conn
        .execute(
            r#"
            update leads
            set status = ?1,
                closed_at = case when ?1 = 'closed' then ?2 else closed_at end
            where id = ?3 and status = ?4
            "#,
            params![to.as_str(), now, lead_id, expected.as_str()],
        )
        .map_err(|e| ServerError::DbError(format!("transition failed: {e}")))?;

    if changed == 1 {
        return Ok(());
    }

    let exists: Option<i64> = conn
        .query_row("select id from leads where id = ?", params![lead_id], |r| {
            r.get(0)
        })
        .optional()
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    match exists {
        None => Err(ServerError::NotFound),
        Some(_) => Err(ServerError::StaleState),
    }
}

fn start_of_month(now: i64) -> i64 {
    let dt = OffsetDateTime::from_unix_timestamp(now).unwrap_or_else(|_| OffsetDateTime::now_utc());
    dt.replace_day(1)
        .unwrap_or(dt) // day 1 is valid for every month
        .replace_time(time::Time::MIDNIGHT)
        .unix_timestamp()
}

/// Counts grouped by status and deal type, plus deals closed in the
/// current calendar month (UTC). Owner scope optional.
pub fn lead_stats(
    conn: &Connection,
    owner: Option<i64>,
    now: i64,
) -> Result<LeadStats, ServerError> {
    let mut stmt = conn
        .prepare(SQL_LEAD_STATS)
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![owner], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut total = 0;
    let mut by_status: Vec<(LeadStatus, i64)> = Vec::new();
    let mut by_deal_type: Vec<(DealType, i64)> = Vec::new();

    for r in rows {
        let (status, deal_type, n) = r.map_err(|e| ServerError::DbError(e.to_string()))?;
        let status = LeadStatus::parse(&status)?;
        let deal_type = DealType::parse(&deal_type)?;
        total += n;

        match by_status.iter_mut().find(|(s, _)| *s == status) {
            Some((_, count)) => *count += n,
            None => by_status.push((status, n)),
        }
        match by_deal_type.iter_mut().find(|(d, _)| *d == deal_type) {
            Some((_, count)) => *count += n,
            None => by_deal_type.push((deal_type, n)),
        }
    }

    let closed_this_month: i64 = conn
        .query_row(
            r#"
            select count(*)
            from leads
            where status = 'closed'
              and closed_at >= ?1
              and (?2 is null or created_by = ?2)
            "#,
            params![start_of_month(now), owner],
            |r| r.get(0),
        )
        .map_err(|e| ServerError::DbError(format!("count closed failed: {e}")))?;

    Ok(LeadStats {
        total,
        by_status,
        by_deal_type,
        closed_this_month,
    })
}
