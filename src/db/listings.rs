// src/db/listings.rs
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::ServerError;

pub struct NewListing {
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: String,
    /// 'sale' or 'rental'.
    pub price_type: String,
    pub created_by: i64,
}

/// Read-only snapshot of a listing, resolved through a lead's weak
/// reference. Absence means the listing was deleted; lead reads degrade
/// to "listing unavailable" instead of failing.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSnapshot {
    pub id: i64,
    pub title: String,
    pub location: String,
    pub price: String,
    pub price_type: String,
}

pub fn create_listing(conn: &Connection, input: &NewListing, now: i64) -> Result<i64, ServerError> {
    conn.execute(
        r#"
        insert into listings (title, description, location, price, price_type, created_by, created_at)
        values (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            input.title,
            input.description,
            input.location,
            input.price,
            input.price_type,
            input.created_by,
            now
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert listing failed: {e}")))?;

    Ok(conn.last_insert_rowid())
}

pub fn get_listing_snapshot(
    conn: &Connection,
    listing_id: i64,
) -> Result<Option<ListingSnapshot>, ServerError> {
    conn.query_row(
        "select id, title, location, price, price_type from listings where id = ?",
        params![listing_id],
        |r| {
            Ok(ListingSnapshot {
                id: r.get(0)?,
                title: r.get(1)?,
                location: r.get(2)?,
                price: r.get(3)?,
                price_type: r.get(4)?,
            })
        },
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select listing failed: {e}")))
}

pub fn delete_listing(conn: &Connection, listing_id: i64) -> Result<(), ServerError> {
    conn.execute("delete from listings where id = ?", params![listing_id])
        .map_err(|e| ServerError::DbError(format!("delete listing failed: {e}")))?;
    Ok(())
}
