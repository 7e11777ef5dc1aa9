// src/leads/transitions.rs
//
// Applying lifecycle transitions to stored leads: ownership policy, the
// pure edge check, the optimistic write, then side effects.

use crate::auth::AuthedUser;
use crate::db::connection::Database;
use crate::db::leads::{self, LeadRow};
use crate::db::notifications::NotificationMeta;
use crate::domain::lead::LeadStatus;
use crate::domain::lifecycle;
use crate::errors::ServerError;
use crate::notify::{broadcast, FanoutConfig, NotificationDraft, Recipients};

/// Only the owning user or an Admin may mutate a lead.
fn ensure_can_mutate(lead: &LeadRow, acting: &AuthedUser) -> Result<(), ServerError> {
    if lead.created_by == acting.id || acting.is_admin() {
        Ok(())
    } else {
        Err(ServerError::Forbidden)
    }
}

fn notify_owner(
    db: &Database,
    cfg: &FanoutConfig,
    lead: &LeadRow,
    acting: &AuthedUser,
    kind: &str,
    title: &str,
    message: String,
    now: i64,
) {
    let meta = NotificationMeta {
        lead_id: Some(lead.id),
        property_id: lead.listing_id,
        deal_type: Some(lead.deal_type),
        client_name: Some(lead.client.name.clone()),
    };

    let result = broadcast(
        db,
        cfg,
        Recipients::User(lead.created_by),
        Some(acting.id),
        |_recipient| {
            Ok(NotificationDraft {
                kind: kind.to_string(),
                title: title.to_string(),
                message: message.clone(),
                metadata: Some(meta.clone()),
            })
        },
        now,
    );

    // Best-effort: the transition already committed and stays committed.
    match result {
        Ok(report) if report.failed_user_ids.is_empty() => {}
        Ok(report) => eprintln!(
            "lead {}: {kind} notification failed for {:?}",
            lead.id, report.failed_user_ids
        ),
        Err(e) => eprintln!("lead {}: {kind} notification error: {e}", lead.id),
    }
}

/// Move a lead along a lifecycle edge.
///
/// Failure modes: `NotFound` (no such lead), `Forbidden` (not owner or
/// admin), `InvalidTransition` (edge not in the table; lead untouched),
/// `StaleState` (someone else transitioned first; re-read and retry).
///
/// Entering `closed` stamps `closed_at` and notifies the owner with a
/// `lead_captured` record; entering `lost` notifies only when the fan-out
/// config says so.
pub fn change_status(
    db: &Database,
    cfg: &FanoutConfig,
    lead_id: i64,
    to: LeadStatus,
    acting: &AuthedUser,
    now: i64,
) -> Result<LeadRow, ServerError> {
    let lead = db
        .with_conn(|conn| leads::get_lead(conn, lead_id))?
        .ok_or(ServerError::NotFound)?;

    ensure_can_mutate(&lead, acting)?;
    lifecycle::check_transition(lead.status, to)?;

    db.with_conn(|conn| leads::transition_status(conn, lead_id, lead.status, to, now))?;

    match to {
        LeadStatus::Closed => {
            let message = format!(
                "Deal with {} closed ({})",
                lead.client.name,
                lead.deal_type.as_str()
            );
            notify_owner(db, cfg, &lead, acting, "lead_captured", "Deal closed", message, now);
        }
        LeadStatus::Lost if cfg.notify_on_lost => {
            let message = format!("Lead with {} was marked lost", lead.client.name);
            notify_owner(db, cfg, &lead, acting, "lead_lost", "Lead lost", message, now);
        }
        _ => {}
    }

    db.with_conn(|conn| leads::get_lead(conn, lead_id))?
        .ok_or(ServerError::NotFound)
}

/// Update the free-text notes. Notes stay editable even after a terminal
/// status — they exist for audit annotations — while status, client
/// snapshot and conversation are frozen by the lifecycle rules.
pub fn edit_notes(
    db: &Database,
    lead_id: i64,
    notes: Option<&str>,
    acting: &AuthedUser,
) -> Result<(), ServerError> {
    let lead = db
        .with_conn(|conn| leads::get_lead(conn, lead_id))?
        .ok_or(ServerError::NotFound)?;
    ensure_can_mutate(&lead, acting)?;

    db.with_conn(|conn| leads::update_notes(conn, lead_id, notes))
}

/// Hard delete, as an explicit owner/admin business action. Automation
/// never calls this.
pub fn remove_lead(db: &Database, lead_id: i64, acting: &AuthedUser) -> Result<(), ServerError> {
    let lead = db
        .with_conn(|conn| leads::get_lead(conn, lead_id))?
        .ok_or(ServerError::NotFound)?;
    ensure_can_mutate(&lead, acting)?;

    db.with_conn(|conn| leads::delete_lead(conn, lead_id))
}
