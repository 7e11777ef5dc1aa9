// src/leads/capture.rs
//
// Conversation events come in from the chat transport; this is where they
// either become a lead or get dropped. The classifier decides, the store
// records, and the owner gets exactly one notification per captured lead.

use serde::Deserialize;

use crate::auth::AuthedUser;
use crate::db::connection::Database;
use crate::db::leads::{create_lead, NewLead};
use crate::db::listings::get_listing_snapshot;
use crate::db::notifications::NotificationMeta;
use crate::domain::classifier::{classify_conversation, ClassifierConfig};
use crate::domain::lead::{ChatMessage, ClientInfo, DealType};
use crate::errors::ServerError;
use crate::notify::{broadcast, FanoutConfig, NotificationDraft, Recipients};

/// A finished (or checkpointed) conversation handed over by the chat layer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEvent {
    #[serde(default)]
    pub listing_id: Option<i64>,
    pub client: ClientInfo,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CaptureOutcome {
    Captured { lead_id: i64 },
    /// The classifier saw no concrete deal signal. Valid outcome, not an
    /// error.
    Rejected,
}

/// Notification kind for a freshly captured lead, keyed by deal type.
fn inquiry_kind(deal_type: DealType) -> (&'static str, &'static str) {
    match deal_type {
        DealType::Purchase => ("purchase_inquiry", "New purchase inquiry"),
        DealType::Rental => ("rental_inquiry", "New rental inquiry"),
        DealType::Viewing => ("viewing_booked", "New viewing request"),
    }
}

/// Classify a conversation and, on a concrete deal signal, persist the
/// lead with its conversation snapshot and notify the owning user.
///
/// The notification is best-effort: a fan-out problem is logged and never
/// rolls the lead back — lead state is authoritative.
pub fn capture_from_conversation(
    db: &Database,
    classifier_cfg: &ClassifierConfig,
    fanout_cfg: &FanoutConfig,
    event: &ConversationEvent,
    owner: &AuthedUser,
    now: i64,
) -> Result<CaptureOutcome, ServerError> {
    let Some(draft) = classify_conversation(classifier_cfg, &event.messages) else {
        return Ok(CaptureOutcome::Rejected);
    };

    let (lead_id, listing_title) = db.with_conn(|conn| {
        let title = match event.listing_id {
            Some(id) => get_listing_snapshot(conn, id)?.map(|s| s.title),
            None => None,
        };
        let lead_id = create_lead(
            conn,
            &NewLead {
                listing_id: event.listing_id,
                client: event.client.clone(),
                deal_type: draft.deal_type,
                created_by: owner.id,
                messages: event.messages.clone(),
                notes: event.notes.clone(),
            },
            now,
        )?;
        Ok((lead_id, title))
    })?;

    let (kind, title) = inquiry_kind(draft.deal_type);
    let client_name = event.client.name.clone();
    let property = listing_title.unwrap_or_else(|| "a listing".to_string());
    let listing_id = event.listing_id;

    let fanout = broadcast(
        db,
        fanout_cfg,
        Recipients::User(owner.id),
        Some(owner.id), // explicit self-notification
        |_recipient| {
            Ok(NotificationDraft {
                kind: kind.to_string(),
                title: title.to_string(),
                message: format!("{client_name} is interested in {property}"),
                metadata: Some(NotificationMeta {
                    lead_id: Some(lead_id),
                    property_id: listing_id,
                    deal_type: Some(draft.deal_type),
                    client_name: Some(client_name.clone()),
                }),
            })
        },
        now,
    );

    match fanout {
        Ok(report) if report.failed_user_ids.is_empty() => {}
        Ok(report) => eprintln!(
            "lead {lead_id}: capture notification failed for {:?}",
            report.failed_user_ids
        ),
        Err(e) => eprintln!("lead {lead_id}: capture notification error: {e}"),
    }

    Ok(CaptureOutcome::Captured { lead_id })
}
