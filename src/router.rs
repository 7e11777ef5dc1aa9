use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use astra::Request;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::auth::sessions::load_user_from_session;
use crate::auth::AuthedUser;
use crate::automation::{self, TaskId};
use crate::db::leads::{self, LeadFilter, LeadRow, LeadStats};
use crate::db::notifications;
use crate::db::Database;
use crate::domain::classifier::ClassifierConfig;
use crate::domain::lead::{DealType, LeadStatus, Role};
use crate::errors::ServerError;
use crate::leads::capture::{capture_from_conversation, CaptureOutcome, ConversationEvent};
use crate::leads::transitions;
use crate::notify::{broadcast, FanoutConfig, NotificationDraft, Recipients};
use crate::responses::{
    html_response, json_created, json_error_response, json_response, ResultResp,
};
use crate::spreadsheets::export_leads_xlsx;
use crate::templates;
use crate::templates::pages::DashboardVm;

pub fn handle(req: Request, db: &Database) -> ResultResp {
    let is_api = req.uri().path().starts_with("/api/");

    match route(req, db) {
        Ok(resp) => Ok(resp),
        // API consumers get structured JSON errors; pages fall through to
        // the HTML error renderer in main.
        Err(err) if is_api => Ok(json_error_response(err)),
        Err(err) => Err(err),
    }
}

fn route(mut req: Request, db: &Database) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let now = now_unix();

    match (method.as_str(), path.as_str()) {
        ("GET", "/") => html_response(templates::pages::home_page()),
        ("GET", "/dashboard") => dashboard(&req, db, now),

        ("POST", "/api/conversations") => post_conversation(&mut req, db, now),

        ("GET", "/api/leads") => list_leads(&req, db),
        ("GET", "/api/leads/stats") => lead_stats(&req, db, now),
        ("GET", "/api/leads/export.xlsx") => export_leads(&req, db, now),

        ("GET", "/api/notifications") => list_notifications(&req, db, now),
        ("GET", "/api/notifications/unread-count") => unread_count(&req, db, now),

        ("POST", "/api/announcements") => post_announcement(&mut req, db, now),
        ("POST", "/api/automation/execute") => post_automation(&mut req, db, now),

        _ => {
            if let Some(rest) = path.strip_prefix("/api/leads/") {
                let lead_id = parse_id(rest)?;
                return match method.as_str() {
                    "GET" => get_lead(&req, db, lead_id, now),
                    "PUT" => put_lead(&mut req, db, lead_id, now),
                    "DELETE" => delete_lead(&req, db, lead_id, now),
                    _ => Err(ServerError::NotFound),
                };
            }
            if method == "PATCH" {
                if let Some(rest) = path.strip_prefix("/api/notifications/") {
                    if let Some(raw_id) = rest.strip_suffix("/read") {
                        let id = parse_id(raw_id)?;
                        return mark_read(&req, db, id, now);
                    }
                }
            }
            Err(ServerError::NotFound)
        }
    }
}

// ---- identity -------------------------------------------------------------

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Session token from `Authorization: Bearer ...` or a `session` cookie.
fn session_token(req: &Request) -> Option<String> {
    if let Some(value) = req.headers().get("Authorization").and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Some(token.trim().to_string());
        }
    }

    let cookies = req.headers().get("Cookie").and_then(|v| v.to_str().ok())?;
    for pair in cookies.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        if let (Some("session"), Some(v)) = (parts.next(), parts.next()) {
            return Some(v.to_string());
        }
    }
    None
}

fn require_user(req: &Request, db: &Database, now: i64) -> Result<AuthedUser, ServerError> {
    let token = session_token(req)
        .ok_or_else(|| ServerError::Unauthorized("missing session token".into()))?;

    db.with_conn(|conn| load_user_from_session(conn, &token, now))?
        .ok_or_else(|| ServerError::Unauthorized("invalid or expired session".into()))
}

// ---- request plumbing -----------------------------------------------------

fn read_json<T: DeserializeOwned>(req: &mut Request) -> Result<T, ServerError> {
    serde_json::from_reader(req.body_mut().reader())
        .map_err(|e| ServerError::BadRequest(format!("invalid JSON body: {e}")))
}

fn parse_id(raw: &str) -> Result<i64, ServerError> {
    raw.parse()
        .map_err(|_| ServerError::BadRequest(format!("invalid id: {raw}")))
}

fn parse_query(req: &Request) -> HashMap<String, String> {
    let mut map = HashMap::new();

    if let Some(q) = req.uri().query() {
        for pair in q.split('&') {
            let mut parts = pair.splitn(2, '=');
            if let (Some(k), Some(v)) = (parts.next(), parts.next()) {
                map.insert(k.to_string(), v.to_string());
            }
        }
    }

    map
}

fn fanout_config() -> FanoutConfig {
    FanoutConfig {
        notify_on_lost: std::env::var("ESTATEHUB_NOTIFY_ON_LOST").is_ok(),
        ..Default::default()
    }
}

/// Admins see everything; everyone else is scoped to their own leads.
fn owner_scope(user: &AuthedUser) -> Option<i64> {
    if user.is_admin() {
        None
    } else {
        Some(user.id)
    }
}

// ---- JSON views -----------------------------------------------------------

fn lead_to_json(lead: &LeadRow) -> Value {
    json!({
        "id": lead.id,
        "listingId": lead.listing_id,
        "listing": lead.listing,
        "client": lead.client,
        "dealType": lead.deal_type,
        "status": lead.status,
        "createdBy": lead.created_by,
        "notes": lead.notes,
        "createdAt": lead.created_at,
        "closedAt": lead.closed_at,
    })
}

fn stats_to_json(stats: &LeadStats) -> Value {
    let mut by_status = Map::new();
    for (status, n) in &stats.by_status {
        by_status.insert(status.as_str().to_string(), json!(n));
    }
    let mut by_deal_type = Map::new();
    for (deal_type, n) in &stats.by_deal_type {
        by_deal_type.insert(deal_type.as_str().to_string(), json!(n));
    }

    json!({
        "total": stats.total,
        "byStatus": by_status,
        "byDealType": by_deal_type,
        "closedThisMonth": stats.closed_this_month,
    })
}

// ---- pages ----------------------------------------------------------------

fn dashboard(req: &Request, db: &Database, now: i64) -> ResultResp {
    let user = require_user(req, db, now)?;
    let scope = owner_scope(&user);

    let (stats, unread, mut recent) = db.with_conn(|conn| {
        let stats = leads::lead_stats(conn, scope, now)?;
        let unread = notifications::unread_count(conn, user.id)?;
        let recent = leads::list_leads(
            conn,
            &LeadFilter {
                created_by: scope,
                ..Default::default()
            },
        )?;
        Ok((stats, unread, recent))
    })?;
    recent.truncate(10);

    let vm = DashboardVm {
        name: user.name.clone(),
        role: user.role.as_str().to_string(),
        is_admin: user.is_admin(),
        stats,
        unread_count: unread,
        tasks: automation::tasks_for_role(user.role),
        recent_leads: recent,
        now,
    };
    html_response(templates::pages::dashboard_page(&vm))
}

// ---- conversations --------------------------------------------------------

fn post_conversation(req: &mut Request, db: &Database, now: i64) -> ResultResp {
    let user = require_user(req, db, now)?;
    let event: ConversationEvent = read_json(req)?;

    let outcome = capture_from_conversation(
        db,
        &ClassifierConfig::default(),
        &fanout_config(),
        &event,
        &user,
        now,
    )?;

    match outcome {
        CaptureOutcome::Captured { lead_id } => {
            let lead = db
                .with_conn(|conn| leads::get_lead(conn, lead_id))?
                .ok_or(ServerError::InternalError)?;
            json_created(&json!({ "captured": true, "lead": lead_to_json(&lead) }))
        }
        CaptureOutcome::Rejected => json_response(&json!({ "captured": false })),
    }
}

// ---- leads ----------------------------------------------------------------

fn list_leads(req: &Request, db: &Database) -> ResultResp {
    let now = now_unix();
    let user = require_user(req, db, now)?;
    let params = parse_query(req);

    let mut filter = LeadFilter {
        created_by: owner_scope(&user),
        ..Default::default()
    };
    if let Some(status) = params.get("status") {
        filter.status = Some(LeadStatus::parse(status)?);
    }
    if let Some(deal_type) = params.get("dealType") {
        filter.deal_type = Some(DealType::parse(deal_type)?);
    }

    let rows = db.with_conn(|conn| leads::list_leads(conn, &filter))?;
    let data: Vec<Value> = rows.iter().map(lead_to_json).collect();
    json_response(&json!({ "count": data.len(), "data": data }))
}

fn lead_stats(req: &Request, db: &Database, now: i64) -> ResultResp {
    let user = require_user(req, db, now)?;
    let stats = db.with_conn(|conn| leads::lead_stats(conn, owner_scope(&user), now))?;
    json_response(&stats_to_json(&stats))
}

fn export_leads(req: &Request, db: &Database, now: i64) -> ResultResp {
    let user = require_user(req, db, now)?;
    let rows = db.with_conn(|conn| {
        leads::list_leads(
            conn,
            &LeadFilter {
                created_by: owner_scope(&user),
                ..Default::default()
            },
        )
    })?;
    export_leads_xlsx(&rows)
}

fn load_owned_lead(
    db: &Database,
    lead_id: i64,
    user: &AuthedUser,
) -> Result<LeadRow, ServerError> {
    let lead = db
        .with_conn(|conn| leads::get_lead(conn, lead_id))?
        .ok_or(ServerError::NotFound)?;
    if lead.created_by != user.id && !user.is_admin() {
        return Err(ServerError::Forbidden);
    }
    Ok(lead)
}

fn get_lead(req: &Request, db: &Database, lead_id: i64, now: i64) -> ResultResp {
    let user = require_user(req, db, now)?;
    let lead = load_owned_lead(db, lead_id, &user)?;

    let messages = db.with_conn(|conn| leads::get_conversation(conn, lead_id))?;
    let conversation: Vec<Value> = messages
        .iter()
        .map(|m| {
            json!({
                "seq": m.seq,
                "role": m.role,
                "senderName": m.sender_name,
                "text": m.body,
                "createdAt": m.created_at,
            })
        })
        .collect();

    let mut body = lead_to_json(&lead);
    body["conversationHistory"] = Value::Array(conversation);
    json_response(&body)
}

#[derive(Debug, Deserialize)]
struct LeadUpdate {
    status: Option<LeadStatus>,
    notes: Option<String>,
}

fn put_lead(req: &mut Request, db: &Database, lead_id: i64, now: i64) -> ResultResp {
    let user = require_user(req, db, now)?;
    let update: LeadUpdate = read_json(req)?;

    if update.status.is_none() && update.notes.is_none() {
        return Err(ServerError::BadRequest(
            "nothing to update: expected status and/or notes".into(),
        ));
    }

    if let Some(notes) = &update.notes {
        transitions::edit_notes(db, lead_id, Some(notes.as_str()), &user)?;
    }
    if let Some(to) = update.status {
        let lead = transitions::change_status(db, &fanout_config(), lead_id, to, &user, now)?;
        return json_response(&lead_to_json(&lead));
    }

    let lead = load_owned_lead(db, lead_id, &user)?;
    json_response(&lead_to_json(&lead))
}

fn delete_lead(req: &Request, db: &Database, lead_id: i64, now: i64) -> ResultResp {
    let user = require_user(req, db, now)?;
    transitions::remove_lead(db, lead_id, &user)?;
    json_response(&json!({ "success": true }))
}

// ---- notifications --------------------------------------------------------

fn list_notifications(req: &Request, db: &Database, now: i64) -> ResultResp {
    let user = require_user(req, db, now)?;
    let params = parse_query(req);

    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let page_size: u32 = params
        .get("pageSize")
        .and_then(|p| p.parse().ok())
        .unwrap_or(20);

    let rows =
        db.with_conn(|conn| notifications::list_notifications(conn, user.id, page, page_size))?;
    let data: Vec<Value> = rows
        .iter()
        .map(|n| {
            json!({
                "id": n.id,
                "type": n.kind,
                "title": n.title,
                "message": n.message,
                "read": n.read,
                "metadata": n.metadata,
                "createdAt": n.created_at,
            })
        })
        .collect();

    json_response(&json!({ "page": page, "count": data.len(), "data": data }))
}

fn unread_count(req: &Request, db: &Database, now: i64) -> ResultResp {
    let user = require_user(req, db, now)?;
    let count = db.with_conn(|conn| notifications::unread_count(conn, user.id))?;
    json_response(&json!({ "count": count }))
}

fn mark_read(req: &Request, db: &Database, notification_id: i64, now: i64) -> ResultResp {
    let user = require_user(req, db, now)?;
    db.with_conn(|conn| notifications::mark_as_read(conn, notification_id, user.id))?;
    json_response(&json!({ "success": true }))
}

// ---- announcements --------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AnnouncementBody {
    message: String,
}

fn post_announcement(req: &mut Request, db: &Database, now: i64) -> ResultResp {
    let user = require_user(req, db, now)?;
    if !user.is_admin() {
        return Err(ServerError::Forbidden);
    }

    let body: AnnouncementBody = read_json(req)?;
    if body.message.trim().is_empty() {
        return Err(ServerError::BadRequest("message is required".into()));
    }

    let message = body.message.trim().to_string();
    let report = broadcast(
        db,
        &fanout_config(),
        Recipients::AllExceptRole(Role::Admin),
        Some(user.id),
        |_recipient| {
            Ok(NotificationDraft {
                kind: "announcement".to_string(),
                title: "Announcement".to_string(),
                message: message.clone(),
                metadata: None,
            })
        },
        now,
    )?
    // Partial delivery is an error here; the failed ids go back to the
    // admin for a selective retry.
    .require_complete()?;

    json_response(&json!({
        "success": true,
        "message": "Announcement sent to all users.",
        "recipients": report.created,
    }))
}

// ---- automation -----------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AutomationBody {
    task_id: String,
    #[serde(default)]
    payload: Value,
}

fn post_automation(req: &mut Request, db: &Database, now: i64) -> ResultResp {
    let user = require_user(req, db, now)?;
    let body: AutomationBody = read_json(req)?;

    let task = TaskId::parse(&body.task_id)?;
    let result = automation::execute(task, user.role, &body.payload)?;

    json_response(&json!({
        "success": result.success,
        "message": result.message,
        "actions": result.actions,
    }))
}
