// src/tests/router_tests/leads_tests.rs
use astra::{Body, Request};
use http::{HeaderValue, Method};
use serde_json::json;

use crate::db::connection::Database;
use crate::db::leads::{self, create_lead, LeadFilter, NewLead};
use crate::domain::lead::{ClientInfo, DealType, LeadStatus, Role};
use crate::router::handle;
use crate::tests::utils::{init_test_db, seed_session};

fn request(method: Method, path: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request {
    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };
    let mut req = Request::new(body);
    *req.method_mut() = method;
    *req.uri_mut() = path.parse().unwrap();
    if let Some(token) = token {
        req.headers_mut().insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
    }
    req
}

fn seed_lead(db: &Database, owner: i64, deal_type: DealType) -> i64 {
    db.with_conn(|conn| {
        create_lead(
            conn,
            &NewLead {
                listing_id: None,
                client: ClientInfo {
                    name: "Jane".to_string(),
                    address: String::new(),
                    contact: String::new(),
                    email: "jane@example.com".to_string(),
                    whatsapp_number: String::new(),
                },
                deal_type,
                created_by: owner,
                messages: vec![],
                notes: None,
            },
            100,
        )
    })
    .unwrap()
}

#[test]
fn conversation_with_closure_signal_becomes_a_lead() {
    let db = init_test_db();
    let (agent, token) = seed_session(&db, "Ada", "ada@example.com", Role::Agent);

    let event = json!({
        "client": { "name": "Jane", "email": "jane@example.com" },
        "messages": [
            { "role": "user", "text": "I'll take the rental." },
            { "role": "model", "text": "Congratulations!",
              "metadata": { "dealClosure": true, "dealType": "rental" } }
        ]
    });

    let resp = handle(
        request(Method::POST, "/api/conversations", Some(&token), Some(event)),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 201);

    let rows = db
        .with_conn(|conn| leads::list_leads(conn, &LeadFilter::default()))
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].created_by, agent);
    assert_eq!(rows[0].deal_type, DealType::Rental);
    assert_eq!(rows[0].status, LeadStatus::New);

    // The owner got the capture notification.
    let unread = db
        .with_conn(|conn| crate::db::notifications::unread_count(conn, agent))
        .unwrap();
    assert_eq!(unread, 1);
}

#[test]
fn ambiguous_conversation_is_rejected_without_a_lead() {
    let db = init_test_db();
    let (_agent, token) = seed_session(&db, "Ada", "ada@example.com", Role::Agent);

    let event = json!({
        "client": { "name": "Jane" },
        "messages": [
            { "role": "user", "text": "Maybe later",
              "metadata": { "confidence": 0.5, "dealType": "rental" } }
        ]
    });

    let resp = handle(
        request(Method::POST, "/api/conversations", Some(&token), Some(event)),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 200); // 200, not 201: nothing was created

    let rows = db
        .with_conn(|conn| leads::list_leads(conn, &LeadFilter::default()))
        .unwrap();
    assert!(rows.is_empty());
}

#[test]
fn put_lead_transitions_status_and_rejects_bad_edges() {
    let db = init_test_db();
    let (agent, token) = seed_session(&db, "Ada", "ada@example.com", Role::Agent);
    let id = seed_lead(&db, agent, DealType::Purchase);

    let resp = handle(
        request(
            Method::PUT,
            &format!("/api/leads/{id}"),
            Some(&token),
            Some(json!({ "status": "contacted" })),
        ),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 200);

    let lead = db.with_conn(|conn| leads::get_lead(conn, id)).unwrap().unwrap();
    assert_eq!(lead.status, LeadStatus::Contacted);

    // contacted -> closed is not an edge; the lead must be untouched.
    let resp = handle(
        request(
            Method::PUT,
            &format!("/api/leads/{id}"),
            Some(&token),
            Some(json!({ "status": "closed" })),
        ),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 409);

    let lead = db.with_conn(|conn| leads::get_lead(conn, id)).unwrap().unwrap();
    assert_eq!(lead.status, LeadStatus::Contacted);
    assert!(lead.closed_at.is_none());
}

#[test]
fn leads_are_owner_scoped() {
    let db = init_test_db();
    let (ada, ada_token) = seed_session(&db, "Ada", "ada@example.com", Role::Agent);
    let (_bob, bob_token) = seed_session(&db, "Bob", "bob@example.com", Role::Agent);
    let id = seed_lead(&db, ada, DealType::Viewing);

    // Bob can't read Ada's lead...
    let resp = handle(
        request(Method::GET, &format!("/api/leads/{id}"), Some(&bob_token), None),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 403);

    // ...nor move it.
    let resp = handle(
        request(
            Method::PUT,
            &format!("/api/leads/{id}"),
            Some(&bob_token),
            Some(json!({ "status": "contacted" })),
        ),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 403);

    // Ada reads it fine.
    let resp = handle(
        request(Method::GET, &format!("/api/leads/{id}"), Some(&ada_token), None),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 200);
}

#[test]
fn notes_update_works_and_delete_removes_the_lead() {
    let db = init_test_db();
    let (agent, token) = seed_session(&db, "Ada", "ada@example.com", Role::Agent);
    let id = seed_lead(&db, agent, DealType::Rental);

    let resp = handle(
        request(
            Method::PUT,
            &format!("/api/leads/{id}"),
            Some(&token),
            Some(json!({ "notes": "prefers mornings" })),
        ),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 200);
    let lead = db.with_conn(|conn| leads::get_lead(conn, id)).unwrap().unwrap();
    assert_eq!(lead.notes.as_deref(), Some("prefers mornings"));

    let resp = handle(
        request(Method::DELETE, &format!("/api/leads/{id}"), Some(&token), None),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(db.with_conn(|conn| leads::get_lead(conn, id)).unwrap().is_none());
}

#[test]
fn list_stats_and_export_answer_for_the_owner() {
    let db = init_test_db();
    let (agent, token) = seed_session(&db, "Ada", "ada@example.com", Role::Agent);
    seed_lead(&db, agent, DealType::Rental);
    seed_lead(&db, agent, DealType::Purchase);

    let resp = handle(
        request(Method::GET, "/api/leads?dealType=rental", Some(&token), None),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = handle(
        request(Method::GET, "/api/leads/stats", Some(&token), None),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = handle(
        request(Method::GET, "/api/leads/export.xlsx", Some(&token), None),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 200);
    let content_type = resp
        .headers()
        .get("Content-Type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(content_type.contains("spreadsheetml"));
}

#[test]
fn api_requires_a_session() {
    let db = init_test_db();

    let resp = handle(request(Method::GET, "/api/leads", None, None), &db).unwrap();
    assert_eq!(resp.status(), 401);

    let resp = handle(
        request(Method::GET, "/api/leads", Some("bogus-token"), None),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 401);
}
