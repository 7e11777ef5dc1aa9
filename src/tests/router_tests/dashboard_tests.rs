// src/tests/router_tests/dashboard_tests.rs
use astra::Body;
use http::{Method, Request};
use std::io::Read;

use crate::db::leads::{create_lead, NewLead};
use crate::domain::lead::{ClientInfo, DealType, Role};
use crate::errors::ServerError;
use crate::router::handle;
use crate::tests::utils::{init_test_db, seed_session};

#[test]
fn home_page_loads_successfully() {
    let db = init_test_db();

    let req = Request::builder()
        .method(Method::GET)
        .uri("/")
        .body(Body::empty())
        .unwrap();

    let resp = handle(req, &db).expect("Failed to handle request");
    assert_eq!(resp.status(), 200);

    let mut body = String::new();
    resp.into_body().reader().read_to_string(&mut body).unwrap();
    assert!(body.contains("EstateHub"));
    assert!(body.contains("/dashboard"));
}

#[test]
fn dashboard_requires_a_session() {
    let db = init_test_db();

    let req = Request::builder()
        .method(Method::GET)
        .uri("/dashboard")
        .body(Body::empty())
        .unwrap();

    let err = handle(req, &db).err().expect("expected an auth error");
    match err {
        ServerError::Unauthorized(_) => {}
        other => panic!("expected Unauthorized, got {other:?}"),
    }
}

#[test]
fn dashboard_shows_leads_and_role_tasks() {
    let db = init_test_db();
    let (agent, token) = seed_session(&db, "Ada", "ada@example.com", Role::Agent);

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
                deal_type: DealType::Rental,
                created_by: agent,
                messages: vec![],
                notes: None,
            },
            100,
        )
    })
    .unwrap();

    let req = Request::builder()
        .method(Method::GET)
        .uri("/dashboard")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let resp = handle(req, &db).expect("Failed to handle request");
    assert_eq!(resp.status(), 200);

    let mut body = String::new();
    resp.into_body().reader().read_to_string(&mut body).unwrap();

    assert!(body.contains("Signed in as"));
    assert!(body.contains("Ada"));
    assert!(body.contains("Jane"));
    // Agent automations are listed by name.
    assert!(body.contains("Auto-Respond to Inquiries"));
    assert!(!body.contains("Send Rent Reminders"));
}
