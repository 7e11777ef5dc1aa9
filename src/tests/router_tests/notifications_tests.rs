// src/tests/router_tests/notifications_tests.rs
use astra::{Body, Request};
use http::{HeaderValue, Method};
use serde_json::json;

use crate::db::connection::Database;
use crate::db::notifications::{create_notification, unread_count, NewNotification};
use crate::domain::lead::Role;
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

fn seed_notification(db: &Database, user_id: i64, message: &str) -> i64 {
    db.with_conn(|conn| {
        create_notification(
            conn,
            &NewNotification {
                user_id,
                kind: "announcement".to_string(),
                title: "Announcement".to_string(),
                message: message.to_string(),
                metadata: None,
            },
            100,
        )
    })
    .unwrap()
}

#[test]
fn unread_count_endpoint_reflects_reads() {
    let db = init_test_db();
    let (user, token) = seed_session(&db, "Ada", "ada@example.com", Role::Agent);

    let first = seed_notification(&db, user, "one");
    seed_notification(&db, user, "two");
    seed_notification(&db, user, "three");

    let resp = handle(
        request(Method::GET, "/api/notifications/unread-count", Some(&token), None),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(db.with_conn(|c| unread_count(c, user)).unwrap(), 3);

    let resp = handle(
        request(
            Method::PATCH,
            &format!("/api/notifications/{first}/read"),
            Some(&token),
            None,
        ),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(db.with_conn(|c| unread_count(c, user)).unwrap(), 2);

    // Marking again is a silent success and changes nothing.
    let resp = handle(
        request(
            Method::PATCH,
            &format!("/api/notifications/{first}/read"),
            Some(&token),
            None,
        ),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(db.with_conn(|c| unread_count(c, user)).unwrap(), 2);
}

#[test]
fn mark_read_guards_recipient_and_existence() {
    let db = init_test_db();
    let (ada, _ada_token) = seed_session(&db, "Ada", "ada@example.com", Role::Agent);
    let (_bob, bob_token) = seed_session(&db, "Bob", "bob@example.com", Role::Tenant);

    let id = seed_notification(&db, ada, "for ada");

    let resp = handle(
        request(
            Method::PATCH,
            &format!("/api/notifications/{id}/read"),
            Some(&bob_token),
            None,
        ),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = handle(
        request(
            Method::PATCH,
            "/api/notifications/999999/read",
            Some(&bob_token),
            None,
        ),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 404);
}

#[test]
fn notification_list_is_paginated() {
    let db = init_test_db();
    let (user, token) = seed_session(&db, "Ada", "ada@example.com", Role::Agent);
    for i in 0..5 {
        seed_notification(&db, user, &format!("n{i}"));
    }

    let resp = handle(
        request(
            Method::GET,
            "/api/notifications?page=1&pageSize=2",
            Some(&token),
            None,
        ),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 200);
}

#[test]
fn announcement_reaches_everyone_but_admins() {
    let db = init_test_db();
    let (admin, admin_token) = seed_session(&db, "Root", "root@example.com", Role::Admin);
    let (ada, _) = seed_session(&db, "Ada", "ada@example.com", Role::Agent);
    let (tom, _) = seed_session(&db, "Tom", "tom@example.com", Role::Tenant);

    let resp = handle(
        request(
            Method::POST,
            "/api/announcements",
            Some(&admin_token),
            Some(json!({ "message": "Maintenance window on Friday" })),
        ),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 200);

    assert_eq!(db.with_conn(|c| unread_count(c, ada)).unwrap(), 1);
    assert_eq!(db.with_conn(|c| unread_count(c, tom)).unwrap(), 1);
    assert_eq!(db.with_conn(|c| unread_count(c, admin)).unwrap(), 0);
}

#[test]
fn announcement_is_admin_only_and_requires_a_message() {
    let db = init_test_db();
    let (_ada, ada_token) = seed_session(&db, "Ada", "ada@example.com", Role::Agent);
    let (_admin, admin_token) = seed_session(&db, "Root", "root@example.com", Role::Admin);

    let resp = handle(
        request(
            Method::POST,
            "/api/announcements",
            Some(&ada_token),
            Some(json!({ "message": "hi" })),
        ),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = handle(
        request(
            Method::POST,
            "/api/announcements",
            Some(&admin_token),
            Some(json!({ "message": "   " })),
        ),
        &db,
    )
    .unwrap();
    assert_eq!(resp.status(), 400);
}
