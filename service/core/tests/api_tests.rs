// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use common::Harness;
use expensa_core::domain::repository::{ExpensesListRepository, NotificationRepository};
use expensa_core::domain::user::UserId;
use expensa_core::presentation::{app, AppState};

fn router(h: &Harness) -> Router {
    app(Arc::new(AppState::new(h.services.clone(), h.bus.clone())))
}

async fn call(router: &Router, method: Method, uri: &str, caller: Option<UserId>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder.header("x-user-id", caller.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let h = Harness::new();
    let (status, body) = call(&router(&h), Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_chat_endpoint() {
    let h = Harness::new();
    let router = router(&h);
    let caller = UserId::new();

    let (status, body) = call(
        &router,
        Method::POST,
        "/api/dialogflow",
        None,
        Some(json!({ "message": "create list Trip", "userId": caller.to_string() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "List \"Trip\" created successfully.");
    assert_eq!(body["intent"], "create_list");

    let (status, body) = call(&router, Method::POST, "/api/dialogflow", None, Some(json!({ "message": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");

    let (status, _) = call(&router, Method::POST, "/api/dialogflow", None, Some(json!({ "message": "show lists" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &router,
        Method::POST,
        "/api/dialogflow",
        None,
        Some(json!({ "message": "sing me a song", "userId": caller.to_string() })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["response"], "Unknown intent.");
}

#[tokio::test]
async fn test_resource_api_list_and_expense_lifecycle() {
    let h = Harness::new();
    let router = router(&h);
    let owner = UserId::new();

    let (status, list) = call(&router, Method::POST, "/api/lists", Some(owner), Some(json!({ "name": "Trip" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let list_id = list["id"].as_str().unwrap().to_string();
    assert_eq!(list["creator"]["id"], owner.to_string());

    let (status, expense) = call(
        &router,
        Method::POST,
        "/api/expenses",
        Some(owner),
        Some(json!({ "name": "Lunch", "amount": 12.5, "listId": list_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let expense_id = expense["id"].as_str().unwrap().to_string();

    let (status, updated) = call(
        &router,
        Method::PUT,
        &format!("/api/expenses/{}", expense_id),
        Some(owner),
        Some(json!({ "amount": 15.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["amount"], 15.0);
    assert_eq!(updated["name"], "Lunch");

    let (status, listed) = call(&router, Method::GET, &format!("/api/expenses?listId={}", list_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(|a| a.len()), Some(1));

    let (status, _) = call(
        &router,
        Method::DELETE,
        &format!("/api/expenses/{}?listId={}", expense_id, list_id),
        Some(owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, renamed) = call(
        &router,
        Method::PUT,
        &format!("/api/lists/{}", list_id),
        Some(owner),
        Some(json!({ "name": "Road Trip" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Road Trip");
    assert_eq!(renamed["expenses"].as_array().map(|a| a.len()), Some(0));

    let (status, _) = call(&router, Method::DELETE, &format!("/api/lists/{}", list_id), Some(owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(h.lists.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_resource_api_requires_caller() {
    let h = Harness::new();
    let router = router(&h);

    let (status, body) = call(&router, Method::POST, "/api/lists", None, Some(json!({ "name": "Trip" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");

    let (status, _) = call(&router, Method::GET, "/api/notifications", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Reads stay open
    let (status, _) = call(&router, Method::GET, "/api/lists", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_resource_api_errors() {
    let h = Harness::new();
    let router = router(&h);
    let caller = UserId::new();

    let (status, body) = call(
        &router,
        Method::POST,
        "/api/expenses",
        Some(caller),
        Some(json!({ "name": "Lunch", "amount": 3.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["missing"], json!(["listId"]));

    let (status, _) = call(&router, Method::GET, "/api/expenses/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &router,
        Method::GET,
        &format!("/api/expenses/{}", uuid::Uuid::new_v4()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_notification_feed_and_mark_read() {
    let h = Harness::new();
    let router = router(&h);
    let caller = UserId::new();

    call(&router, Method::POST, "/api/lists", Some(caller), Some(json!({ "name": "Trip" }))).await;
    call(&router, Method::POST, "/api/lists", Some(caller), Some(json!({ "name": "Groceries" }))).await;

    let (status, feed) = call(&router, Method::GET, "/api/notifications", Some(caller), None).await;
    assert_eq!(status, StatusCode::OK);
    let feed = feed.as_array().unwrap().clone();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0]["type"], "list_created");
    assert!(feed[0]["props"]["listName"].is_string());

    let id = feed[0]["props"]["id"].as_str().unwrap();
    let (status, marked) = call(
        &router,
        Method::POST,
        &format!("/api/notifications/{}/read", id),
        Some(caller),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(marked["read"], true);

    // Someone else's notification does not resolve
    let (status, _) = call(
        &router,
        Method::POST,
        &format!("/api/notifications/{}/read", id),
        Some(UserId::new()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let unread = h
        .notifications
        .find_by_user(caller)
        .await
        .unwrap()
        .into_iter()
        .filter(|n| !n.read)
        .count();
    assert_eq!(unread, 1);
}

#[tokio::test]
async fn test_create_reports_created_when_creator_lookup_fails() {
    let h = Harness::with_failing_user_lookup();
    let router = router(&h);
    let caller = UserId::new();

    let (status, list) = call(&router, Method::POST, "/api/lists", Some(caller), Some(json!({ "name": "Trip" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(list["creator"]["id"], caller.to_string());
    assert_eq!(h.lists.list_all().await.unwrap().len(), 1);
}
