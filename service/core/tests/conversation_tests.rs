// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

mod common;

use mockito::Matcher;
use std::sync::Arc;
use std::time::Duration;

use common::{Harness, ScriptedNlu};
use expensa_core::application::envelope::UPSTREAM_MESSAGE;
use expensa_core::application::ServiceSettings;
use expensa_core::domain::intent::ParameterBag;
use expensa_core::domain::repository::ExpensesListRepository;
use expensa_core::domain::user::UserId;
use expensa_core::infrastructure::nlu::DialogflowAdapter;

fn settings(nlu_ms: u64) -> ServiceSettings {
    ServiceSettings {
        nlu_timeout: Duration::from_millis(nlu_ms),
        ..ServiceSettings::default()
    }
}

#[tokio::test]
async fn test_chat_creates_list_through_keyword_provider() {
    let h = Harness::new();
    let caller = UserId::new();

    let envelope = h
        .services
        .conversation
        .handle("create list Summer Trip", Some(&caller.to_string()))
        .await;

    assert_eq!(envelope.status, 200);
    assert_eq!(
        envelope.response.as_message(),
        Some("List \"Summer Trip\" created successfully.")
    );
    let lists = h.lists.list_all().await.unwrap();
    assert_eq!(lists[0].creator, caller);
}

#[tokio::test]
async fn test_chat_rejects_bad_input_before_nlu() {
    let nlu = Arc::new(ScriptedNlu::new("read_list", ParameterBag::new()));
    let h = Harness::with_nlu(nlu.clone(), settings(1000));

    let empty = h.services.conversation.handle("   ", Some(&UserId::new().to_string())).await;
    assert_eq!(empty.status, 400);
    assert_eq!(empty.missing, Some(vec!["message".to_string()]));

    let anonymous = h.services.conversation.handle("show lists", None).await;
    assert_eq!(anonymous.status, 401);

    let garbled = h.services.conversation.handle("show lists", Some("42")).await;
    assert_eq!(garbled.status, 400);

    assert_eq!(nlu.calls(), 0);
}

#[tokio::test]
async fn test_sessions_are_per_caller() {
    let nlu = Arc::new(ScriptedNlu::new("read_list", ParameterBag::new()));
    let h = Harness::with_nlu(nlu.clone(), settings(1000));
    let alice = UserId::new().to_string();
    let bob = UserId::new().to_string();

    h.services.conversation.handle("show lists", Some(&alice)).await;
    h.services.conversation.handle("show lists", Some(&bob)).await;
    h.services.conversation.handle("show lists again", Some(&alice)).await;

    let seen = nlu.sessions.lock().clone();
    assert_eq!(seen.len(), 3);
    assert_ne!(seen[0], seen[1]);
    assert_eq!(seen[0], seen[2]);
    assert_eq!(h.sessions.len(), 2);
}

#[tokio::test]
async fn test_nlu_timeout_is_upstream_failure() {
    let nlu = Arc::new(
        ScriptedNlu::new("create_list", ParameterBag::new().with_text("listName", "Trip"))
            .slow(Duration::from_millis(500)),
    );
    let h = Harness::with_nlu(nlu, settings(20));

    let envelope = h
        .services
        .conversation
        .handle("create list Trip", Some(&UserId::new().to_string()))
        .await;

    assert_eq!(envelope.status, 500);
    assert_eq!(envelope.error, Some("upstream"));
    assert_eq!(envelope.response.as_message(), Some(UPSTREAM_MESSAGE));
    assert!(h.lists.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_dialogflow_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock(
            "POST",
            Matcher::Regex(r"^/v2/projects/expenses-bot/agent/sessions/[0-9a-f-]+:detectIntent$".to_string()),
        )
        .match_header("authorization", "Bearer test-token")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "queryInput": { "text": { "text": "new list Trip", "languageCode": "en-US" } }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "responseId": "r-1",
                "queryResult": {
                    "queryText": "new list Trip",
                    "intent": { "displayName": "create_list" },
                    "parameters": { "listName": "Trip" }
                }
            }"#,
        )
        .create_async()
        .await;

    let adapter = DialogflowAdapter::new(
        server.url(),
        "expenses-bot".to_string(),
        Some("test-token".to_string()),
        "en-US".to_string(),
    );
    let h = Harness::with_nlu(Arc::new(adapter), settings(2000));

    let envelope = h
        .services
        .conversation
        .handle("new list Trip", Some(&UserId::new().to_string()))
        .await;

    mock.assert_async().await;
    assert_eq!(envelope.status, 200, "{:?}", envelope);
    assert_eq!(h.lists.list_all().await.unwrap()[0].name, "Trip");
}

#[tokio::test]
async fn test_dialogflow_auth_failure_is_generic_500() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Any)
        .with_status(403)
        .with_body("permission denied")
        .create_async()
        .await;

    let adapter = DialogflowAdapter::new(server.url(), "expenses-bot".to_string(), None, "en-US".to_string());
    let h = Harness::with_nlu(Arc::new(adapter), settings(2000));

    let envelope = h
        .services
        .conversation
        .handle("new list Trip", Some(&UserId::new().to_string()))
        .await;

    assert_eq!(envelope.status, 500);
    assert_eq!(envelope.response.as_message(), Some(UPSTREAM_MESSAGE));
}

#[tokio::test]
async fn test_dialogflow_without_query_result_is_no_match() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{ "responseId": "r-2" }"#)
        .create_async()
        .await;

    let adapter = DialogflowAdapter::new(server.url(), "expenses-bot".to_string(), None, "en-US".to_string());
    let h = Harness::with_nlu(Arc::new(adapter), settings(2000));

    let envelope = h
        .services
        .conversation
        .handle("hmm", Some(&UserId::new().to_string()))
        .await;

    assert_eq!(envelope.status, 400);
    assert_eq!(envelope.error, Some("no_match"));
    assert_eq!(envelope.response.as_message(), Some("No intent matched."));
    assert!(h.lists.list_all().await.unwrap().is_empty());
}
