//! Request shape and error mapping against a mock PostgREST server.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use chrono::{DateTime, Utc};
use daybook_supabase::{SupabaseConfig, SupabaseTodoStore};
use daybook_testing::{init_test_tracing, test_clock};
use daybook_todos::mocks::RecordingNotifier;
use daybook_todos::{
    NewTodo, OwnerId, Priority, RemoteOperation, TodoEnvironment, TodoFilter, TodoId, TodoPatch,
    TodoQuery, TodoStore, TodoSynchronizer,
};
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ANON_KEY: &str = "anon-key";
const TABLE_PATH: &str = "/rest/v1/todos";

fn store_for(server: &MockServer) -> SupabaseTodoStore {
    SupabaseTodoStore::new(SupabaseConfig::new(server.uri(), ANON_KEY).with_access_token("user-jwt"))
}

fn row(id: Uuid, owner: OwnerId, title: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "user_id": owner.as_uuid(),
        "title": title,
        "completed": false,
        "completed_at": null,
        "priority": "high",
        "subject": "Maths",
        "created_at": created_at
    })
}

fn at(timestamp: &str) -> DateTime<Utc> {
    timestamp.parse().unwrap()
}

#[tokio::test]
async fn select_filters_by_owner_newest_first() {
    init_test_tracing();
    let server = MockServer::start().await;
    let owner = OwnerId::new();
    let (newer, older) = (Uuid::new_v4(), Uuid::new_v4());

    let mut legacy = row(older, owner, "Old note", "2025-01-01T08:00:00Z");
    legacy["priority"] = json!(null);
    legacy.as_object_mut().unwrap().remove("subject");

    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .and(query_param("select", "*"))
        .and(query_param("user_id", format!("eq.{owner}")))
        .and(query_param("order", "created_at.desc"))
        .and(header("apikey", ANON_KEY))
        .and(header("authorization", "Bearer user-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            row(newer, owner, "Essay draft", "2025-01-01T09:00:00Z"),
            legacy
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let todos = store_for(&server)
        .select(TodoQuery::for_owner(owner))
        .await
        .unwrap();

    assert_eq!(todos.len(), 2);
    assert_eq!(*todos[0].id.as_uuid(), newer);
    assert_eq!(todos[0].priority, Priority::High);
    assert_eq!(todos[0].subject.as_deref(), Some("Maths"));
    assert_eq!(todos[1].priority, Priority::Medium);
    assert_eq!(todos[1].subject, None);
    assert!(todos.iter().all(|t| t.owner_id == owner));
}

#[tokio::test]
async fn anon_key_is_bearer_without_access_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let store = SupabaseTodoStore::new(SupabaseConfig::new(server.uri(), ANON_KEY));
    let todos = store.select(TodoQuery::for_owner(OwnerId::new())).await.unwrap();
    assert!(todos.is_empty());
}

#[tokio::test]
async fn insert_returns_stored_row() {
    let server = MockServer::start().await;
    let owner = OwnerId::new();
    let id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path(TABLE_PATH))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!({
            "user_id": owner.as_uuid(),
            "title": "Essay draft",
            "completed": false,
            "priority": "high",
            "subject": "Maths"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([row(
            id,
            owner,
            "Essay draft",
            "2025-01-01T09:00:00Z"
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let new_todo = NewTodo::new(owner, " Essay draft ", Priority::High, Some("Maths")).unwrap();
    let created = store_for(&server).insert(new_todo).await.unwrap();

    assert_eq!(*created.id.as_uuid(), id);
    assert_eq!(created.created_at, at("2025-01-01T09:00:00Z"));
    assert!(!created.completed);
}

#[tokio::test]
async fn update_is_scoped_to_id_and_owner() {
    let server = MockServer::start().await;
    let owner = OwnerId::new();
    let id = Uuid::new_v4();

    let mut stored = row(id, owner, "Essay draft", "2025-01-01T09:00:00Z");
    stored["completed"] = json!(true);
    stored["completed_at"] = json!("2025-01-01T10:00:00Z");

    Mock::given(method("PATCH"))
        .and(path(TABLE_PATH))
        .and(query_param("id", format!("eq.{id}")))
        .and(query_param("user_id", format!("eq.{owner}")))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!({
            "completed": true,
            "completed_at": "2025-01-01T10:00:00Z"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored])))
        .expect(1)
        .mount(&server)
        .await;

    let filter = TodoFilter::new(TodoId::from_uuid(id), owner);
    let updated = store_for(&server)
        .update(filter, TodoPatch::complete(at("2025-01-01T10:00:00Z")))
        .await
        .unwrap();

    assert!(updated.completed);
    assert_eq!(updated.completed_at, Some(at("2025-01-01T10:00:00Z")));
}

#[tokio::test]
async fn reopen_sends_explicit_null() {
    let server = MockServer::start().await;
    let owner = OwnerId::new();
    let id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(body_json(json!({ "completed": false, "completed_at": null })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(
            id,
            owner,
            "Essay draft",
            "2025-01-01T09:00:00Z"
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let filter = TodoFilter::new(TodoId::from_uuid(id), owner);
    let updated = store_for(&server)
        .update(filter, TodoPatch::reopen())
        .await
        .unwrap();

    assert!(!updated.completed);
    assert_eq!(updated.completed_at, None);
}

#[tokio::test]
async fn update_matching_nothing_fails() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let filter = TodoFilter::new(TodoId::new(), OwnerId::new());
    let error = store_for(&server)
        .update(filter, TodoPatch::reopen())
        .await
        .unwrap_err();

    assert_eq!(error.operation, RemoteOperation::Update);
    assert_eq!(error.cause, "No row returned");
}

#[tokio::test]
async fn delete_is_scoped_to_id_and_owner() {
    let server = MockServer::start().await;
    let owner = OwnerId::new();
    let id = TodoId::new();

    Mock::given(method("DELETE"))
        .and(path(TABLE_PATH))
        .and(query_param("id", format!("eq.{id}")))
        .and(query_param("user_id", format!("eq.{owner}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server)
        .delete(TodoFilter::new(id, owner))
        .await
        .unwrap();
}

#[tokio::test]
async fn unauthorized_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "JWT expired" })))
        .mount(&server)
        .await;

    let error = store_for(&server)
        .select(TodoQuery::for_owner(OwnerId::new()))
        .await
        .unwrap_err();

    assert_eq!(error.operation, RemoteOperation::Select);
    assert_eq!(error.cause, "Unauthorized - invalid key or access token");
}

#[tokio::test]
async fn api_error_carries_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("violates check constraint"))
        .mount(&server)
        .await;

    let new_todo = NewTodo::new(OwnerId::new(), "Essay", Priority::Low, None).unwrap();
    let error = store_for(&server).insert(new_todo).await.unwrap_err();

    assert_eq!(error.operation, RemoteOperation::Insert);
    assert_eq!(
        error.cause,
        "API error (status 400): violates check constraint"
    );
}

#[tokio::test]
async fn malformed_body_is_a_parse_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let error = store_for(&server)
        .select(TodoQuery::for_owner(OwnerId::new()))
        .await
        .unwrap_err();

    assert!(error.cause.starts_with("Response parsing failed"));
}

#[tokio::test]
async fn unreachable_server_is_a_request_failure() {
    let store = SupabaseTodoStore::new(SupabaseConfig::new("http://127.0.0.1:1", ANON_KEY));

    let error = store.delete(TodoFilter::new(TodoId::new(), OwnerId::new())).await.unwrap_err();

    assert_eq!(error.operation, RemoteOperation::Delete);
    assert!(error.cause.starts_with("Request failed"));
}

#[tokio::test]
async fn synchronizer_mirrors_remote_table() {
    init_test_tracing();
    let server = MockServer::start().await;
    let owner = OwnerId::new();
    let (existing, created) = (Uuid::new_v4(), Uuid::new_v4());

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(
            existing,
            owner,
            "Essay draft",
            "2025-01-01T08:00:00Z"
        )])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([row(
            created,
            owner,
            "Past paper",
            "2025-01-01T09:00:00Z"
        )])))
        .mount(&server)
        .await;

    let notifier = RecordingNotifier::new();
    let todos = TodoSynchronizer::new(TodoEnvironment::new(
        Arc::new(store_for(&server)),
        Arc::new(notifier.clone()),
        Arc::new(test_clock()),
    ));

    assert!(todos.load_all(owner).await.unwrap().is_applied());
    assert!(
        todos
            .create("Past paper", Priority::High, Some("Maths"))
            .await
            .unwrap()
            .is_applied()
    );

    let ids: Vec<Uuid> = todos.todos().await.iter().map(|t| *t.id.as_uuid()).collect();
    assert_eq!(ids, vec![created, existing]);
    assert_eq!(notifier.infos().len(), 1);
}
