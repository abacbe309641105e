mod common;

use serde_json::json;
use std::sync::Arc;

use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aspri::error::AspriError;
use aspri::sync::{Mode, TaskView, ViewFilter};
use aspri::task::{NewTask, Task, TaskUpdate};

use common::sync_against;

fn buy_milk() -> Task {
    serde_json::from_value(json!({
        "id": 1,
        "title": "Buy milk",
        "completed": false
    }))
    .unwrap()
}

async fn mount_down(server: &MockServer) {
    Mock::given(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(server)
        .await;
}

/// A failing service yields the cached list in offline mode
#[tokio::test]
async fn test_fetch_falls_back_to_cache_when_service_fails() {
    let server = MockServer::start().await;
    mount_down(&server).await;

    let (sync, _tmp) = sync_against(&format!("{}/api", server.uri()), &[buy_milk()]);
    let synced = sync.fetch().await.unwrap();

    assert_eq!(synced.mode, Mode::Offline);
    assert_eq!(synced.tasks, vec![buy_milk()]);
}

/// An unreachable host behaves like a failing service
#[tokio::test]
async fn test_fetch_unreachable_host_is_offline() {
    let (sync, _tmp) = sync_against("http://127.0.0.1:9/api", &[buy_milk()]);
    let synced = sync.fetch().await.unwrap();

    assert!(synced.mode.is_offline());
    assert_eq!(synced.tasks.len(), 1);
}

/// Completing offline persists to the cache and survives a later fetch
#[tokio::test]
async fn test_offline_complete_persists_in_cache() {
    let server = MockServer::start().await;
    mount_down(&server).await;

    let (sync, _tmp) = sync_against(&format!("{}/api", server.uri()), &[buy_milk()]);
    let synced = sync.complete(Mode::Offline, 1, true).await.unwrap();

    assert_eq!(synced.mode, Mode::Offline);
    assert!(synced.tasks[0].completed);
    assert_eq!(synced.tasks[0].title, "Buy milk");
    assert!(synced.tasks[0].updated_at.is_none());

    let refetched = sync.fetch().await.unwrap();
    assert!(refetched.tasks[0].completed);
}

/// Online completion falls back when the PUT hits a dead service
#[tokio::test]
async fn test_online_complete_falls_back_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/tasks/1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (sync, _tmp) = sync_against(&format!("{}/api", server.uri()), &[buy_milk()]);
    let synced = sync.complete(Mode::Online, 1, true).await.unwrap();

    assert_eq!(synced.mode, Mode::Offline);
    assert!(synced.tasks[0].completed);
}

/// Online completion sends the partial update and re-fetches the list
#[tokio::test]
async fn test_online_complete_puts_then_refetches() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/tasks/1"))
        .and(header("cache-control", "no-cache, no-store, must-revalidate"))
        .and(body_json(json!({ "completed": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "title": "Buy milk", "completed": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "title": "Buy milk", "completed": true },
            { "id": 2, "title": "Call mom", "completed": false }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (sync, _tmp) = sync_against(&format!("{}/api", server.uri()), &[buy_milk()]);
    let synced = sync.complete(Mode::Online, 1, true).await.unwrap();

    assert_eq!(synced.mode, Mode::Online);
    assert_eq!(synced.tasks.len(), 2);
    assert_eq!(sync.cache().load().unwrap().len(), 2);
}

/// A 4xx is surfaced with the service's message and the cache is untouched
#[tokio::test]
async fn test_rejected_update_is_not_applied_locally() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/tasks/1"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Title is required" })),
        )
        .mount(&server)
        .await;

    let (sync, _tmp) = sync_against(&format!("{}/api", server.uri()), &[buy_milk()]);
    let changes = TaskUpdate {
        title: Some(String::new()),
        ..TaskUpdate::default()
    };
    let err = sync.update(Mode::Online, 1, changes).await.unwrap_err();

    match err.downcast_ref::<AspriError>() {
        Some(AspriError::RemoteRejected { status, message }) => {
            assert_eq!(*status, 400);
            assert_eq!(message, "Title is required");
        }
        other => panic!("expected RemoteRejected, got {:?}", other),
    }
    assert_eq!(sync.cache().load().unwrap(), vec![buy_milk()]);
}

/// Offline delete removes the task from both the result and the cache
#[tokio::test]
async fn test_offline_delete_removes_from_cache() {
    let server = MockServer::start().await;
    mount_down(&server).await;

    let cached = vec![buy_milk(), Task::new(2, "Call mom")];
    let (sync, _tmp) = sync_against(&format!("{}/api", server.uri()), &cached);
    let synced = sync.delete(Mode::Offline, 1).await.unwrap();

    assert_eq!(synced.tasks.len(), 1);
    assert_eq!(synced.tasks[0].id, 2);
    assert_eq!(sync.cache().load().unwrap().len(), 1);
}

/// Online delete sends DELETE and re-fetches the list into the cache
#[tokio::test]
async fn test_online_delete_then_refetches() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/tasks/1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 2, "title": "Call mom", "completed": false },
            { "id": 3, "title": "Water plants", "completed": false }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let cached = vec![buy_milk(), Task::new(2, "Call mom")];
    let (sync, _tmp) = sync_against(&format!("{}/api", server.uri()), &cached);
    let synced = sync.delete(Mode::Online, 1).await.unwrap();

    assert_eq!(synced.mode, Mode::Online);
    let ids: Vec<i64> = sync.cache().load().unwrap().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![2, 3]);
    assert_eq!(synced.tasks.len(), 2);
}

/// Online delete falls back to the cache when the service fails
#[tokio::test]
async fn test_online_delete_falls_back_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/tasks/1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let cached = vec![buy_milk(), Task::new(2, "Call mom")];
    let (sync, _tmp) = sync_against(&format!("{}/api", server.uri()), &cached);
    let synced = sync.delete(Mode::Online, 1).await.unwrap();

    assert_eq!(synced.mode, Mode::Offline);
    assert_eq!(synced.tasks, vec![Task::new(2, "Call mom")]);
    assert_eq!(sync.cache().load().unwrap(), vec![Task::new(2, "Call mom")]);
}

/// Offline delete of an unknown id reports it instead of silently succeeding
#[tokio::test]
async fn test_offline_delete_unknown_id() {
    let (sync, _tmp) = sync_against("http://127.0.0.1:9/api", &[buy_milk()]);
    let err = sync.delete(Mode::Offline, 42).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AspriError>(),
        Some(AspriError::TaskNotFound(42))
    ));
}

/// Offline create takes the next id and fills in the category key
#[tokio::test]
async fn test_offline_create_assigns_next_id() {
    let cached = vec![buy_milk(), Task::new(5, "Water plants")];
    let (sync, _tmp) = sync_against("http://127.0.0.1:9/api", &cached);

    let new_task = NewTask {
        category: Some("Kerja".to_string()),
        ..NewTask::titled("  Write report ")
    };
    let (created, synced) = sync.create(Mode::Offline, new_task).await.unwrap();

    assert_eq!(created.id, 6);
    assert_eq!(created.title, "Write report");
    assert_eq!(created.category_key(), "work");
    assert!(!created.completed);
    assert!(created.created_at.is_some());
    assert_eq!(synced.tasks.len(), 3);
}

/// Online create posts the prepared task, including its category key
#[tokio::test]
async fn test_online_create_posts_prepared_task() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/tasks"))
        .and(body_json(json!({
            "title": "Write report",
            "category": "Kerja",
            "meta": { "categoryKey": "work" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 10, "title": "Write report", "category": "Kerja",
            "meta": { "categoryKey": "work" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 10, "title": "Write report", "category": "Kerja" }
        ])))
        .mount(&server)
        .await;

    let (sync, _tmp) = sync_against(&format!("{}/api", server.uri()), &[]);
    let new_task = NewTask {
        category: Some("Kerja".to_string()),
        ..NewTask::titled("Write report")
    };
    let (created, synced) = sync.create(Mode::Online, new_task).await.unwrap();

    assert_eq!(created.id, 10);
    assert_eq!(synced.mode, Mode::Online);
}

/// A view that went offline keeps working against the cache
#[tokio::test]
async fn test_view_stays_usable_offline() {
    let server = MockServer::start().await;
    mount_down(&server).await;

    let (sync, _tmp) = sync_against(
        &format!("{}/api", server.uri()),
        &[buy_milk(), Task::new(2, "Call mom")],
    );
    let sync = Arc::new(sync);
    let mut all = TaskView::new(sync.clone(), ViewFilter::All);

    assert_eq!(all.fetch().await.unwrap().len(), 2);
    assert!(all.is_offline());

    all.complete(1, true).await.unwrap();
    assert!(all.tasks().iter().any(|t| t.id == 1 && t.completed));

    let mut completed = TaskView::new(sync, ViewFilter::Completed);
    let done = completed.fetch().await.unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].title, "Buy milk");
}
