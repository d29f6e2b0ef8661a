//! Integration tests for the entity CRUD surface.
//!
//! Binds the full router on a random port against the in-memory store.
//! The reasoning client points at a closed port; no AI path is exercised
//! here (see predict_test.rs for those).

use std::sync::Arc;

use agencyd::ai::ReasoningClient;
use agencyd::config::AgencyConfig;
use agencyd::rest;
use agencyd::store::mem::MemStore;
use agencyd::store::StoreBackend;
use agencyd::AppContext;
use serde_json::{json, Value};

const DEAD_UPSTREAM: &str = "http://127.0.0.1:1";

/// Bind the API on a random port and return its base URL.
async fn spawn_api() -> String {
    let config = Arc::new(AgencyConfig {
        port: 0,
        bind_address: "127.0.0.1".to_string(),
        log: "error".to_string(),
        log_format: "pretty".to_string(),
        store_url: None,
        store_key: None,
        openai_api_key: None,
        openai_base_url: DEAD_UPSTREAM.to_string(),
        model: "gpt-4o".to_string(),
        http_timeout_secs: 2,
    });
    let store: Arc<dyn StoreBackend> = Arc::new(MemStore::new());
    let reasoning =
        Arc::new(ReasoningClient::new(DEAD_UPSTREAM, "test-key", "gpt-4o", 2).unwrap());
    let ctx = Arc::new(AppContext {
        config,
        store,
        reasoning,
        started_at: std::time::Instant::now(),
    });

    let router = rest::build_router(ctx);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn create_client(http: &reqwest::Client, base: &str, name: &str) -> Value {
    let resp = http
        .post(format!("{base}/api/clients"))
        .json(&json!({ "name": name, "email": format!("contact@{}.test", name.to_lowercase()) }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    resp.json().await.unwrap()
}

async fn create_project(http: &reqwest::Client, base: &str, client_id: i64, name: &str) -> Value {
    let resp = http
        .post(format!("{base}/api/projects"))
        .json(&json!({ "client_id": client_id, "name": name, "budget": 5000.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn create_then_list_clients_includes_the_row() {
    let base = spawn_api().await;
    let http = reqwest::Client::new();

    let resp = http
        .post(format!("{base}/api/clients"))
        .json(&json!({ "name": "Acme", "email": "a@acme.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await.unwrap();
    assert_eq!(created["name"], "Acme");
    assert!(created["id"].is_i64());

    let rows: Vec<Value> = http
        .get(format!("{base}/api/clients"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(rows
        .iter()
        .any(|c| c["name"] == "Acme" && c["email"] == "a@acme.com"));
}

#[tokio::test]
async fn update_client_patches_only_provided_fields() {
    let base = spawn_api().await;
    let http = reqwest::Client::new();

    let created = create_client(&http, &base, "Globex").await;
    let id = created["id"].as_i64().unwrap();

    let resp = http
        .put(format!("{base}/api/clients/{id}"))
        .json(&json!({ "industry": "Robotics" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["industry"], "Robotics");
    assert_eq!(updated["name"], "Globex");
}

#[tokio::test]
async fn updating_a_missing_client_is_404_with_error_body() {
    let base = spawn_api().await;
    let http = reqwest::Client::new();

    let resp = http
        .put(format!("{base}/api/clients/9999"))
        .json(&json!({ "name": "Ghost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("9999"));
}

#[tokio::test]
async fn project_listing_embeds_the_client_name() {
    let base = spawn_api().await;
    let http = reqwest::Client::new();

    let client = create_client(&http, &base, "Initech").await;
    let client_id = client["id"].as_i64().unwrap();
    let project = create_project(&http, &base, client_id, "Migration").await;
    assert_eq!(project["status"], "pending");

    let rows: Vec<Value> = http
        .get(format!("{base}/api/projects"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let row = rows.iter().find(|p| p["name"] == "Migration").unwrap();
    assert_eq!(row["clients"]["name"], "Initech");
    assert_eq!(row["client_id"].as_i64().unwrap(), client_id);
}

#[tokio::test]
async fn project_for_unknown_client_is_a_store_error() {
    let base = spawn_api().await;
    let http = reqwest::Client::new();

    let resp = http
        .post(format!("{base}/api/projects"))
        .json(&json!({ "client_id": 424242, "name": "Orphan" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn tasks_filter_by_project_and_start_in_todo() {
    let base = spawn_api().await;
    let http = reqwest::Client::new();

    let client = create_client(&http, &base, "Hooli").await;
    let client_id = client["id"].as_i64().unwrap();
    let p1 = create_project(&http, &base, client_id, "Alpha").await;
    let p2 = create_project(&http, &base, client_id, "Beta").await;
    let p1_id = p1["id"].as_i64().unwrap();
    let p2_id = p2["id"].as_i64().unwrap();

    for (pid, title) in [(p1_id, "wireframes"), (p1_id, "backend"), (p2_id, "audit")] {
        let resp = http
            .post(format!("{base}/api/tasks"))
            .json(&json!({ "project_id": pid, "title": title }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let task: Value = resp.json().await.unwrap();
        assert_eq!(task["status"], "todo");
    }

    let rows: Vec<Value> = http
        .get(format!("{base}/api/tasks?project_id={p1_id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|t| t["project_id"].as_i64() == Some(p1_id)));

    let all: Vec<Value> = http
        .get(format!("{base}/api/tasks"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn pending_count_is_everything_not_done() {
    let base = spawn_api().await;
    let http = reqwest::Client::new();

    let client = create_client(&http, &base, "Umbrella").await;
    let project = create_project(&http, &base, client["id"].as_i64().unwrap(), "Lab").await;
    let pid = project["id"].as_i64().unwrap();

    let mut task_ids = Vec::new();
    for title in ["a", "b", "c"] {
        let task: Value = http
            .post(format!("{base}/api/tasks"))
            .json(&json!({ "project_id": pid, "title": title }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        task_ids.push(task["id"].as_i64().unwrap());
    }

    // a → done, b → in-progress (still pending), c untouched.
    let resp = http
        .put(format!("{base}/api/tasks/{}", task_ids[0]))
        .json(&json!({ "status": "done" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let resp = http
        .put(format!("{base}/api/tasks/{}", task_ids[1]))
        .json(&json!({ "status": "in-progress" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = http
        .get(format!("{base}/api/tasks/pending-count"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn done_tasks_cannot_be_reopened() {
    let base = spawn_api().await;
    let http = reqwest::Client::new();

    let client = create_client(&http, &base, "Stark").await;
    let project = create_project(&http, &base, client["id"].as_i64().unwrap(), "Suit").await;
    let task: Value = http
        .post(format!("{base}/api/tasks"))
        .json(&json!({ "project_id": project["id"], "title": "fit thrusters" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = task["id"].as_i64().unwrap();

    let resp = http
        .put(format!("{base}/api/tasks/{id}"))
        .json(&json!({ "status": "done" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = http
        .put(format!("{base}/api/tasks/{id}"))
        .json(&json!({ "status": "todo" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("invalid status transition"));

    // Re-asserting the current status is a no-op, not a violation.
    let resp = http
        .put(format!("{base}/api/tasks/{id}"))
        .json(&json!({ "status": "done" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn health_and_root_banner() {
    let base = spawn_api().await;
    let http = reqwest::Client::new();

    let body: Value = http
        .get(format!("{base}/api/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let text = http
        .get(format!("{base}/"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(text.contains("API is running"));
}
