//! Integration tests for the tunnel status-change operation
//!
//! Drives the router in-process against a SQLite in-memory database and a
//! wiremock NodePass agent.

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use npdash_api::{ApiServer, ApiServerConfig, NodePassClient};
use npdash_db::entities::{endpoint, tunnel, tunnel_operation_log};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};
use serde_json::{json, Value};
use tower::ServiceExt; // For `oneshot` method
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create an in-memory database with migrations applied
async fn create_test_db() -> DatabaseConnection {
    let db = npdash_db::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    npdash_db::migrate(&db).await.expect("Failed to run migrations");

    db
}

/// Helper to build the router under test
fn build_app(db: DatabaseConnection, nodepass: NodePassClient) -> axum::Router {
    let config = ApiServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(), // Random port
        enable_cors: false,
    };

    ApiServer::new(config, db, nodepass).build_router()
}

fn default_client() -> NodePassClient {
    NodePassClient::new().expect("client should build")
}

/// Helper to insert a tunnel and its owning endpoint
async fn seed_tunnel(
    db: &DatabaseConnection,
    id: i64,
    name: &str,
    agent_url: &str,
    instance_id: Option<&str>,
) -> tunnel::Model {
    let ep = endpoint::ActiveModel {
        name: Set("agent-1".to_string()),
        url: Set(agent_url.to_string()),
        api_path: Set("/api/v1".to_string()),
        api_key: Set("test-key".to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert endpoint");

    tunnel::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        endpoint_id: Set(ep.id),
        instance_id: Set(instance_id.map(String::from)),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to insert tunnel")
}

/// Helper to PATCH /api/tunnels/{id}/status and decode the response
async fn patch_status(app: axum::Router, id: &str, action: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(format!("/api/tunnels/{}/status", id))
        .method("PATCH")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "action": action }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    (status, value)
}

async fn log_count(db: &DatabaseConnection) -> u64 {
    tunnel_operation_log::Entity::find()
        .count(db)
        .await
        .expect("Failed to count log entries")
}

// ── Validation failures: no side effects ─────────────────────────────

#[tokio::test]
async fn test_non_integer_id_returns_400_without_side_effects() {
    let db = create_test_db().await;
    let app = build_app(db.clone(), default_client());

    let (status, body) = patch_status(app, "abc", "start").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "invalid tunnel id" }));
    assert_eq!(log_count(&db).await, 0);
}

#[tokio::test]
async fn test_unknown_action_returns_400_without_side_effects() {
    let db = create_test_db().await;
    let server = MockServer::start().await;
    seed_tunnel(&db, 1, "web", &server.uri(), Some("inst-1")).await;

    let app = build_app(db.clone(), default_client());

    for action in ["reboot", "Start", "STOP", ""] {
        let (status, body) = patch_status(app.clone(), "1", action).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "action {:?}", action);
        assert_eq!(
            body,
            json!({ "error": "invalid action, only start, stop and restart are supported" })
        );
    }

    assert_eq!(log_count(&db).await, 0);
    assert!(
        server.received_requests().await.unwrap().is_empty(),
        "agent must not be called for invalid actions"
    );
}

// ── Lookup failures: no audit entry ──────────────────────────────────

#[tokio::test]
async fn test_unknown_tunnel_returns_404_without_audit() {
    let db = create_test_db().await;
    let app = build_app(db.clone(), default_client());

    let (status, body) = patch_status(app, "999", "start").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "tunnel not found" }));
    assert_eq!(log_count(&db).await, 0);
}

#[tokio::test]
async fn test_missing_instance_id_returns_400_without_audit() {
    let db = create_test_db().await;
    let server = MockServer::start().await;
    seed_tunnel(&db, 1, "web", &server.uri(), None).await;

    let app = build_app(db.clone(), default_client());

    let (status, body) = patch_status(app, "1", "start").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "tunnel has no instance id" }));
    assert_eq!(log_count(&db).await, 0);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_instance_id_treated_as_missing() {
    let db = create_test_db().await;
    let server = MockServer::start().await;
    seed_tunnel(&db, 1, "web", &server.uri(), Some("")).await;

    let app = build_app(db.clone(), default_client());

    let (status, body) = patch_status(app, "1", "restart").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "tunnel has no instance id" }));
    assert_eq!(log_count(&db).await, 0);
}

// ── Success path ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_successful_start_records_and_responds() {
    let db = create_test_db().await;
    let server = MockServer::start().await;
    seed_tunnel(&db, 42, "web", &server.uri(), Some("abc")).await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/instances/abc"))
        .and(header("X-API-Key", "test-key"))
        .and(body_json(json!({ "action": "start" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "state": "running" })))
        .expect(1)
        .mount(&server)
        .await;

    let app = build_app(db.clone(), default_client());

    let (status, body) = patch_status(app, "42", "start").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "tunnel": 42,
            "nodepassData": { "state": "running" }
        })
    );

    let logs = tunnel_operation_log::Entity::find()
        .all(&db)
        .await
        .expect("Failed to query logs");

    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].tunnel_id, 42);
    assert_eq!(logs[0].tunnel_name, "web");
    assert_eq!(
        logs[0].action,
        tunnel_operation_log::OperationAction::Start
    );
    assert_eq!(
        logs[0].status,
        tunnel_operation_log::OperationStatus::Success
    );
    assert_eq!(logs[0].message, "Tunnel start succeeded");
}

// ── Remote failures: audited, surfaced as 500 ────────────────────────

#[tokio::test]
async fn test_failing_remote_call_records_error() {
    let db = create_test_db().await;
    let server = MockServer::start().await;
    seed_tunnel(&db, 42, "web", &server.uri(), Some("abc")).await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/instances/abc"))
        .respond_with(ResponseTemplate::new(503).set_body_string("instance unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let app = build_app(db.clone(), default_client());

    let (status, body) = patch_status(app, "42", "stop").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("failed to call NodePass API"));
    assert!(
        body["message"].as_str().unwrap().contains("503"),
        "message should carry the agent's status: {}",
        body["message"]
    );

    let logs = tunnel_operation_log::Entity::find()
        .all(&db)
        .await
        .expect("Failed to query logs");

    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].tunnel_id, 42);
    assert_eq!(logs[0].action, tunnel_operation_log::OperationAction::Stop);
    assert_eq!(
        logs[0].status,
        tunnel_operation_log::OperationStatus::Error
    );
    assert!(logs[0].message.starts_with("Tunnel stop failed:"));
}

#[tokio::test]
async fn test_remote_timeout_records_error() {
    let db = create_test_db().await;
    let server = MockServer::start().await;
    seed_tunnel(&db, 7, "slow", &server.uri(), Some("inst-slow")).await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/instances/inst-slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "state": "running" }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let nodepass = default_client().with_timeout(Duration::from_millis(100));
    let app = build_app(db.clone(), nodepass);

    let (status, body) = patch_status(app, "7", "restart").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));

    let logs = tunnel_operation_log::Entity::find()
        .all(&db)
        .await
        .expect("Failed to query logs");

    assert_eq!(logs.len(), 1);
    assert_eq!(
        logs[0].status,
        tunnel_operation_log::OperationStatus::Error
    );
    assert_eq!(
        logs[0].action,
        tunnel_operation_log::OperationAction::Restart
    );
}

// ── Precision normalization ──────────────────────────────────────────

#[tokio::test]
async fn test_wide_integers_normalized_in_response() {
    let db = create_test_db().await;
    let server = MockServer::start().await;

    // Beyond 2^53 - 1; a double-precision consumer would round both
    let wide_id: i64 = 9_007_199_254_740_993;
    seed_tunnel(&db, wide_id, "wide", &server.uri(), Some("inst-w")).await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/instances/inst-w"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": "running",
            "stats": { "tcp_rx": 9_007_199_254_740_995i64, "tcp_tx": 12 }
        })))
        .mount(&server)
        .await;

    let app = build_app(db.clone(), default_client());

    let (status, body) = patch_status(app, "9007199254740993", "start").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tunnel"], json!("9007199254740993"));
    assert_eq!(
        body["nodepassData"]["stats"]["tcp_rx"],
        json!("9007199254740995")
    );
    assert_eq!(body["nodepassData"]["stats"]["tcp_tx"], json!(12));
}
