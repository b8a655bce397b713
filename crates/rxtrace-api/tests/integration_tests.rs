//! # Integration Tests for rxtrace-api
//!
//! Drives the assembled router with `tower::ServiceExt::oneshot`: health
//! probes, authentication, the shipment custody walk, production batches,
//! the actor directory, alert correlation and the summary hand-off.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rxtrace_api::db::ItemJournal;
use rxtrace_api::state::{AppConfig, AppState};
use rxtrace_ledger::Snapshot;
use rxtrace_summary::{SummaryClient, SummaryConfig};

// -- Helpers ------------------------------------------------------------------

fn world() -> Snapshot {
    serde_json::from_value(json!({
        "actors": [
            {"id": "a-alice", "name": "Alice Manufacturer", "role": "manufacturer", "location": "Basel"},
            {"id": "a-dan", "name": "Dan Distributor", "role": "distributor", "location": "Frankfurt"},
            {"id": "a-phil", "name": "Phil Pharmacy", "role": "pharmacy", "location": "Berlin"},
            {"id": "a-rita", "name": "Rita Regulator", "role": "regulator", "location": "Silver Spring"}
        ],
        "alerts": [
            {"alertId": "A-1", "batchId": "SHP-1", "timestamp": "2026-03-01T08:00:00Z",
             "type": "Temperature Excursion", "severity": "High", "details": "9.1C for 50 minutes"},
            {"alertId": "A-2", "batchId": "SHP-1", "timestamp": "2026-03-01T09:00:00Z",
             "type": "Shock", "severity": "Low", "details": "2.1g"},
            {"alertId": "A-3", "batchId": "GHOST-9", "timestamp": "2026-03-02T09:00:00Z",
             "type": "Tamper", "severity": "Medium", "details": "seal broken"}
        ]
    }))
    .unwrap()
}

fn state_with(config: AppConfig) -> AppState {
    AppState::from_snapshot(config, world(), ItemJournal::Volatile, None).unwrap()
}

/// Build the test app with auth disabled and no summary client.
fn test_app() -> axum::Router {
    rxtrace_api::app(state_with(AppConfig::default()))
}

/// Build the test app with auth enabled.
fn test_app_with_auth(token: &str) -> axum::Router {
    rxtrace_api::app(state_with(AppConfig {
        auth_token: Some(token.to_string()),
        ..AppConfig::default()
    }))
}

async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::http::Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

async fn get(app: &axum::Router, uri: &str) -> axum::http::Response<Body> {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post(app: &axum::Router, uri: &str, body: Value) -> axum::http::Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn transition(app: &axum::Router, id: &str, actor: &str, status: &str) -> (StatusCode, Value) {
    let response = post(
        app,
        &format!("/v1/shipments/{id}/transition"),
        json!({"actorId": actor, "status": status}),
    )
    .await;
    (response.status(), body_json(response).await)
}

async fn create_shipment(app: &axum::Router, id: &str) {
    let response = post(
        app,
        "/v1/shipments",
        json!({"id": id, "actorId": "a-alice", "productName": "Amoxicillin 500mg", "destination": "Frankfurt"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

// -- Health, Metrics, OpenAPI -------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let response = get(&test_app(), "/health/liveness").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let response = get(&test_app(), "/health/readiness").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

#[tokio::test]
async fn test_metrics_endpoint_is_unauthenticated() {
    let app = test_app_with_auth("secret");
    let response = get(&app, "/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let response = get(&test_app(), "/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert_eq!(doc["info"]["title"], "rxtrace API");
    assert!(doc["paths"]["/v1/shipments"].is_object());
}

// -- Authentication -----------------------------------------------------------

#[tokio::test]
async fn test_auth_rejects_missing_token() {
    let response = get(&test_app_with_auth("secret"), "/v1/actors").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_auth_accepts_valid_token() {
    let app = test_app_with_auth("secret");
    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/actors")
                .header("authorization", "Bearer secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_bypasses_auth() {
    let response = get(&test_app_with_auth("secret"), "/health/liveness").await;
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Shipments ----------------------------------------------------------------

#[tokio::test]
async fn test_create_shipment_starts_pending_with_holder() {
    let app = test_app();
    let response = post(
        &app,
        "/v1/shipments",
        json!({"id": "SHP-1", "actorId": "a-alice", "productName": "Amoxicillin 500mg", "destination": "Frankfurt"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let item = body_json(response).await;
    assert_eq!(item["id"], "SHP-1");
    assert_eq!(item["version"], 1);
    assert_eq!(item["phase"], "in_custody");
    assert_eq!(item["custody"]["status"], "PENDING");
    assert_eq!(item["custody"]["currentHolderName"], "Alice Manufacturer");
    assert_eq!(item["custody"]["originLocation"], "Basel");
}

#[tokio::test]
async fn test_create_shipment_generates_id() {
    let app = test_app();
    let response = post(
        &app,
        "/v1/shipments",
        json!({"actorId": "a-alice", "productName": "Ibuprofen", "destination": "Frankfurt"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let item = body_json(response).await;
    assert!(item["id"].as_str().unwrap().starts_with("SHP-"));
}

#[tokio::test]
async fn test_create_shipment_duplicate_id_conflicts() {
    let app = test_app();
    create_shipment(&app, "SHP-1").await;
    let response = post(
        &app,
        "/v1/shipments",
        json!({"id": "SHP-1", "actorId": "a-alice", "productName": "X", "destination": "Frankfurt"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"]["code"], "ALREADY_EXISTS");
}

#[tokio::test]
async fn test_create_shipment_by_regulator_forbidden() {
    let app = test_app();
    let response = post(
        &app,
        "/v1/shipments",
        json!({"id": "SHP-R", "actorId": "a-rita", "productName": "X", "destination": "Frankfurt"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_shipment_blank_destination_is_validation_error() {
    let app = test_app();
    let response = post(
        &app,
        "/v1/shipments",
        json!({"actorId": "a-alice", "productName": "X", "destination": "  "}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/shipments")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ship_to_sole_distributor() {
    let app = test_app();
    create_shipment(&app, "SHP-1").await;
    let (status, body) = transition(&app, "SHP-1", "a-alice", "IN_TRANSIT").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["shipment"]["custody"]["status"], "IN_TRANSIT");
    assert_eq!(body["shipment"]["custody"]["currentHolderName"], "Dan Distributor");
    assert_eq!(body["shipment"]["version"], 2);
}

#[tokio::test]
async fn test_approval_walk_and_delivery() {
    let app = test_app();
    create_shipment(&app, "SHP-1").await;

    let (status, _) = transition(&app, "SHP-1", "a-alice", "Requires-Approval").await;
    assert_eq!(status, StatusCode::OK);

    // Regulator release keeps the holder from before the hold.
    let (status, body) = transition(&app, "SHP-1", "a-rita", "IN_TRANSIT").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["shipment"]["custody"]["currentHolderName"], "Alice Manufacturer");

    // Someone with no standing cannot deliver.
    let (status, body) = transition(&app, "SHP-1", "a-phil", "DELIVERED").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["ok"], false);
    assert_eq!(body["errorKind"], "UNAUTHORIZED");

    // The actor at the destination takes delivery.
    let (status, body) = transition(&app, "SHP-1", "a-dan", "DELIVERED").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["shipment"]["custody"]["status"], "DELIVERED");
    assert_eq!(body["shipment"]["custody"]["currentHolderName"], "Dan Distributor");

    let response = get(&app, "/v1/shipments/SHP-1/history").await;
    let history = body_json(response).await;
    let statuses: Vec<_> = history["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["status"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(statuses, ["PENDING", "REQUIRES_APPROVAL", "IN_TRANSIT", "DELIVERED"]);
}

#[tokio::test]
async fn test_transition_from_terminal_is_invalid() {
    let app = test_app();
    create_shipment(&app, "SHP-1").await;
    transition(&app, "SHP-1", "a-alice", "IN_TRANSIT").await;
    transition(&app, "SHP-1", "a-dan", "DELIVERED").await;
    let (status, body) = transition(&app, "SHP-1", "a-dan", "PENDING").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["errorKind"], "INVALID_TRANSITION");
}

#[tokio::test]
async fn test_transition_unknown_item_and_actor() {
    let app = test_app();
    let (status, body) = transition(&app, "SHP-404", "a-alice", "IN_TRANSIT").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errorKind"], "NOT_FOUND");

    create_shipment(&app, "SHP-1").await;
    let (status, _) = transition(&app, "SHP-1", "a-nobody", "IN_TRANSIT").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transition_unknown_status_is_validation_error() {
    let app = test_app();
    create_shipment(&app, "SHP-1").await;
    let (status, body) = transition(&app, "SHP-1", "a-alice", "LOST_AT_SEA").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["ok"], false);
    assert_eq!(body["errorKind"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_rejected_transition_leaves_item_unchanged() {
    let app = test_app();
    create_shipment(&app, "SHP-1").await;
    transition(&app, "SHP-1", "a-phil", "IN_TRANSIT").await;
    let item = body_json(get(&app, "/v1/shipments/SHP-1").await).await;
    assert_eq!(item["version"], 1);
    assert_eq!(item["custody"]["status"], "PENDING");
}

#[tokio::test]
async fn test_available_transitions_per_actor() {
    let app = test_app();
    create_shipment(&app, "SHP-1").await;
    let response = get(&app, "/v1/shipments/SHP-1/transitions?actorId=a-alice").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["position"], "HOLDER");
    assert_eq!(body["available"], json!(["IN_TRANSIT", "REQUIRES_APPROVAL"]));

    let body = body_json(get(&app, "/v1/shipments/SHP-1/transitions?actorId=a-phil").await).await;
    assert_eq!(body["position"], "OUTSIDER");
    assert_eq!(body["available"], json!([]));
}

#[tokio::test]
async fn test_list_shipments_with_filters_and_alert_counts() {
    let app = test_app();
    create_shipment(&app, "SHP-1").await;
    create_shipment(&app, "SHP-2").await;
    transition(&app, "SHP-2", "a-alice", "IN_TRANSIT").await;

    let rows = body_json(get(&app, "/v1/shipments").await).await;
    assert_eq!(rows.as_array().unwrap().len(), 2);
    assert_eq!(rows[0]["id"], "SHP-1");
    assert_eq!(rows[0]["alertCount"], 2);
    assert_eq!(rows[1]["alertCount"], 0);

    let rows = body_json(get(&app, "/v1/shipments?status=In-Transit").await).await;
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["id"], "SHP-2");

    let rows = body_json(get(&app, "/v1/shipments?holder=Alice%20Manufacturer").await).await;
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["id"], "SHP-1");

    let rows = body_json(get(&app, "/v1/shipments?holder=alice%20manufacturer").await).await;
    assert!(rows.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_unknown_shipment_is_404() {
    let response = get(&test_app(), "/v1/shipments/NOPE-1").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_forward_delivered_shipment() {
    let app = test_app();
    create_shipment(&app, "SHP-1").await;
    transition(&app, "SHP-1", "a-alice", "IN_TRANSIT").await;

    // Not yet delivered.
    let response = post(
        &app,
        "/v1/shipments/SHP-1/forward",
        json!({"id": "SHP-1B", "actorId": "a-dan", "destination": "Berlin"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    transition(&app, "SHP-1", "a-dan", "DELIVERED").await;
    let response = post(
        &app,
        "/v1/shipments/SHP-1/forward",
        json!({"id": "SHP-1B", "actorId": "a-dan", "destination": "Berlin", "shipNow": true}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let item = body_json(response).await;
    assert_eq!(item["custody"]["parent"], "SHP-1");
    assert_eq!(item["custody"]["originLocation"], "Frankfurt");
    assert_eq!(item["custody"]["status"], "IN_TRANSIT");
    assert_eq!(item["custody"]["currentHolderName"], "Phil Pharmacy");
}

// -- Batches ------------------------------------------------------------------

#[tokio::test]
async fn test_batch_lifecycle() {
    let app = test_app();
    let response = post(
        &app,
        "/v1/batches",
        json!({
            "id": "LOT-7", "actorId": "a-alice", "drugName": "Amoxicillin 500mg",
            "quantity": 1200, "manufactureDate": "2026-01-10", "expiryDate": "2028-01-10"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let item = body_json(response).await;
    assert_eq!(item["phase"], "pre_custody");
    assert_eq!(item["batch"]["status"], "IN_PRODUCTION");

    // Not ready yet.
    let response = post(
        &app,
        "/v1/batches/LOT-7/ship",
        json!({"actorId": "a-alice", "destination": "Frankfurt"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post(&app, "/v1/batches/LOT-7/advance", json!({"actorId": "a-alice"})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let rows = body_json(get(&app, "/v1/batches").await).await;
    assert_eq!(rows[0]["status"], "READY_FOR_SHIPMENT");
    assert_eq!(rows[0]["quantity"], 1200);

    let response = post(
        &app,
        "/v1/batches/LOT-7/ship",
        json!({"actorId": "a-alice", "destination": "Frankfurt", "shipNow": true}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let item = body_json(response).await;
    assert_eq!(item["custody"]["status"], "IN_TRANSIT");
    assert_eq!(item["custody"]["lot"]["quantity"], 1200);

    let rows = body_json(get(&app, "/v1/batches").await).await;
    assert_eq!(rows.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_register_batch_rejects_inverted_dates() {
    let app = test_app();
    let response = post(
        &app,
        "/v1/batches",
        json!({
            "actorId": "a-alice", "drugName": "X", "quantity": 10,
            "manufactureDate": "2026-01-10", "expiryDate": "2025-01-10"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_register_batch_requires_manufacturer() {
    let app = test_app();
    let response = post(
        &app,
        "/v1/batches",
        json!({
            "actorId": "a-dan", "drugName": "X", "quantity": 10,
            "manufactureDate": "2026-01-10", "expiryDate": "2027-01-10"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// -- Actors -------------------------------------------------------------------

#[tokio::test]
async fn test_list_actors_and_role_filter() {
    let app = test_app();
    let all = body_json(get(&app, "/v1/actors").await).await;
    assert_eq!(all.as_array().unwrap().len(), 4);
    assert_eq!(all[0]["name"], "Alice Manufacturer");

    let distributors = body_json(get(&app, "/v1/actors?role=distributor").await).await;
    assert_eq!(distributors.as_array().unwrap().len(), 1);
    assert_eq!(distributors[0]["id"], "a-dan");

    let response = get(&app, "/v1/actors?role=wizard").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_receivers_follow_role_successor() {
    let app = test_app();
    let receivers = body_json(get(&app, "/v1/actors/a-alice/receivers").await).await;
    assert_eq!(receivers[0]["name"], "Dan Distributor");

    let receivers = body_json(get(&app, "/v1/actors/a-rita/receivers").await).await;
    assert_eq!(receivers, json!([]));

    let response = get(&app, "/v1/actors/a-ghost/receivers").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Alerts -------------------------------------------------------------------

#[tokio::test]
async fn test_item_alerts_and_counts() {
    let app = test_app();
    create_shipment(&app, "SHP-1").await;

    let alerts = body_json(get(&app, "/v1/shipments/SHP-1/alerts").await).await;
    let ids: Vec<_> = alerts
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["alertId"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, ["A-1", "A-2"]);

    let counts = body_json(get(&app, "/v1/shipments/SHP-1/alerts/counts").await).await;
    assert_eq!(counts["counts"], json!({"Low": 1, "Medium": 0, "High": 1}));
    assert_eq!(counts["total"], 2);
    assert_eq!(counts["highest"], "High");
    assert_eq!(counts["summaryOffered"], true);
}

#[tokio::test]
async fn test_orphaned_alerts() {
    let app = test_app();
    create_shipment(&app, "SHP-1").await;
    let orphans = body_json(get(&app, "/v1/alerts?orphaned=true").await).await;
    assert_eq!(orphans.as_array().unwrap().len(), 1);
    assert_eq!(orphans[0]["batchId"], "GHOST-9");

    let all = body_json(get(&app, "/v1/alerts").await).await;
    assert_eq!(all.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_summary_without_client_is_503() {
    let app = test_app();
    create_shipment(&app, "SHP-1").await;
    let response = post(&app, "/v1/shipments/SHP-1/alerts/summary", json!({})).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

async fn app_with_summarizer(server: &MockServer) -> axum::Router {
    let client = SummaryClient::new(SummaryConfig::new(&server.uri()).unwrap()).unwrap();
    rxtrace_api::app(state_with(AppConfig::default()).with_summary(client))
}

#[tokio::test]
async fn test_summary_with_no_alerts_is_409() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let app = app_with_summarizer(&server).await;
    create_shipment(&app, "SHP-2").await;
    let response = post(&app, "/v1/shipments/SHP-2/alerts/summary", json!({})).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"]["code"], "NO_ALERTS");
}

#[tokio::test]
async fn test_summary_via_collaborator() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/summaries"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"summary": "One cold-chain breach."})),
        )
        .expect(1)
        .mount(&server)
        .await;
    let app = app_with_summarizer(&server).await;
    create_shipment(&app, "SHP-1").await;
    let response = post(&app, "/v1/shipments/SHP-1/alerts/summary", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["summary"], "One cold-chain breach.");
    assert_eq!(body["alertCount"], 2);
}

#[tokio::test]
async fn test_summary_upstream_failure_is_502() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/summaries"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    let app = app_with_summarizer(&server).await;
    create_shipment(&app, "SHP-1").await;
    let response = post(&app, "/v1/shipments/SHP-1/alerts/summary", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
