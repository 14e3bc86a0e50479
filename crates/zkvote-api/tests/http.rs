//! # HTTP Integration Tests for zkvote-api
//!
//! Drives the router with `oneshot`: health probes, admin authentication,
//! registration, ballot administration, vote casting and metrics.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use zkvote_api::config::ServiceConfig;
use zkvote_api::state::AppState;
use zkvote_core::{Clock, ManualClock};

const ADMIN: &str = "admin-test-token";

struct TestApp {
    router: Router,
    state: AppState,
    clock: Arc<ManualClock>,
}

fn test_app_with(admin_token: Option<&str>) -> TestApp {
    let clock = Arc::new(ManualClock::starting_now());
    let config = ServiceConfig {
        admin_token: admin_token.map(str::to_string),
        ..ServiceConfig::default()
    };
    let state = AppState::in_memory_with_clock(config, clock.clone()).unwrap();
    TestApp {
        router: zkvote_api::app(state.clone()),
        state,
        clock,
    }
}

fn test_app() -> TestApp {
    test_app_with(Some(ADMIN))
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request("POST", uri, body)).await
    }

    fn ballot_body(&self, open_offset: i64, close_offset: i64) -> Value {
        let now = self.clock.now();
        json!({
            "title": "Library opening hours",
            "open_at": now.plus_secs(open_offset),
            "close_at": now.plus_secs(close_offset),
            "options": ["Extend", "Keep"],
            "eligibility_criteria": "resident",
            "public_key": "ballot-key",
        })
    }

    async fn create_ballot(&self, open_offset: i64, close_offset: i64) -> u64 {
        let request = Request::builder()
            .method("POST")
            .uri("/v1/ballots")
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {ADMIN}"))
            .body(Body::from(
                self.ballot_body(open_offset, close_offset).to_string(),
            ))
            .unwrap();
        let (status, body) = self.send(request).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_u64().unwrap()
    }

    async fn register(&self, identity: &str) -> Value {
        let (status, body) = self
            .post(
                "/v1/voters",
                json!({ "identity": identity, "public_key": "registrar-key" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    async fn vote(&self, ballot: u64, voter: &Value, option: &str) -> (StatusCode, Value) {
        self.post(
            &format!("/v1/ballots/{ballot}/votes"),
            json!({
                "voter_handle": voter["voter_handle"],
                "credential_digest": voter["credential_digest"],
                "option": option,
                "voter_secret": "5a".repeat(32),
            }),
        )
        .await
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ── Health and metrics ──────────────────────────────────────────────

#[tokio::test]
async fn health_probes() {
    let app = test_app();
    let (status, body) = app.get("/health/liveness").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
    let (status, body) = app.get("/health/readiness").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ready".into()));
}

#[tokio::test]
async fn metrics_endpoint_serves_prometheus_text() {
    let app = test_app();
    app.get("/v1/ballots").await;
    let (status, body) = app.get("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap();
    assert!(text.contains("zkvote_http_requests_total"));
    assert!(text.contains("path=\"/v1/ballots\""));
}

// ── Admin authentication ────────────────────────────────────────────

#[tokio::test]
async fn admin_routes_are_disabled_without_a_token() {
    let app = test_app_with(None);
    let mut request = json_request("POST", "/v1/ballots", app.ballot_body(-60, 3600));
    request
        .headers_mut()
        .insert("authorization", "Bearer anything".parse().unwrap());
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn ballot_creation_requires_the_admin_token() {
    let app = test_app();
    let (status, body) = app.post("/v1/ballots", app.ballot_body(-60, 3600)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let mut request = json_request("POST", "/v1/ballots", app.ballot_body(-60, 3600));
    request
        .headers_mut()
        .insert("authorization", "Bearer wrong-token".parse().unwrap());
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.state.orchestrator.ballots().is_empty());
}

// ── Registration ────────────────────────────────────────────────────

#[tokio::test]
async fn registration_returns_handle_and_digest() {
    let app = test_app();
    let voter = app.register("citizen-0001").await;
    let handle = voter["voter_handle"].as_str().unwrap();
    assert_eq!(handle.len(), 64);
    assert_eq!(voter["credential_digest"].as_str().unwrap().len(), 64);

    let (status, body) = app.get(&format!("/v1/voters/{handle}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["registered"], true);
    assert!(body.get("credential_digest").is_none());
    assert!(!body.to_string().contains("citizen-0001"));
    assert_eq!(app.state.metrics.registrations("registered"), 1);
}

#[tokio::test]
async fn blank_identity_is_unprocessable() {
    let app = test_app();
    let (status, body) = app
        .post(
            "/v1/voters",
            json!({ "identity": "   ", "public_key": "registrar-key" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "IDENTITY_INVALID");
    assert_eq!(app.state.metrics.registrations("IDENTITY_INVALID"), 1);
}

#[tokio::test]
async fn repeated_idempotency_key_conflicts() {
    let app = test_app();
    let body = json!({ "identity": "citizen-0002", "public_key": "registrar-key" });
    let with_key = |body: &Value| {
        let mut r = json_request("POST", "/v1/voters", body.clone());
        r.headers_mut()
            .insert("idempotency-key", "reg-7f3a".parse().unwrap());
        r
    };

    let (status, _) = app.send(with_key(&body)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, reply) = app.send(with_key(&body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(reply["error"]["code"], "ALREADY_REGISTERED");
    assert_eq!(app.state.orchestrator.registry().len(), 1);
}

#[tokio::test]
async fn malformed_requests() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/v1/voters")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, body) = app.get("/v1/voters/not-a-handle").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = app.get(&format!("/v1/voters/{}", "0".repeat(64))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// ── Ballots ─────────────────────────────────────────────────────────

#[tokio::test]
async fn ballot_status_follows_the_clock() {
    let app = test_app();
    let id = app.create_ballot(60, 120).await;

    let (status, body) = app.get(&format!("/v1/ballots/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CREATED");
    assert_eq!(body["options"], json!(["Extend", "Keep"]));

    app.clock.advance_secs(60);
    let (_, body) = app.get(&format!("/v1/ballots/{id}")).await;
    assert_eq!(body["status"], "OPEN");

    app.clock.advance_secs(60);
    let (_, list) = app.get("/v1/ballots").await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["status"], "CLOSED");
}

#[tokio::test]
async fn invalid_ballot_spec_is_unprocessable() {
    let app = test_app();
    let mut spec = app.ballot_body(-60, 3600);
    spec["options"] = json!(["Only"]);
    let mut request = json_request("POST", "/v1/ballots", spec);
    request
        .headers_mut()
        .insert("authorization", format!("Bearer {ADMIN}").parse().unwrap());
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INVALID_BALLOT_SPEC");
}

#[tokio::test]
async fn unknown_ballot_is_not_found() {
    let app = test_app();
    let (status, body) = app.get("/v1/ballots/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    let (status, _) = app.get("/v1/ballots/99/pool").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Voting ──────────────────────────────────────────────────────────

#[tokio::test]
async fn vote_is_confirmed_once() {
    let app = test_app();
    let ballot = app.create_ballot(-60, 3600).await;
    let voter = app.register("citizen-0003").await;

    let (status, receipt) = app.vote(ballot, &voter, "Extend").await;
    assert_eq!(status, StatusCode::CREATED, "{receipt}");
    assert_eq!(receipt["ballot_id"], ballot);
    assert!(!receipt.to_string().contains("Extend"));

    let (status, pool) = app.get(&format!("/v1/ballots/{ballot}/pool")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pool["vote_count"], 1);
    assert_eq!(pool["merkle_root"], receipt["merkle_root"]);

    let (status, body) = app.vote(ballot, &voter, "Keep").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_VOTE");

    assert_eq!(app.state.metrics.votes("confirmed"), 1);
    assert_eq!(app.state.metrics.votes("DUPLICATE_VOTE"), 1);
}

#[tokio::test]
async fn vote_outside_the_window_is_forbidden() {
    let app = test_app();
    let ballot = app.create_ballot(300, 3600).await;
    let voter = app.register("citizen-0004").await;

    let (status, body) = app.vote(ballot, &voter, "Keep").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "INELIGIBLE");
}

#[tokio::test]
async fn revoked_voter_cannot_vote() {
    let app = test_app();
    let ballot = app.create_ballot(-60, 3600).await;
    let voter = app.register("citizen-0005").await;
    let handle = voter["voter_handle"].as_str().unwrap();

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/voters/{handle}"))
        .header("authorization", format!("Bearer {ADMIN}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/v1/voters/{handle}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.vote(ballot, &voter, "Keep").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "INELIGIBLE");
}

#[tokio::test]
async fn unknown_option_is_not_found() {
    let app = test_app();
    let ballot = app.create_ballot(-60, 3600).await;
    let voter = app.register("citizen-0006").await;
    let (status, body) = app.vote(ballot, &voter, "Demolish").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}
