//! Integration tests for routing and cross-cutting middleware
//!
//! Route-existence checks assert only that a path is wired, not what it
//! returns, so they stay valid as handler behavior evolves.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use breach_scout_api::create_router;
use common::{create_test_app_state, response_json};
use serde_json::json;
use tower::ServiceExt; // for `oneshot`
use wiremock::MockServer;

/// Verify that every public route is wired into the router
#[tokio::test]
async fn test_all_surface_routes_exist() {
    // Arrange
    let provider = MockServer::start().await;
    let reports_dir = tempfile::tempdir().expect("tempdir");
    let state = create_test_app_state(&provider.uri(), reports_dir.path());
    let app = create_router(state);

    // The report download route answers 404 for unknown IDs, so it is
    // covered by the report_storage tests instead of this sweep.
    let routes = [
        ("POST", "/interactions"),
        ("POST", "/revolt"),
        ("POST", "/api/search"),
        ("GET", "/api/stats"),
        ("GET", "/health"),
        ("GET", "/health/deep"),
        ("GET", "/ready"),
        ("GET", "/metrics"),
    ];

    for (method, path) in routes {
        // Act
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");

        // Assert
        assert_ne!(
            response.status(),
            StatusCode::NOT_FOUND,
            "{} {} should be routed",
            method,
            path
        );
        assert_ne!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "{} {} should accept this method",
            method,
            path
        );
    }
}

/// Verify that unknown paths fall through to 404
#[tokio::test]
async fn test_unknown_route_returns_not_found() {
    // Arrange
    let provider = MockServer::start().await;
    let reports_dir = tempfile::tempdir().expect("tempdir");
    let state = create_test_app_state(&provider.uri(), reports_dir.path());
    let app = create_router(state);

    // Act
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/does-not-exist")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    // Assert
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Verify that wrong verbs are rejected with 405, not 404
#[tokio::test]
async fn test_wrong_method_returns_method_not_allowed() {
    // Arrange
    let provider = MockServer::start().await;
    let reports_dir = tempfile::tempdir().expect("tempdir");
    let state = create_test_app_state(&provider.uri(), reports_dir.path());
    let app = create_router(state);

    for path in ["/interactions", "/revolt", "/api/search"] {
        // Act
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(path)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        // Assert
        assert_eq!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "GET {} should be rejected",
            path
        );
    }
}

/// Verify that every response carries a correlation ID header
#[tokio::test]
async fn test_responses_carry_correlation_id() {
    // Arrange
    let provider = MockServer::start().await;
    let reports_dir = tempfile::tempdir().expect("tempdir");
    let state = create_test_app_state(&provider.uri(), reports_dir.path());
    let app = create_router(state);

    // Act
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    // Assert
    let correlation_id = response
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(
        !correlation_id.is_empty(),
        "responses should carry a generated correlation ID"
    );
}

/// Verify that a caller-supplied correlation ID is echoed back
#[tokio::test]
async fn test_caller_correlation_id_is_echoed() {
    // Arrange
    let provider = MockServer::start().await;
    let reports_dir = tempfile::tempdir().expect("tempdir");
    let state = create_test_app_state(&provider.uri(), reports_dir.path());
    let app = create_router(state);

    let supplied = "11111111-2222-4333-8444-555555555555";

    // Act
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-correlation-id", supplied)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    // Assert
    assert_eq!(
        response
            .headers()
            .get("x-correlation-id")
            .and_then(|v| v.to_str().ok()),
        Some(supplied),
        "the caller's correlation ID should flow through"
    );
}

/// Verify that oversized request bodies are refused
#[tokio::test]
async fn test_oversized_body_rejected() {
    // Arrange: default body limit is 256KB
    let provider = MockServer::start().await;
    let reports_dir = tempfile::tempdir().expect("tempdir");
    let state = create_test_app_state(&provider.uri(), reports_dir.path());
    let app = create_router(state);

    let huge_query = "a".repeat(300 * 1024);
    let request = Request::builder()
        .method("POST")
        .uri("/api/search")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "query": huge_query }).to_string()))
        .expect("request");

    // Act
    let response = app.oneshot(request).await.expect("response");

    // Assert
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

/// Verify that the metrics endpoint serves the Prometheus exposition format
#[tokio::test]
async fn test_metrics_endpoint_exposes_http_counters() {
    // Arrange
    let provider = MockServer::start().await;
    let reports_dir = tempfile::tempdir().expect("tempdir");
    let state = create_test_app_state(&provider.uri(), reports_dir.path());
    let app = create_router(state);

    // Generate one measured request before scraping
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    // Act
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    // Assert
    assert_eq!(response.status(), StatusCode::OK);

    let exposition = common::response_text(response).await;
    assert!(
        exposition.contains("http_requests_total"),
        "exposition should include the request counter"
    );
}

/// Verify that API errors use the shared error envelope
#[tokio::test]
async fn test_error_envelope_shape() {
    // Arrange
    let provider = MockServer::start().await;
    let reports_dir = tempfile::tempdir().expect("tempdir");
    let state = create_test_app_state(&provider.uri(), reports_dir.path());
    let app = create_router(state);

    // Act
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/search")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "query": "" }).to_string()))
                .expect("request"),
        )
        .await
        .expect("response");

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response_json(response).await;
    assert!(body["error"].is_string(), "envelope should carry a label");
    assert!(
        body["message"].is_string(),
        "envelope should carry a message"
    );
    assert_eq!(body["status"], 400);
    assert!(
        body["timestamp"].is_string(),
        "envelope should be timestamped"
    );
}
