//! Common test utilities for breach-scout-api integration tests
//!
//! This module provides:
//! - A fixed Ed25519 identity for signing interaction requests
//! - Builders for the payloads the mock breach provider returns
//! - Helpers that wire real pipeline components into an AppState

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use breach_scout_api::{AppState, ServiceConfig, ServiceMetrics};
use breach_scout_core::adapters::{FilesystemReportStore, InMemorySearchStore};
use breach_scout_core::lookup::{BreachLookupClient, LookupConfig};
use breach_scout_core::report::ReportStore;
use breach_scout_core::store::SearchStore;
use breach_scout_core::{
    ApiToken, CommandDispatcher, InteractionVerifier, MessageRenderer, SearchOrchestrator,
};
use ed25519_dalek::{Signer, SigningKey};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

// ============================================================================
// Fixed test identities
// ============================================================================

/// Seed for the deterministic interaction signing key
#[allow(dead_code)]
pub const TEST_KEY_SEED: [u8; 32] = [7u8; 32];

/// Bearer token the test bridge presents
#[allow(dead_code)]
pub const TEST_BRIDGE_TOKEN: &str = "test-bridge-token";

/// Provider token baked into the lookup configuration
#[allow(dead_code)]
pub const TEST_PROVIDER_TOKEN: &str = "test-provider-token";

/// External base URL report links are built under
#[allow(dead_code)]
pub const TEST_PUBLIC_BASE_URL: &str = "https://scout.example.com";

#[allow(dead_code)]
pub fn test_signing_key() -> SigningKey {
    SigningKey::from_bytes(&TEST_KEY_SEED)
}

#[allow(dead_code)]
pub fn test_public_key_hex() -> String {
    hex::encode(test_signing_key().verifying_key().to_bytes())
}

// ============================================================================
// Test Fixture Builders
// ============================================================================

/// Shared metrics collector.
///
/// The prometheus default registry rejects duplicate metric names, so all
/// tests in a binary register the collectors once and share them.
#[allow(dead_code)]
pub fn test_metrics() -> Arc<ServiceMetrics> {
    static METRICS: OnceLock<Arc<ServiceMetrics>> = OnceLock::new();
    METRICS
        .get_or_init(|| ServiceMetrics::new().expect("metrics registration failed"))
        .clone()
}

/// Service configuration pointing at the test identities
#[allow(dead_code)]
pub fn test_config(reports_path: &Path) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.discord.public_key = test_public_key_hex();
    config.revolt.webhook_token = TEST_BRIDGE_TOKEN.to_string();
    config.lookup.api_token = TEST_PROVIDER_TOKEN.to_string();
    config.reports.storage_path = reports_path.display().to_string();
    config.reports.public_base_url = TEST_PUBLIC_BASE_URL.to_string();
    config
}

/// Wire real pipeline components into an AppState.
///
/// The lookup client points at `lookup_endpoint`, normally a wiremock
/// server standing in for the breach provider. Overflow reports land
/// under `reports_path`.
#[allow(dead_code)]
pub fn create_test_app_state(lookup_endpoint: &str, reports_path: &Path) -> AppState {
    let report_store: Arc<dyn ReportStore> = Arc::new(FilesystemReportStore::new(reports_path));
    create_test_app_state_with_report_store(lookup_endpoint, reports_path, report_store)
}

/// Create a test AppState with a specific report store
#[allow(dead_code)]
pub fn create_test_app_state_with_report_store(
    lookup_endpoint: &str,
    reports_path: &Path,
    report_store: Arc<dyn ReportStore>,
) -> AppState {
    let config = test_config(reports_path);

    let lookup_config = LookupConfig::new(ApiToken::from_string(TEST_PROVIDER_TOKEN.to_string()))
        .with_endpoint_url(lookup_endpoint)
        .with_timeout(Duration::from_secs(2));
    let lookup_client = BreachLookupClient::new(lookup_config).expect("lookup client");

    let search_store: Arc<dyn SearchStore> = Arc::new(InMemorySearchStore::new());

    let orchestrator = Arc::new(SearchOrchestrator::new(
        Arc::new(lookup_client),
        Arc::clone(&search_store),
    ));
    let renderer = Arc::new(MessageRenderer::new(
        Arc::clone(&report_store),
        TEST_PUBLIC_BASE_URL,
    ));
    let dispatcher = Arc::new(CommandDispatcher::new(
        Arc::clone(&orchestrator),
        renderer,
        Arc::clone(&search_store),
    ));

    let verifier =
        InteractionVerifier::from_hex(&config.discord.public_key).expect("verifier key");

    AppState::new(
        config,
        dispatcher,
        orchestrator,
        search_store,
        report_store,
        verifier,
        ApiToken::from_string(TEST_BRIDGE_TOKEN.to_string()),
        test_metrics(),
    )
}

// ============================================================================
// Provider payload builders
// ============================================================================

/// Provider payload with one source holding `rows` credential records.
///
/// Row zero matches the query `victim0@example.com` on its Email field.
#[allow(dead_code)]
pub fn provider_payload(rows: usize) -> Value {
    let data: Vec<Value> = (0..rows)
        .map(|n| {
            json!({
                "Email": format!("victim{}@example.com", n),
                "Password": format!("hunter{}", n),
                "Date": "2021-06-01",
            })
        })
        .collect();

    json!({
        "List": {
            "Collection One": {
                "InfoLeak": "Credential dump circulating on public forums.",
                "Data": data,
            }
        }
    })
}

/// Provider payload carrying only the no-results sentinel source
#[allow(dead_code)]
pub fn no_results_payload() -> Value {
    json!({
        "List": {
            "No results found": {
                "InfoLeak": "No results found for your query.",
                "Data": [],
            }
        }
    })
}

/// Provider payload signalling a remote failure
#[allow(dead_code)]
pub fn error_code_payload(code: &str) -> Value {
    json!({ "Error code": code })
}

// ============================================================================
// Request builders
// ============================================================================

/// Build a signed interaction request the verifier accepts
#[allow(dead_code)]
pub fn signed_interaction_request(body: &Value) -> Request<Body> {
    signed_raw_interaction_request(&body.to_string())
}

/// Sign arbitrary body text, valid JSON or not
#[allow(dead_code)]
pub fn signed_raw_interaction_request(body_text: &str) -> Request<Body> {
    let timestamp = "1700000000";

    let mut message = Vec::with_capacity(timestamp.len() + body_text.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(body_text.as_bytes());
    let signature = test_signing_key().sign(&message);

    Request::builder()
        .method("POST")
        .uri("/interactions")
        .header("content-type", "application/json")
        .header("x-signature-ed25519", hex::encode(signature.to_bytes()))
        .header("x-signature-timestamp", timestamp)
        .body(Body::from(body_text.to_string()))
        .expect("interaction request")
}

/// Build an interaction request with no signature headers
#[allow(dead_code)]
pub fn unsigned_interaction_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/interactions")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("interaction request")
}

/// Build a bridge event delivery with the given Authorization header value
#[allow(dead_code)]
pub fn revolt_request(authorization: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/revolt")
        .header("content-type", "application/json");

    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }

    builder
        .body(Body::from(body.to_string()))
        .expect("bridge request")
}

/// A slash-command search interaction for the given query
#[allow(dead_code)]
pub fn search_interaction(query: &str) -> Value {
    json!({
        "type": 2,
        "data": {
            "name": "search",
            "options": [{ "name": "query", "value": query }],
        }
    })
}

// ============================================================================
// Response helpers
// ============================================================================

#[allow(dead_code)]
pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

#[allow(dead_code)]
pub async fn response_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    String::from_utf8(bytes.to_vec()).expect("response body should be UTF-8")
}
