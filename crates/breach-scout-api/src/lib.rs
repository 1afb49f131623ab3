//! # Breach Scout HTTP Service
//!
//! HTTP surfaces for the breach lookup pipeline.
//!
//! This service provides:
//! - Discord interactions endpoint with Ed25519 signature verification
//! - Revolt bridge endpoint with shared-token authentication
//! - REST endpoints for searches, statistics, and report downloads
//! - Health check and metrics endpoints

// Public modules
pub mod config;
pub mod discord;
pub mod errors;
pub mod metrics;
pub mod responses;
pub mod revolt;

pub use config::ServiceConfig;
pub use errors::{ApiError, ConfigError, ServiceError};
pub use metrics::ServiceMetrics;

use crate::{
    discord::handle_discord_interaction,
    responses::{
        HealthCheckResult, HealthResponse, ReadinessResponse, SearchRequest, SearchResponse,
        StatsResponse,
    },
    revolt::handle_revolt_event,
};
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Path, State},
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use breach_scout_core::{
    ApiToken, CommandDispatcher, CorrelationId, InteractionVerifier, ReportId, ReportStore,
    SearchError, SearchOrchestrator, SearchStore, ValidationError,
};
use prometheus::TextEncoder;
use std::{collections::HashMap, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, instrument, warn};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: ServiceConfig,

    /// Dispatcher that runs chat commands end to end
    pub dispatcher: Arc<CommandDispatcher>,

    /// Orchestrator for REST-initiated searches
    pub orchestrator: Arc<SearchOrchestrator>,

    /// Store holding search records and their results
    pub search_store: Arc<dyn SearchStore>,

    /// Store holding overflow reports
    pub report_store: Arc<dyn ReportStore>,

    /// Verifier for interaction request signatures
    pub verifier: InteractionVerifier,

    /// Bearer token the Revolt bridge must present
    pub revolt_token: ApiToken,

    /// Metrics collector for observability
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    /// Create new application state
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: ServiceConfig,
        dispatcher: Arc<CommandDispatcher>,
        orchestrator: Arc<SearchOrchestrator>,
        search_store: Arc<dyn SearchStore>,
        report_store: Arc<dyn ReportStore>,
        verifier: InteractionVerifier,
        revolt_token: ApiToken,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        Self {
            config,
            dispatcher,
            orchestrator,
            search_store,
            report_store,
            verifier,
            revolt_token,
            metrics,
        }
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the service router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let interaction_routes = Router::new()
        .route("/interactions", post(handle_discord_interaction))
        .route("/revolt", post(handle_revolt_event));

    let report_routes = Router::new().route("/reports/{report_id}", get(download_report));

    let api_routes = Router::new()
        .route("/api/search", post(handle_api_search))
        .route("/api/stats", get(get_statistics));

    let health_routes = Router::new()
        .route("/health", get(handle_health_check))
        .route("/health/deep", get(handle_deep_health_check))
        .route("/ready", get(handle_readiness_check));

    let observability_routes = Router::new().route("/metrics", get(metrics_endpoint));

    Router::new()
        .merge(interaction_routes)
        .merge(report_routes)
        .merge(api_routes)
        .merge(health_routes)
        .merge(observability_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(state.config.server.max_body_size))
                .layer(middleware::from_fn(request_logging_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
///
/// Validates the configuration, binds the listener, and serves until a
/// shutdown signal arrives. In-flight requests are allowed to complete
/// before the server exits.
pub async fn start_server(state: AppState) -> Result<(), ServiceError> {
    state.config.validate()?;

    let addr = state.config.server.bind_address();
    let shutdown_timeout =
        std::time::Duration::from_secs(state.config.server.shutdown_timeout_seconds);
    let app = create_router(state);

    let listener =
        tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: addr.clone(),
                message: e.to_string(),
            })?;

    info!("Starting HTTP server on {}", addr);

    let shutdown_signal = async move {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C signal handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
            },
            _ = terminate => {
                info!("Received SIGTERM, initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
            },
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

// ============================================================================
// REST Handlers
// ============================================================================

/// Execute a search through the REST surface
///
/// The query text itself is never logged; only its length appears in the
/// span.
#[instrument(skip(state, request), fields(query_len = request.query.len(), platform = ?request.platform))]
pub async fn handle_api_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(ApiError::Validation(ValidationError::Required {
            field: "query".to_string(),
        }));
    }

    match state.orchestrator.run(query, request.limit).await {
        Ok(outcome) => {
            state
                .metrics
                .record_search_outcome("success", Some(outcome.result_count as u64));
            info!(
                search_id = %outcome.search_id,
                result_count = outcome.result_count,
                "REST search completed"
            );

            Ok(Json(SearchResponse {
                success: true,
                search_id: outcome.search_id.as_str(),
                query: query.to_string(),
                result_count: outcome.result_count as u64,
                results: outcome.results,
                timestamp: chrono::Utc::now(),
            }))
        }
        Err(e) => {
            let outcome_label = match &e {
                SearchError::Lookup { .. } => "lookup_error",
                SearchError::Store { .. } => "store_error",
            };
            state.metrics.record_search_outcome(outcome_label, None);
            state.metrics.record_error(outcome_label, e.is_transient());
            Err(ApiError::Search(e))
        }
    }
}

/// Aggregate statistics across recorded searches
#[instrument(skip(state))]
pub async fn get_statistics(
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state
        .search_store
        .stats()
        .await
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to load search statistics: {}", e),
        })?;

    Ok(Json(StatsResponse {
        total_searches: stats.total_searches,
        total_results: stats.total_results,
        timestamp: chrono::Utc::now(),
    }))
}

/// Download a stored report as plain text
///
/// Syntactically invalid IDs get the same 404 as unknown ones so callers
/// cannot distinguish the two cases.
#[instrument(skip(state))]
pub async fn download_report(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> Result<Response, ApiError> {
    let parsed_id = match report_id.parse::<ReportId>() {
        Ok(id) => id,
        Err(_) => {
            state.metrics.report_download_failures.inc();
            return Err(ApiError::ReportNotFound { report_id });
        }
    };

    let stored = match state.report_store.get_report(&parsed_id).await {
        Ok(Some(stored)) => stored,
        Ok(None) => {
            state.metrics.report_download_failures.inc();
            return Err(ApiError::ReportNotFound {
                report_id: parsed_id.as_str(),
            });
        }
        Err(e) => {
            state.metrics.report_download_failures.inc();
            return Err(ApiError::Report(e));
        }
    };

    state.metrics.report_downloads_total.inc();
    info!(
        report_id = %parsed_id,
        size_bytes = stored.metadata.size_bytes,
        "Serving report download"
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", stored.metadata.filename),
        )
        .body(Body::from(stored.body))
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to build report response: {}", e),
        })
}

// ============================================================================
// Health Handlers
// ============================================================================

/// Basic liveness check
pub async fn handle_health_check(State(_state): State<AppState>) -> Json<HealthResponse> {
    let mut checks = HashMap::new();
    checks.insert(
        "service".to_string(),
        HealthCheckResult {
            healthy: true,
            message: "Service is running".to_string(),
            duration_ms: 0,
        },
    );

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        checks,
    })
}

/// Health check that probes storage dependencies
///
/// Returns 200 when every dependency check passes, 503 otherwise, so load
/// balancers can pull a degraded instance out of rotation.
#[instrument(skip(state))]
pub async fn handle_deep_health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let mut checks = HashMap::new();

    let start = std::time::Instant::now();
    let report_check = match state.report_store.health_check().await {
        Ok(()) => HealthCheckResult {
            healthy: true,
            message: "Report store is reachable".to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
        },
        Err(e) => HealthCheckResult {
            healthy: false,
            message: format!("Report store check failed: {}", e),
            duration_ms: start.elapsed().as_millis() as u64,
        },
    };
    checks.insert("report_store".to_string(), report_check);

    let start = std::time::Instant::now();
    let search_check = match state.search_store.stats().await {
        Ok(_) => HealthCheckResult {
            healthy: true,
            message: "Search store is reachable".to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
        },
        Err(e) => HealthCheckResult {
            healthy: false,
            message: format!("Search store check failed: {}", e),
            duration_ms: start.elapsed().as_millis() as u64,
        },
    };
    checks.insert("search_store".to_string(), search_check);

    let healthy = checks.values().all(|check| check.healthy);
    let status = if healthy { "healthy" } else { "degraded" };
    if !healthy {
        warn!("Deep health check reported degraded status");
    }

    let response = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        checks,
    };

    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(response))
}

/// Readiness check for deployment orchestration
pub async fn handle_readiness_check(State(_state): State<AppState>) -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        ready: true,
        timestamp: chrono::Utc::now(),
    })
}

// ============================================================================
// Observability Handlers
// ============================================================================

/// Prometheus metrics in text exposition format
pub async fn metrics_endpoint() -> Result<String, StatusCode> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    encoder.encode_to_string(&metric_families).map_err(|e| {
        error!(error = %e, "Failed to encode metrics");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware with correlation ID tracking
///
/// This middleware:
/// - Extracts or generates correlation IDs for request tracking
/// - Logs request start and completion with structured fields
/// - Propagates correlation ID through response headers
#[instrument(skip(request, next), fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    // Extract or generate correlation ID
    let correlation_id = request
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| CorrelationId::new().as_str());

    // Record correlation ID in span
    tracing::Span::current().record("correlation_id", correlation_id.as_str());

    // Add correlation ID to request extensions for downstream handlers
    request.extensions_mut().insert(correlation_id.clone());

    info!(
        correlation_id = %correlation_id,
        method = %method,
        uri = %uri,
        "Request started"
    );

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    // Add correlation ID to response headers
    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert("x-correlation-id", header_value);
    }

    let status = response.status();

    // Log at appropriate level based on status code
    if status.is_server_error() {
        error!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        warn!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        info!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed successfully"
        );
    }

    response
}

/// Metrics collection middleware
///
/// Records request counts, durations, and payload sizes against the shared
/// metrics registry. Paths are normalized before use so report IDs do not
/// explode metric cardinality.
#[instrument(skip(state, request, next), fields(
    method = %request.method(),
    path
))]
async fn metrics_middleware(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let start = std::time::Instant::now();
    let method = request.method().clone();
    let uri = request.uri().path().to_string();

    // Normalize path for metrics (remove IDs, keep structure)
    // This prevents cardinality explosion in metrics
    let normalized_path = normalize_path_for_metrics(&uri);
    tracing::Span::current().record("path", normalized_path.as_str());

    let request_size = content_length(request.headers());

    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();
    let response_size = content_length(response.headers());

    state
        .metrics
        .record_http_request(duration, request_size, response_size);

    info!(
        method = %method,
        path = %normalized_path,
        status = %status,
        duration_ms = %duration.as_millis(),
        request_size = %request_size,
        response_size = %response_size,
        "HTTP request metrics"
    );

    response
}

fn content_length(headers: &HeaderMap) -> u64 {
    headers
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0)
}

/// Check if a path segment looks like a ULID
///
/// ULIDs are 26 characters of Crockford base32: digits and letters
/// excluding I, L, O, and U. Lowercase is accepted because IDs survive
/// being pasted either way.
fn is_ulid_like(s: &str) -> bool {
    if s.len() != 26 {
        return false;
    }

    s.chars().all(|ch| {
        let ch = ch.to_ascii_uppercase();
        ch.is_ascii_digit() || (ch.is_ascii_uppercase() && !matches!(ch, 'I' | 'L' | 'O' | 'U'))
    })
}

/// Normalize path for metrics to avoid cardinality explosion
///
/// Converts paths like `/reports/01ARZ3NDEKTSV4RRFFQ69G5FAV` to
/// `/reports/:id`
fn normalize_path_for_metrics(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    let normalized: Vec<String> = segments
        .iter()
        .map(|segment| {
            // Skip empty segments (from leading/trailing slashes)
            if segment.is_empty() {
                segment.to_string()
            }
            // Check if segment looks like a numeric ID
            else if segment.chars().all(|c| c.is_ascii_digit()) {
                ":id".to_string()
            }
            // Check if segment looks like a ULID
            else if is_ulid_like(segment) {
                ":id".to_string()
            } else {
                segment.to_string()
            }
        })
        .collect();

    normalized.join("/")
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
