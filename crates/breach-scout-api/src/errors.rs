//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use breach_scout_core::{LookupError, ReportError, SearchError, ValidationError};
use tracing::{error, warn};

/// Request handler errors with HTTP status code mapping
///
/// This error type represents all possible request failures and maps them to
/// appropriate HTTP status codes following REST conventions:
///
/// - `400 Bad Request`: Client errors that are permanent and not retryable
///   (malformed payloads, validation failures)
/// - `401 Unauthorized`: Authentication failures; the body never reveals
///   which check failed
/// - `404 Not Found`: The requested report does not exist
/// - `502 Bad Gateway`: The breach provider answered but the answer was
///   unusable
/// - `503 Service Unavailable`: Transient failures that should be retried
/// - `500 Internal Server Error`: Unexpected server failures
///
/// # Security Considerations
///
/// Error messages returned to clients are sanitized to prevent information
/// disclosure. Provider errors in particular may carry endpoint URLs in
/// their message text, so only fixed phrasings reach the client. Detailed
/// error information is logged server-side.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request payload failed validation
    ///
    /// Maps to: `400 Bad Request` (permanent error, do not retry)
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// Authentication failed
    ///
    /// Maps to: `401 Unauthorized` with a uniform body. Missing headers,
    /// malformed signatures, and wrong credentials all produce the same
    /// response so callers cannot probe which check rejected them.
    #[error("Unauthorized")]
    Unauthorized,

    /// No report exists under the requested ID
    ///
    /// Maps to: `404 Not Found`. Syntactically invalid IDs get the same
    /// answer as unknown ones.
    #[error("Report not found: {report_id}")]
    ReportNotFound { report_id: String },

    /// The search pipeline failed
    ///
    /// Maps to:
    /// - `400 Bad Request` when the caller's input was rejected
    /// - `502 Bad Gateway` when the provider rejected the request or
    ///   answered with an unreadable payload
    /// - `503 Service Unavailable` when the provider could not be reached
    /// - `500 Internal Server Error` when recording the search failed
    #[error("Search failed: {0}")]
    Search(#[from] SearchError),

    /// Report storage failed
    ///
    /// Maps to:
    /// - `503 Service Unavailable` if the error is transient
    /// - `500 Internal Server Error` otherwise, including checksum failures
    #[error("Report storage failed: {0}")]
    Report(#[from] ReportError),

    /// Unexpected internal server error
    ///
    /// Maps to: `500 Internal Server Error`. Details are logged but a
    /// generic message is returned to the client.
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Determine HTTP status code and error message based on error type
        let (status, message, retry_after) = match self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string(), None),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), None),
            Self::ReportNotFound { ref report_id } => {
                warn!(report_id = %report_id, "Report not found");
                (StatusCode::NOT_FOUND, self.to_string(), None)
            }
            Self::Search(ref e) => search_error_response(e),
            Self::Report(ref e) => report_error_response(e),
            Self::Internal { ref message } => {
                // Log detailed error server-side but return generic message to client
                error!(error = %message, "Internal server error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error occurred. Please try again later.".to_string(),
                    None,
                )
            }
        };

        // Build JSON error response
        let body = serde_json::json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": message,
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        // Build response with appropriate headers
        let mut response = (status, Json(body)).into_response();

        // Add Retry-After header for retryable errors
        if let Some(retry_seconds) = retry_after {
            if let Ok(header_value) = retry_seconds.to_string().parse() {
                response.headers_mut().insert("Retry-After", header_value);
            }
        }

        response
    }
}

/// Map a search pipeline error to a status, client message, and retry hint
///
/// Provider error text can embed the endpoint URL, so the client messages
/// here are fixed phrasings. The full error is logged before mapping.
fn search_error_response(error: &SearchError) -> (StatusCode, String, Option<u64>) {
    match error {
        SearchError::Lookup { search_id, source } => {
            warn!(search_id = %search_id, error = %source, "Lookup failed");
            match source {
                LookupError::Validation(validation) => (
                    StatusCode::BAD_REQUEST,
                    format!("Invalid request: {}", validation),
                    None,
                ),
                LookupError::Configuration { .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The search backend is not configured.".to_string(),
                    None,
                ),
                LookupError::Transport { .. } => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "The breach provider is unreachable. Please try again later.".to_string(),
                    Some(30),
                ),
                LookupError::Remote { code } => (
                    StatusCode::BAD_GATEWAY,
                    format!("The breach provider rejected the request (code {}).", code),
                    None,
                ),
                LookupError::Malformed { .. } => (
                    StatusCode::BAD_GATEWAY,
                    "The breach provider returned an unreadable response.".to_string(),
                    None,
                ),
            }
        }
        SearchError::Store { search_id, source } => {
            error!(search_id = %search_id, error = %source, "Search storage failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "The search could not be recorded. Please try again later.".to_string(),
                None,
            )
        }
    }
}

/// Map a report storage error to a status, client message, and retry hint
fn report_error_response(error: &ReportError) -> (StatusCode, String, Option<u64>) {
    match error {
        ReportError::NotFound { report_id } => {
            warn!(report_id = %report_id, "Report not found in store");
            (
                StatusCode::NOT_FOUND,
                format!("Report not found: {}", report_id),
                None,
            )
        }
        ReportError::ChecksumMismatch { report_id, .. } => {
            error!(report_id = %report_id, "Stored report failed integrity verification");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Report failed integrity verification.".to_string(),
                None,
            )
        }
        _ if error.is_transient() => {
            warn!(error = %error, "Transient report storage failure");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Report storage is temporarily unavailable. Please try again later.".to_string(),
                Some(30),
            )
        }
        _ => {
            error!(error = %error, "Report storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Report storage failed. Please try again later.".to_string(),
                None,
            )
        }
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
