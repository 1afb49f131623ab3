//! Tests for HTTP error mapping

use super::*;
use axum::body::to_bytes;
use breach_scout_core::{ReportId, SearchId, StoreError};
use serde_json::Value;

/// Read a response body as parsed JSON
async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

fn lookup_error(source: LookupError) -> ApiError {
    ApiError::Search(SearchError::Lookup {
        search_id: SearchId::new(),
        source,
    })
}

mod status_mapping_tests {
    use super::*;

    /// Validation failures are permanent client errors
    #[tokio::test]
    async fn validation_maps_to_bad_request() {
        let error = ApiError::Validation(ValidationError::Required {
            field: "query".to_string(),
        });

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["status"], 400);
        assert!(
            body["message"].as_str().unwrap().contains("query"),
            "Error should name the offending field"
        );
    }

    /// All authentication failures produce the same uniform body
    #[tokio::test]
    async fn unauthorized_body_is_uniform() {
        let response = ApiError::Unauthorized.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Unauthorized");
        assert_eq!(body["message"], "Unauthorized");
    }

    /// Unknown reports are a 404 with the requested ID echoed back
    #[tokio::test]
    async fn report_not_found_maps_to_not_found() {
        let error = ApiError::ReportNotFound {
            report_id: "01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string(),
        };

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    /// Store failures surface as internal errors with a fixed message
    #[tokio::test]
    async fn store_error_maps_to_internal() {
        let error = ApiError::Search(SearchError::Store {
            search_id: SearchId::new(),
            source: StoreError::Backend {
                message: "disk quota exceeded on /var/lib/scout".to_string(),
            },
        });

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(
            !body["message"].as_str().unwrap().contains("disk quota"),
            "Backend detail should not leak to the client"
        );
    }

    /// Internal errors hide their detail behind a generic message
    #[tokio::test]
    async fn internal_error_hides_detail() {
        let error = ApiError::Internal {
            message: "renderer panicked at line 42".to_string(),
        };

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(!body["message"].as_str().unwrap().contains("line 42"));
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("Internal server error"));
    }
}

mod lookup_mapping_tests {
    use super::*;

    /// Unreachable providers are transient and carry a retry hint
    #[tokio::test]
    async fn transport_maps_to_service_unavailable_with_retry() {
        let error = lookup_error(LookupError::Transport {
            message: "connect error to https://internal-host:443/".to_string(),
        });

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok()),
            Some("30"),
            "Transient failures should carry a Retry-After header"
        );

        let body = body_json(response).await;
        let message = body["message"].as_str().unwrap();
        assert!(message.contains("unreachable"));
        assert!(
            !message.contains("internal-host"),
            "Transport detail should not leak to the client"
        );
    }

    /// Provider error codes map to a bad gateway with the code included
    #[tokio::test]
    async fn remote_error_maps_to_bad_gateway() {
        let error = lookup_error(LookupError::Remote {
            code: "401".to_string(),
        });

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(
            response.headers().get("Retry-After").is_none(),
            "Permanent provider errors should not advertise retries"
        );
        let body = body_json(response).await;
        assert!(body["message"].as_str().unwrap().contains("401"));
    }

    /// Unreadable provider payloads map to a bad gateway
    #[tokio::test]
    async fn malformed_payload_maps_to_bad_gateway() {
        let error = lookup_error(LookupError::Malformed {
            message: "List is not an object".to_string(),
        });

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    /// Input rejected by the lookup layer is the caller's fault
    #[tokio::test]
    async fn lookup_validation_maps_to_bad_request() {
        let error = lookup_error(LookupError::Validation(ValidationError::Required {
            field: "query".to_string(),
        }));

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    /// Missing backend configuration is a server fault, not the caller's
    #[tokio::test]
    async fn configuration_maps_to_internal() {
        let error = lookup_error(LookupError::Configuration {
            message: "api token is empty".to_string(),
        });

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

mod report_mapping_tests {
    use super::*;

    /// Corrupted reports are an internal error, never served
    #[tokio::test]
    async fn checksum_mismatch_maps_to_internal() {
        let error = ApiError::Report(ReportError::ChecksumMismatch {
            report_id: ReportId::new(),
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        });

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("integrity verification"));
    }

    /// Transient storage failures advertise a retry
    #[tokio::test]
    async fn transient_storage_maps_to_service_unavailable() {
        let error = ApiError::Report(ReportError::InternalError {
            message: "temporary write failure".to_string(),
        });

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().get("Retry-After").is_some());
    }

    /// Serialization failures are permanent internal errors
    #[tokio::test]
    async fn serialization_failure_maps_to_internal() {
        let error = ApiError::Report(ReportError::SerializationFailed {
            message: "invalid UTF-8".to_string(),
        });

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

mod body_shape_tests {
    use super::*;

    /// Every error body carries error, message, status, and timestamp fields
    #[tokio::test]
    async fn error_body_has_standard_fields() {
        let response = ApiError::Unauthorized.into_response();
        let body = body_json(response).await;

        assert!(body["error"].is_string());
        assert!(body["message"].is_string());
        assert!(body["status"].is_number());
        assert!(
            body["timestamp"].is_string(),
            "Timestamp should be an RFC 3339 string"
        );
    }
}
