//! Request and response types for the REST API

use breach_scout_core::NormalizedResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Search request body for the REST endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Text to look up: an email, username, phone number, or password
    pub query: String,

    /// Maximum number of sources to return
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    /// Caller-declared origin, recorded for audit only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

/// Search response for the REST endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Always true; failures use the error envelope instead
    pub success: bool,

    /// Identifier of the recorded search
    pub search_id: String,

    /// Query text as executed, after trimming
    pub query: String,

    /// Number of normalized results
    pub result_count: u64,

    /// Normalized results in provider order
    pub results: Vec<NormalizedResult>,

    /// When the response was produced
    pub timestamp: DateTime<Utc>,
}

/// Aggregate statistics response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Searches recorded since startup
    pub total_searches: u64,

    /// Results across all finalized searches
    pub total_results: u64,

    /// When the response was produced
    pub timestamp: DateTime<Utc>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "degraded"
    pub status: String,

    /// Service version
    pub version: String,

    /// When the checks ran
    pub timestamp: DateTime<Utc>,

    /// Individual check results by component name
    pub checks: HashMap<String, HealthCheckResult>,
}

/// Individual health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Whether the check passed
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,

    /// How long the check took
    pub duration_ms: u64,
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Whether the service is ready to accept traffic
    pub ready: bool,

    /// When the response was produced
    pub timestamp: DateTime<Utc>,
}
