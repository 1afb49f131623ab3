//! # Overflow Report Export
//!
//! Builds the full plaintext report emitted when a result set is too large
//! to render inline, and defines the storage contract that makes the report
//! retrievable afterwards.
//!
//! The artifact is plain UTF-8 text: a header block describing the search,
//! then one block per result with the full untruncated content. Stored
//! reports carry a SHA-256 checksum that is verified on read.

use crate::normalize::NormalizedResult;
use crate::{ReportId, Timestamp};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Rule line closing the report header
const HEADER_RULE: &str =
    "================================================================================";

/// Rule line separating result blocks
const RESULT_RULE: &str =
    "--------------------------------------------------------------------------------";

// ============================================================================
// Utility Functions
// ============================================================================

/// Compute SHA-256 checksum of data
///
/// Returns hex-encoded checksum string for tamper detection.
///
/// # Examples
///
/// ```
/// use breach_scout_core::report::compute_checksum;
/// use bytes::Bytes;
///
/// let data = Bytes::from("test data");
/// let checksum = compute_checksum(&data);
/// assert_eq!(checksum.len(), 64); // SHA-256 hex is 64 characters
/// ```
pub fn compute_checksum(data: &Bytes) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Verify checksum matches expected value
///
/// Performs constant-time comparison to prevent timing attacks.
pub fn verify_checksum(data: &Bytes, expected_checksum: &str) -> bool {
    let actual_checksum = compute_checksum(data);
    constant_time_eq(actual_checksum.as_bytes(), expected_checksum.as_bytes())
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

// ============================================================================
// Report Building
// ============================================================================

/// Build the complete plaintext report for a result set.
///
/// Every result appears in full, one block per result. `result_count` is
/// the authoritative total from normalization and belongs in the header
/// even though it always equals `results.len()` today.
pub fn build_report(
    results: &[NormalizedResult],
    query_text: &str,
    result_count: u64,
    generated_at: Timestamp,
) -> String {
    let mut out = String::new();

    out.push_str("Breach Search Report\n");
    out.push_str(&format!("Query: {}\n", query_text));
    out.push_str(&format!("Total Results: {}\n", result_count));
    out.push_str(&format!("Generated: {}\n", generated_at.to_rfc3339()));
    out.push_str(HEADER_RULE);
    out.push('\n');

    for (index, result) in results.iter().enumerate() {
        out.push('\n');
        out.push_str(&format!("Result #{}\n", index + 1));
        out.push_str(&format!("Breach: {}\n", result.source_name));
        out.push_str(&format!("Matched Field: {}\n", result.matched_field));
        out.push_str(&format!(
            "Data Types: {}\n",
            result.data_type_names.join(", ")
        ));
        out.push_str("Content:\n");
        out.push_str(&result.content);
        if !result.content.ends_with('\n') {
            out.push('\n');
        }
        if let Some(date) = &result.breach_date {
            out.push_str(&format!("Breach Date: {}\n", date));
        }
        if !result.source_description.is_empty() {
            out.push_str(&format!("Description: {}\n", result.source_description));
        }
        out.push_str(RESULT_RULE);
        out.push('\n');
    }

    out
}

// ============================================================================
// Storage Contract
// ============================================================================

/// Metadata about a stored report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Report ID used as the retrieval key
    pub report_id: ReportId,

    /// Download filename offered to chat clients
    pub filename: String,

    /// Size of the report body in bytes
    pub size_bytes: u64,

    /// SHA-256 checksum of the report body (hex-encoded)
    pub checksum_sha256: String,

    /// When the report was stored
    pub created_at: Timestamp,
}

/// Complete report retrieved from storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    /// Report metadata
    pub metadata: ReportMetadata,

    /// Full plaintext body
    pub body: String,
}

/// Errors that can occur during report storage operations
#[derive(Debug, Error)]
pub enum ReportError {
    /// No report exists for the given ID
    #[error("Report not found: {report_id}")]
    NotFound { report_id: ReportId },

    /// Stored data no longer matches its checksum
    #[error("Checksum mismatch for report {report_id}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        report_id: ReportId,
        expected: String,
        actual: String,
    },

    /// Serialization failed
    #[error("Serialization failed: {message}")]
    SerializationFailed { message: String },

    /// Internal storage error
    #[error("Internal storage error: {message}")]
    InternalError { message: String },
}

impl ReportError {
    /// Check if error is transient and worth retrying by an outer layer
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::InternalError { .. })
    }

    /// Check if error indicates data corruption or tampering
    pub fn is_corrupted(&self) -> bool {
        matches!(self, Self::ChecksumMismatch { .. })
    }
}

/// Interface for report persistence.
///
/// Reports are immutable once stored; there is no update operation.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persist a report body and return its metadata
    async fn store_report(
        &self,
        report_id: &ReportId,
        body: &str,
    ) -> Result<ReportMetadata, ReportError>;

    /// Retrieve a stored report, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::ChecksumMismatch`] when the stored body fails
    /// checksum verification.
    async fn get_report(&self, report_id: &ReportId) -> Result<Option<StoredReport>, ReportError>;

    /// Check that the backing storage is usable
    async fn health_check(&self) -> Result<(), ReportError>;
}

impl ReportId {
    /// Download filename for this report
    pub fn to_filename(&self) -> String {
        format!("breach-report-{}.txt", self)
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
