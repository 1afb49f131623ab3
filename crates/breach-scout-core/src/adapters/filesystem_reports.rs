//! # Filesystem Report Storage
//!
//! Stores each report as a JSON document holding its metadata and body.
//! Writes go to a temporary file first and are renamed into place, so a
//! crash mid-write never leaves a half-written report behind. Bodies are
//! checksummed on write and verified on every read.

use crate::report::{
    compute_checksum, verify_checksum, ReportError, ReportMetadata, ReportStore, StoredReport,
};
use crate::{ReportId, Timestamp};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, instrument};

/// Report store backed by a local directory
#[derive(Debug, Clone)]
pub struct FilesystemReportStore {
    base_path: PathBuf,
}

impl FilesystemReportStore {
    /// Create a store rooted at the given directory.
    ///
    /// The directory is created on first write, not here.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Path of the document holding one report
    fn report_path(&self, report_id: &ReportId) -> PathBuf {
        self.base_path.join(format!("{}.json", report_id))
    }
}

#[async_trait]
impl ReportStore for FilesystemReportStore {
    #[instrument(skip(self, body), fields(report_id = %report_id, body_len = body.len()))]
    async fn store_report(
        &self,
        report_id: &ReportId,
        body: &str,
    ) -> Result<ReportMetadata, ReportError> {
        let metadata = ReportMetadata {
            report_id: *report_id,
            filename: report_id.to_filename(),
            size_bytes: body.len() as u64,
            checksum_sha256: compute_checksum(&Bytes::from(body.to_string())),
            created_at: Timestamp::now(),
        };

        let document = StoredReport {
            metadata: metadata.clone(),
            body: body.to_string(),
        };
        let json = serde_json::to_string_pretty(&document).map_err(|e| {
            ReportError::SerializationFailed {
                message: e.to_string(),
            }
        })?;

        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| ReportError::InternalError {
                message: format!("failed to create report directory: {}", e),
            })?;

        let report_path = self.report_path(report_id);
        let temp_path = report_path.with_extension("tmp");

        fs::write(&temp_path, json)
            .await
            .map_err(|e| ReportError::InternalError {
                message: format!("failed to write report: {}", e),
            })?;

        fs::rename(&temp_path, &report_path)
            .await
            .map_err(|e| ReportError::InternalError {
                message: format!("failed to finalize report: {}", e),
            })?;

        debug!(path = %report_path.display(), "Report stored");

        Ok(metadata)
    }

    #[instrument(skip(self), fields(report_id = %report_id))]
    async fn get_report(&self, report_id: &ReportId) -> Result<Option<StoredReport>, ReportError> {
        let report_path = self.report_path(report_id);

        let json = match fs::read_to_string(&report_path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ReportError::InternalError {
                    message: format!("failed to read report: {}", e),
                })
            }
        };

        let stored: StoredReport =
            serde_json::from_str(&json).map_err(|e| ReportError::SerializationFailed {
                message: e.to_string(),
            })?;

        let body_bytes = Bytes::from(stored.body.clone());
        if !verify_checksum(&body_bytes, &stored.metadata.checksum_sha256) {
            return Err(ReportError::ChecksumMismatch {
                report_id: *report_id,
                expected: stored.metadata.checksum_sha256.clone(),
                actual: compute_checksum(&body_bytes),
            });
        }

        Ok(Some(stored))
    }

    async fn health_check(&self) -> Result<(), ReportError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| ReportError::InternalError {
                message: format!("report directory is not writable: {}", e),
            })?;

        Ok(())
    }
}

#[cfg(test)]
#[path = "filesystem_reports_tests.rs"]
mod tests;
