//! # In-Memory Storage
//!
//! HashMap-backed implementations of the search and report stores.
//! Suitable for tests and single-process deployments; nothing survives a
//! restart.

use crate::normalize::NormalizedResult;
use crate::report::{compute_checksum, ReportError, ReportMetadata, ReportStore, StoredReport};
use crate::store::{SearchRecord, SearchStats, SearchStore, StoreError};
use crate::{ReportId, SearchId, Timestamp};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::RwLock;

// ============================================================================
// Search Store
// ============================================================================

/// In-memory search store
#[derive(Default)]
pub struct InMemorySearchStore {
    searches: RwLock<HashMap<SearchId, SearchRecord>>,
    results: RwLock<HashMap<SearchId, Vec<NormalizedResult>>>,
}

impl InMemorySearchStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of search records held
    pub fn len(&self) -> usize {
        self.searches.read().unwrap().len()
    }

    /// Whether the store holds no searches
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SearchStore for InMemorySearchStore {
    async fn create_search(&self, record: &SearchRecord) -> Result<(), StoreError> {
        let mut searches = self.searches.write().unwrap();
        if searches.contains_key(&record.id) {
            return Err(StoreError::Backend {
                message: format!("search {} already exists", record.id),
            });
        }
        searches.insert(record.id, record.clone());
        Ok(())
    }

    async fn append_results(
        &self,
        search_id: &SearchId,
        results: &[NormalizedResult],
    ) -> Result<(), StoreError> {
        let searches = self.searches.read().unwrap();
        if !searches.contains_key(search_id) {
            return Err(StoreError::SearchNotFound {
                search_id: *search_id,
            });
        }
        drop(searches);

        let mut stored = self.results.write().unwrap();
        stored
            .entry(*search_id)
            .or_default()
            .extend_from_slice(results);
        Ok(())
    }

    async fn set_result_count(&self, search_id: &SearchId, count: u64) -> Result<(), StoreError> {
        let mut searches = self.searches.write().unwrap();
        match searches.get_mut(search_id) {
            Some(record) => {
                record.result_count = count;
                Ok(())
            }
            None => Err(StoreError::SearchNotFound {
                search_id: *search_id,
            }),
        }
    }

    async fn get_search(&self, search_id: &SearchId) -> Result<Option<SearchRecord>, StoreError> {
        let searches = self.searches.read().unwrap();
        Ok(searches.get(search_id).cloned())
    }

    async fn results_for(
        &self,
        search_id: &SearchId,
    ) -> Result<Vec<NormalizedResult>, StoreError> {
        let searches = self.searches.read().unwrap();
        if !searches.contains_key(search_id) {
            return Err(StoreError::SearchNotFound {
                search_id: *search_id,
            });
        }
        drop(searches);

        let stored = self.results.read().unwrap();
        Ok(stored.get(search_id).cloned().unwrap_or_default())
    }

    async fn stats(&self) -> Result<SearchStats, StoreError> {
        let searches = self.searches.read().unwrap();
        let total_searches = searches.len() as u64;
        let total_results = searches.values().map(|record| record.result_count).sum();
        Ok(SearchStats {
            total_searches,
            total_results,
        })
    }
}

impl std::fmt::Debug for InMemorySearchStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySearchStore")
            .field("searches", &self.len())
            .finish()
    }
}

// ============================================================================
// Report Store
// ============================================================================

/// In-memory report store
#[derive(Default)]
pub struct InMemoryReportStore {
    reports: RwLock<HashMap<ReportId, StoredReport>>,
}

impl InMemoryReportStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reports held
    pub fn len(&self) -> usize {
        self.reports.read().unwrap().len()
    }

    /// Whether the store holds no reports
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
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

        let mut reports = self.reports.write().unwrap();
        reports.insert(
            *report_id,
            StoredReport {
                metadata: metadata.clone(),
                body: body.to_string(),
            },
        );

        Ok(metadata)
    }

    async fn get_report(&self, report_id: &ReportId) -> Result<Option<StoredReport>, ReportError> {
        let reports = self.reports.read().unwrap();
        Ok(reports.get(report_id).cloned())
    }

    async fn health_check(&self) -> Result<(), ReportError> {
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryReportStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryReportStore")
            .field("reports", &self.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
