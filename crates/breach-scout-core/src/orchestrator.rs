//! # Search Orchestration
//!
//! Drives a single search end to end: record the search, query the breach
//! provider, normalize the payload, persist the results, and finalize the
//! record's result count.
//!
//! The search record is created before the provider is contacted and is
//! never deleted afterwards. A failed lookup leaves the record at zero
//! results, so the audit trail includes searches that returned nothing.

use crate::lookup::{LookupBackend, LookupError, DEFAULT_RESULT_LIMIT};
use crate::normalize::{normalize, NormalizedResult};
use crate::store::{SearchRecord, SearchStore, StoreError};
use crate::SearchId;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Outcome of a completed search
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Identifier of the search record
    pub search_id: SearchId,

    /// Number of normalized results produced
    pub result_count: usize,

    /// The normalized results, in provider order
    pub results: Vec<NormalizedResult>,
}

/// Errors that can occur while running a search
#[derive(Debug, Error)]
pub enum SearchError {
    /// The breach provider query failed
    #[error("Lookup failed for search {search_id}: {source}")]
    Lookup {
        search_id: SearchId,
        #[source]
        source: LookupError,
    },

    /// A storage operation failed
    #[error("Storage failed for search {search_id}: {source}")]
    Store {
        search_id: SearchId,
        #[source]
        source: StoreError,
    },
}

impl SearchError {
    /// The search record this error belongs to.
    ///
    /// The record exists even when the search failed, so callers can point
    /// operators at it.
    pub fn search_id(&self) -> SearchId {
        match self {
            Self::Lookup { search_id, .. } => *search_id,
            Self::Store { search_id, .. } => *search_id,
        }
    }

    /// Check if error is transient and may succeed on retry
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Lookup { source, .. } => source.is_transient(),
            Self::Store { source, .. } => source.is_transient(),
        }
    }
}

/// Runs searches against a lookup backend and records them in a store
pub struct SearchOrchestrator {
    lookup: Arc<dyn LookupBackend>,
    store: Arc<dyn SearchStore>,
}

impl SearchOrchestrator {
    /// Create an orchestrator over the given backend and store
    pub fn new(lookup: Arc<dyn LookupBackend>, store: Arc<dyn SearchStore>) -> Self {
        Self { lookup, store }
    }

    /// Run one search end to end.
    ///
    /// `limit` falls back to the provider default when absent. The resolved
    /// limit is recorded on the search record and passed to the backend, so
    /// the audit trail matches the query that was actually issued.
    ///
    /// The result count is written exactly once, after all results are
    /// persisted. Failures after record creation leave the record in place
    /// with a zero count.
    #[instrument(skip(self, query_text), fields(query_len = query_text.len()))]
    pub async fn run(
        &self,
        query_text: &str,
        limit: Option<u32>,
    ) -> Result<SearchOutcome, SearchError> {
        let requested_limit = limit.unwrap_or(DEFAULT_RESULT_LIMIT);
        let record = SearchRecord::new(query_text, requested_limit);
        let search_id = record.id;

        self.store
            .create_search(&record)
            .await
            .map_err(|source| SearchError::Store { search_id, source })?;

        info!(
            search_id = %search_id,
            requested_limit = requested_limit,
            "Search record created"
        );

        let payload = match self.lookup.query(query_text, Some(requested_limit)).await {
            Ok(payload) => payload,
            Err(source) => {
                warn!(
                    search_id = %search_id,
                    error = %source,
                    "Lookup failed, search record kept at zero results"
                );
                return Err(SearchError::Lookup { search_id, source });
            }
        };

        let results = normalize(&payload, query_text, search_id);

        self.store
            .append_results(&search_id, &results)
            .await
            .map_err(|source| SearchError::Store { search_id, source })?;

        self.store
            .set_result_count(&search_id, results.len() as u64)
            .await
            .map_err(|source| SearchError::Store { search_id, source })?;

        info!(
            search_id = %search_id,
            result_count = results.len(),
            "Search completed"
        );

        Ok(SearchOutcome {
            search_id,
            result_count: results.len(),
            results,
        })
    }
}

impl std::fmt::Debug for SearchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOrchestrator").finish()
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
