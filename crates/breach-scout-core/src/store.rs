//! # Search Record Store
//!
//! Persistence contract for search requests and their normalized results.
//!
//! The core never deletes search records; their lifecycle belongs to the
//! backing store. A search record is created with a zero result count and
//! mutated exactly once, after normalization, to carry the final count. A
//! record left at zero after a failed lookup is deliberate: the attempt
//! itself is the audit trail.

use crate::normalize::NormalizedResult;
use crate::{SearchId, Timestamp};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persistent record of one search request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    /// Unique search identifier
    pub id: SearchId,

    /// Query text as submitted by the user
    pub query_text: String,

    /// Result limit in effect for the lookup call
    pub requested_limit: u32,

    /// When the search was started
    pub issued_at: Timestamp,

    /// Final number of normalized results; zero until normalization
    /// completes
    pub result_count: u64,
}

impl SearchRecord {
    /// Create a new record with a fresh ID and a zero result count
    pub fn new(query_text: impl Into<String>, requested_limit: u32) -> Self {
        Self {
            id: SearchId::new(),
            query_text: query_text.into(),
            requested_limit,
            issued_at: Timestamp::now(),
            result_count: 0,
        }
    }
}

/// Aggregate counters across all recorded searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchStats {
    pub total_searches: u64,
    pub total_results: u64,
}

/// Errors that can occur during search store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists for the given search ID
    #[error("Search not found: {search_id}")]
    SearchNotFound { search_id: SearchId },

    /// The backing store failed
    #[error("Storage backend failure: {message}")]
    Backend { message: String },
}

impl StoreError {
    /// Check if error is transient and worth retrying by an outer layer
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }
}

/// Interface for persisting search requests and results.
///
/// Implementations must provide read-your-writes consistency: results
/// appended for a search ID must be visible to a subsequent
/// [`SearchStore::results_for`] call with that ID.
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Persist a new search record.
    ///
    /// # Errors
    ///
    /// Returns an error if a record with the same ID already exists or the
    /// backend fails.
    async fn create_search(&self, record: &SearchRecord) -> Result<(), StoreError>;

    /// Append normalized results for a search, preserving their order.
    async fn append_results(
        &self,
        search_id: &SearchId,
        results: &[NormalizedResult],
    ) -> Result<(), StoreError>;

    /// Set the final result count for a search.
    ///
    /// Called exactly once per search, after normalization completes.
    async fn set_result_count(&self, search_id: &SearchId, count: u64) -> Result<(), StoreError>;

    /// Fetch a search record by ID
    async fn get_search(&self, search_id: &SearchId) -> Result<Option<SearchRecord>, StoreError>;

    /// Fetch the results persisted for a search, in insertion order
    async fn results_for(&self, search_id: &SearchId)
        -> Result<Vec<NormalizedResult>, StoreError>;

    /// Aggregate counters across all searches
    async fn stats(&self) -> Result<SearchStats, StoreError>;
}
