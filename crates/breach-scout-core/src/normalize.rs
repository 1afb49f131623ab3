//! # Result Normalization
//!
//! Converts the raw breach payload into an ordered sequence of flat
//! [`NormalizedResult`] records and detects which field of each record
//! matched the query.
//!
//! Ordering is load-bearing: sources are walked in payload order, records in
//! source order, and fields in record order. The field order becomes the
//! line order of `content` and the order of `data_type_names`, and render
//! code downstream treats it as authoritative.

use crate::lookup::{BreachPayload, SourceEntry};
use crate::SearchId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Source name the lookup service uses to signal an empty result set
pub const NO_RESULTS_SOURCE: &str = "No results found";

/// Matched-field sentinel when no field value contains the query.
///
/// This happens legitimately: the query may match a phrase split across
/// fields, or the service may have matched on something other than literal
/// substrings.
pub const UNKNOWN_FIELD: &str = "unknown";

/// Flat, render-ready view of one leaked record.
///
/// Serializes with camelCase keys; this type travels on the REST wire
/// inside search responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    /// Search this result belongs to
    pub search_id: SearchId,

    /// Name of the breach source the record came from
    pub source_name: String,

    /// Free-text description of the breach source
    pub source_description: String,

    /// Field whose value matched the query, or [`UNKNOWN_FIELD`]
    pub matched_field: String,

    /// Field names in record order, not deduplicated
    pub data_type_names: Vec<String>,

    /// One `"name: value"` line per field, in record order, each line
    /// newline-terminated
    pub content: String,

    /// Value of a `Date` field when the record carries one; feeds the
    /// export artifact's optional date line
    pub breach_date: Option<String>,
}

/// Normalize a lookup payload into flat results for the given search.
///
/// Pure and idempotent: the same payload and query always produce the same
/// output. The sentinel no-results source and quarantined sources
/// contribute zero records.
pub fn normalize(
    payload: &BreachPayload,
    query_text: &str,
    search_id: SearchId,
) -> Vec<NormalizedResult> {
    let needle = query_text.to_lowercase();
    let mut results = Vec::new();

    for (source_name, entry) in &payload.sources {
        if source_name == NO_RESULTS_SOURCE {
            continue;
        }

        let source = match entry {
            SourceEntry::Records(source) => source,
            SourceEntry::Malformed(_) => {
                warn!(source = %source_name, "Skipping quarantined breach source");
                continue;
            }
        };

        for record in &source.records {
            results.push(normalize_record(
                record,
                &needle,
                source_name,
                &source.description,
                search_id,
            ));
        }
    }

    results
}

/// Flatten a single field-mapping record.
///
/// The later of two matching fields wins; an empty needle matches nothing.
fn normalize_record(
    record: &Map<String, Value>,
    needle: &str,
    source_name: &str,
    source_description: &str,
    search_id: SearchId,
) -> NormalizedResult {
    let mut content = String::new();
    let mut matched_field = UNKNOWN_FIELD.to_string();
    let mut data_type_names = Vec::with_capacity(record.len());
    let mut breach_date = None;

    for (name, value) in record {
        let text = value_as_text(value);

        content.push_str(name);
        content.push_str(": ");
        content.push_str(&text);
        content.push('\n');

        if !needle.is_empty() && text.to_lowercase().contains(needle) {
            matched_field = name.clone();
        }

        if breach_date.is_none() && (name == "Date" || name == "date") {
            breach_date = Some(text.clone());
        }

        data_type_names.push(name.clone());
    }

    NormalizedResult {
        search_id,
        source_name: source_name.to_string(),
        source_description: source_description.to_string(),
        matched_field,
        data_type_names,
        content,
        breach_date,
    }
}

/// String-cast a field value the way it should read in content lines.
///
/// Strings are used verbatim (no surrounding quotes); everything else is
/// rendered as its JSON text.
fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
