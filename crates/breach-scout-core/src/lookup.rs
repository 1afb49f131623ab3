//! # Breach Lookup Client
//!
//! Outbound client for the external breach lookup service. One search is one
//! HTTP POST; the client performs no retries, so a failed call surfaces
//! immediately to the caller.
//!
//! The response payload is shape-shifting: a mapping from breach-source name
//! to a descriptor whose contents are controlled by the remote service. The
//! client validates each descriptor at the parsing boundary and quarantines
//! anything that does not conform, so no untyped data travels deeper into
//! the system.

use crate::{ApiToken, ValidationError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

/// Result limit applied when the caller leaves it unset
pub const DEFAULT_RESULT_LIMIT: u32 = 100;

/// Request timeout applied when the configuration leaves it unset
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the breach lookup client.
///
/// Constructed once at process start and passed into
/// [`BreachLookupClient::new`]; a missing credential is a constructor-time
/// failure, not a runtime surprise.
///
/// # Examples
///
/// ```
/// use breach_scout_core::lookup::LookupConfig;
/// use breach_scout_core::ApiToken;
/// use std::time::Duration;
///
/// let config = LookupConfig::new(ApiToken::from_string("token".to_string()))
///     .with_timeout(Duration::from_secs(10));
/// assert_eq!(config.timeout, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Endpoint URL for the lookup service
    pub endpoint_url: String,

    /// Access credential sent with every request
    pub api_token: ApiToken,

    /// Result limit used when a search does not specify one
    pub default_limit: u32,

    /// Request timeout for the single outbound call
    pub timeout: Duration,

    /// Response language requested from the service
    pub language: String,

    /// User-Agent header value
    pub user_agent: String,
}

impl LookupConfig {
    /// Create configuration with the given credential and default settings
    pub fn new(api_token: ApiToken) -> Self {
        Self {
            endpoint_url: "https://leakosintapi.com/".to_string(),
            api_token,
            default_limit: DEFAULT_RESULT_LIMIT,
            timeout: DEFAULT_TIMEOUT,
            language: "en".to_string(),
            user_agent: format!("breach-scout/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the endpoint URL
    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = url.into();
        self
    }

    /// Set the default result limit
    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit;
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the response language
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

// ============================================================================
// Payload Types
// ============================================================================

/// One breach source's records in the documented response shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecords {
    /// Free-text description of the breach source
    #[serde(rename = "InfoLeak", default)]
    pub description: String,

    /// Leaked records, each a field-name to field-value mapping.
    ///
    /// Field iteration order is preserved from the wire payload; it drives
    /// render order downstream.
    #[serde(rename = "Data")]
    pub records: Vec<Map<String, Value>>,
}

/// A breach source entry after boundary validation
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEntry {
    /// Descriptor matching the documented shape
    Records(SourceRecords),

    /// Descriptor that did not conform; retained for diagnostics only and
    /// never normalized
    Malformed(Value),
}

/// Parsed response payload from the lookup service.
///
/// Source order matches the wire payload; the normalizer's output order
/// depends on it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BreachPayload {
    pub sources: Vec<(String, SourceEntry)>,
}

impl BreachPayload {
    /// Parse a raw response body into a validated payload.
    ///
    /// A payload carrying an `"Error code"` field is a remote failure, not
    /// data. Sources that do not match the documented descriptor shape are
    /// quarantined as [`SourceEntry::Malformed`].
    pub fn from_value(value: Value) -> Result<Self, LookupError> {
        let root = match value {
            Value::Object(map) => map,
            other => {
                return Err(LookupError::Malformed {
                    message: format!("expected JSON object, got {}", json_type_name(&other)),
                })
            }
        };

        if let Some(code) = root.get("Error code") {
            let code = match code {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(LookupError::Remote { code });
        }

        let list = match root.get("List") {
            Some(Value::Object(list)) => list,
            Some(other) => {
                return Err(LookupError::Malformed {
                    message: format!("'List' must be an object, got {}", json_type_name(other)),
                })
            }
            None => {
                return Err(LookupError::Malformed {
                    message: "response has neither 'List' nor 'Error code'".to_string(),
                })
            }
        };

        let sources = list
            .iter()
            .map(|(name, entry)| {
                let parsed = match serde_json::from_value::<SourceRecords>(entry.clone()) {
                    Ok(records) => SourceEntry::Records(records),
                    Err(reason) => {
                        warn!(
                            source = %name,
                            %reason,
                            "Quarantining breach source with unexpected shape"
                        );
                        SourceEntry::Malformed(entry.clone())
                    }
                };
                (name.clone(), parsed)
            })
            .collect();

        Ok(Self { sources })
    }

    /// Check whether the payload carries no sources at all
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Wire request body for the lookup service
#[derive(Debug, Serialize)]
struct LookupRequestBody<'a> {
    token: &'a str,
    request: &'a str,
    limit: u32,
    lang: &'a str,
    #[serde(rename = "type")]
    response_type: &'a str,
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur during a breach lookup
#[derive(Debug, Error)]
pub enum LookupError {
    /// Client configuration is unusable (missing credential, bad endpoint)
    #[error("Lookup configuration error: {message}")]
    Configuration { message: String },

    /// Caller-supplied input was rejected before any network call
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The outbound HTTP call did not complete with a success status
    #[error("Lookup request failed: {message}")]
    Transport { message: String },

    /// The service answered with an embedded error code
    #[error("Lookup service reported an error: {code}")]
    Remote { code: String },

    /// The response body did not match the documented payload shape
    #[error("Unexpected lookup response shape: {message}")]
    Malformed { message: String },
}

impl LookupError {
    /// Check if error is transient and worth retrying by an outer layer
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Get error category for monitoring and alerting
    pub fn error_category(&self) -> crate::ErrorCategory {
        match self {
            Self::Configuration { .. } => crate::ErrorCategory::Configuration,
            Self::Validation(_) => crate::ErrorCategory::Permanent,
            Self::Transport { .. } => crate::ErrorCategory::Transient,
            Self::Remote { .. } => crate::ErrorCategory::Permanent,
            Self::Malformed { .. } => crate::ErrorCategory::Permanent,
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// Seam for the outbound lookup call.
///
/// The orchestrator depends on this trait so tests can substitute a stub
/// without a network.
#[async_trait]
pub trait LookupBackend: Send + Sync {
    /// Execute one lookup, applying the configured default when `limit` is
    /// unset
    async fn query(
        &self,
        query_text: &str,
        limit: Option<u32>,
    ) -> Result<BreachPayload, LookupError>;
}

/// HTTP client for the external breach lookup service.
///
/// # Examples
///
/// ```no_run
/// use breach_scout_core::lookup::{BreachLookupClient, LookupConfig};
/// use breach_scout_core::ApiToken;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = LookupConfig::new(ApiToken::from_string("token".to_string()));
/// let client = BreachLookupClient::new(config)?;
/// let payload = client.query("user@example.com", None).await?;
/// println!("{} sources", payload.sources.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BreachLookupClient {
    config: LookupConfig,
    http_client: reqwest::Client,
}

impl BreachLookupClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Configuration`] when no credential is
    /// configured, the endpoint URL does not parse, or the HTTP client
    /// cannot be constructed.
    pub fn new(config: LookupConfig) -> Result<Self, LookupError> {
        if config.api_token.is_empty() {
            return Err(LookupError::Configuration {
                message: "no API token configured".to_string(),
            });
        }

        if let Err(e) = Url::parse(&config.endpoint_url) {
            return Err(LookupError::Configuration {
                message: format!("endpoint URL '{}' is invalid: {}", config.endpoint_url, e),
            });
        }

        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| LookupError::Configuration {
                message: format!("failed to construct HTTP client: {}", e),
            })?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Execute a single lookup against the configured endpoint.
    ///
    /// Query text must be non-empty and the limit, when given, positive.
    /// The query itself is never logged; it routinely contains personal
    /// data.
    #[instrument(skip(self, query_text))]
    pub async fn query(
        &self,
        query_text: &str,
        limit: Option<u32>,
    ) -> Result<BreachPayload, LookupError> {
        if query_text.trim().is_empty() {
            return Err(LookupError::Validation(ValidationError::Required {
                field: "query".to_string(),
            }));
        }

        let limit = limit.unwrap_or(self.config.default_limit);
        if limit == 0 {
            return Err(LookupError::Validation(ValidationError::InvalidFormat {
                field: "limit".to_string(),
                message: "must be a positive integer".to_string(),
            }));
        }

        let body = LookupRequestBody {
            token: self.config.api_token.expose_secret(),
            request: query_text,
            limit,
            lang: &self.config.language,
            response_type: "json",
        };

        debug!(
            query_len = query_text.len(),
            limit, "Sending breach lookup request"
        );

        let response = self
            .http_client
            .post(&self.config.endpoint_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    format!("request timed out after {:?}", self.config.timeout)
                } else {
                    format!("HTTP request failed: {}", e)
                };
                LookupError::Transport { message }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());
            return Err(LookupError::Transport {
                message: format!("lookup call failed with status {}: {}", status, error_text),
            });
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| LookupError::Malformed {
                message: format!("response body was not valid JSON: {}", e),
            })?;

        let payload = BreachPayload::from_value(value)?;
        debug!(
            source_count = payload.sources.len(),
            "Breach lookup completed"
        );

        Ok(payload)
    }
}

#[async_trait]
impl LookupBackend for BreachLookupClient {
    async fn query(
        &self,
        query_text: &str,
        limit: Option<u32>,
    ) -> Result<BreachPayload, LookupError> {
        BreachLookupClient::query(self, query_text, limit).await
    }
}

#[cfg(test)]
#[path = "lookup_tests.rs"]
mod tests;
