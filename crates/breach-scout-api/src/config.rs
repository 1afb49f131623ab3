//! Configuration types for the HTTP service
//!
//! Every field carries a serde default so a partial configuration file (or
//! none at all) still deserializes. [`ServiceConfig::validate`] is the gate
//! that rejects configurations missing the credentials the service cannot
//! run without.

use crate::errors::ConfigError;
use serde::Deserialize;
use std::fmt;

/// Service configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Discord interactions endpoint settings
    pub discord: DiscordConfig,

    /// Revolt bridge endpoint settings
    pub revolt: RevoltConfig,

    /// Breach lookup provider settings
    pub lookup: LookupSettings,

    /// Report storage and link settings
    pub reports: ReportSettings,
}

impl ServiceConfig {
    /// Validate that the configuration is complete enough to serve traffic
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discord.public_key.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "discord.public_key".to_string(),
            });
        }

        if self.revolt.webhook_token.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "revolt.webhook_token".to_string(),
            });
        }

        if self.revolt.command_prefix.is_empty() {
            return Err(ConfigError::Invalid {
                message: "revolt.command_prefix must not be empty".to_string(),
            });
        }

        if self.lookup.api_token.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "lookup.api_token".to_string(),
            });
        }

        if self.lookup.endpoint_url.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "lookup.endpoint_url".to_string(),
            });
        }

        if self.lookup.default_limit == 0 {
            return Err(ConfigError::Invalid {
                message: "lookup.default_limit must be at least 1".to_string(),
            });
        }

        if self.lookup.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "lookup.timeout_seconds must be at least 1".to_string(),
            });
        }

        if self.reports.public_base_url.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "reports.public_base_url".to_string(),
            });
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,
}

impl ServerConfig {
    /// Address string suitable for binding a listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 30,
            max_body_size: 256 * 1024, // 256KB, interaction payloads are small
        }
    }
}

/// Discord interactions endpoint configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct DiscordConfig {
    /// Hex-encoded Ed25519 public key from the application's developer portal
    ///
    /// Every interaction request is verified against this key before any
    /// part of the payload is trusted.
    pub public_key: String,
}

/// Revolt bridge endpoint configuration
#[derive(Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RevoltConfig {
    /// Shared bearer token the bridge presents on every delivery
    pub webhook_token: String,

    /// Prefix that marks a channel message as a command
    pub command_prefix: String,
}

impl Default for RevoltConfig {
    fn default() -> Self {
        Self {
            webhook_token: String::new(),
            command_prefix: "!".to_string(),
        }
    }
}

// The webhook token grants send access to the service, so it never appears
// in Debug output.
impl fmt::Debug for RevoltConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevoltConfig")
            .field("webhook_token", &"[REDACTED]")
            .field("command_prefix", &self.command_prefix)
            .finish()
    }
}

/// Breach lookup provider configuration
#[derive(Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LookupSettings {
    /// Provider endpoint URL
    pub endpoint_url: String,

    /// API token presented on every lookup request
    pub api_token: String,

    /// Result limit applied when a caller does not specify one
    pub default_limit: u32,

    /// Outbound request timeout in seconds
    pub timeout_seconds: u64,

    /// Language code requested from the provider
    pub language: String,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            endpoint_url: "https://leakosintapi.com/".to_string(),
            api_token: String::new(),
            default_limit: breach_scout_core::lookup::DEFAULT_RESULT_LIMIT,
            timeout_seconds: 30,
            language: "en".to_string(),
        }
    }
}

impl fmt::Debug for LookupSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupSettings")
            .field("endpoint_url", &self.endpoint_url)
            .field("api_token", &"[REDACTED]")
            .field("default_limit", &self.default_limit)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("language", &self.language)
            .finish()
    }
}

/// Report storage configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Directory where report files are written
    pub storage_path: String,

    /// Base URL used when composing report download links
    pub public_base_url: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            storage_path: "./reports".to_string(),
            public_base_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
