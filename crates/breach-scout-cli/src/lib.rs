//! # Breach Scout CLI
//!
//! Command-line interface for a running Breach Scout service.
//!
//! This module provides CLI commands for:
//! - Running lookups through the REST API
//! - Inspecting search statistics
//! - Health checking a deployment
//! - Downloading overflow reports
//! - Validating service configuration files

use breach_scout_api::ServiceConfig;
use clap::{CommandFactory, Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

// ============================================================================
// CLI Structure
// ============================================================================

/// Breach Scout CLI - breach lookups from the terminal
#[derive(Parser)]
#[command(name = "breach-scout")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator tooling for the Breach Scout service")]
#[command(
    long_about = "Breach Scout answers breach lookups over chat and REST. This tool talks to a running service instance."
)]
pub struct Cli {
    /// Base URL of the service
    #[arg(long, env = "BREACH_SCOUT_URL", default_value = "http://127.0.0.1:8080")]
    pub service_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Logging level
    #[arg(short, long, default_value = "warn")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a breach lookup
    Search {
        /// Email, username, phone number, or password to look up
        query: String,

        /// Maximum number of sources to return
        #[arg(short, long)]
        limit: Option<u32>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show aggregate search statistics
    Stats {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Check service health
    Health {
        /// Probe storage dependencies as well
        #[arg(short, long)]
        deep: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Download an overflow report
    Report {
        /// Report ID from a search reply
        report_id: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate service configuration
    Config {
        /// Configuration file to validate; the service search path is used
        /// when absent. Format is inferred from the file extension.
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print the resolved configuration (credentials stay redacted)
        #[arg(short, long)]
        show: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Output format options
#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Service returned {status}: {message}")]
    ServiceRejected { status: u16, message: String },

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output error: {message}")]
    Output { message: String },
}

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Configuration is invalid: {0}")]
    Invalid(#[from] breach_scout_api::ConfigError),
}

// ============================================================================
// Service Client
// ============================================================================

/// Thin HTTP client over the service REST API
pub struct ServiceClient {
    http: reqwest::Client,
    base_url: String,
}

impl ServiceClient {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CliError> {
        let http = reqwest::Client::builder()
            .user_agent(format!("breach-scout-cli/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Absolute URL for an API path
    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a JSON body along with the response status.
    ///
    /// Non-JSON bodies are wrapped as a JSON string so callers always get a
    /// value to render.
    async fn get_with_status(&self, path: &str) -> Result<(u16, Value), CliError> {
        let response = self.http.get(self.endpoint(path)).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok((status, body))
    }

    /// GET a JSON body, treating any non-2xx status as an error
    async fn get_json(&self, path: &str) -> Result<Value, CliError> {
        let (status, body) = self.get_with_status(path).await?;
        if !(200..300).contains(&status) {
            return Err(service_rejection(status, body));
        }
        Ok(body)
    }

    /// POST a JSON body, treating any non-2xx status as an error
    async fn post_json(&self, path: &str, request_body: &Value) -> Result<Value, CliError> {
        let response = self
            .http
            .post(self.endpoint(path))
            .json(request_body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        if !(200..300).contains(&status) {
            return Err(service_rejection(status, body));
        }
        Ok(body)
    }

    /// GET a plain-text body
    async fn get_text(&self, path: &str) -> Result<String, CliError> {
        let response = self.http.get(self.endpoint(path)).send().await?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let text = response.text().await?;
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            return Err(service_rejection(status, body));
        }
        Ok(response.text().await?)
    }
}

/// Turn an error response into a [`CliError`], preferring the service's own
/// error message when the body carries one
fn service_rejection(status: u16, body: Value) -> CliError {
    let message = match body["message"].as_str().or_else(|| body["error"].as_str()) {
        Some(message) => message.to_string(),
        None => body.to_string(),
    };
    CliError::ServiceRejected { status, message }
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Main CLI entry point
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    // Initialize logging
    initialize_logging(&cli);

    let client = ServiceClient::new(&cli.service_url, Duration::from_secs(cli.timeout))?;

    // Execute command
    match cli.command {
        Commands::Search {
            query,
            limit,
            format,
        } => execute_search_command(&client, query, limit, format).await,
        Commands::Stats { format } => execute_stats_command(&client, format).await,
        Commands::Health { deep, format } => execute_health_command(&client, deep, format).await,
        Commands::Report { report_id, output } => {
            execute_report_command(&client, report_id, output).await
        }
        Commands::Config { file, show } => execute_config_command(file, show),
        Commands::Completions { shell } => execute_completions_command(shell),
    }
}

/// Initialize logging based on CLI arguments
///
/// Diagnostics go to stderr so command output stays pipeable.
fn initialize_logging(cli: &Cli) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// Execute search command
async fn execute_search_command(
    client: &ServiceClient,
    query: String,
    limit: Option<u32>,
    format: OutputFormat,
) -> Result<(), CliError> {
    if query.trim().is_empty() {
        return Err(CliError::InvalidArgument {
            arg: "query".to_string(),
            message: "query must not be empty".to_string(),
        });
    }
    if limit == Some(0) {
        return Err(CliError::InvalidArgument {
            arg: "limit".to_string(),
            message: "limit must be greater than zero".to_string(),
        });
    }

    let mut request_body = json!({
        "query": query.trim(),
        "platform": "cli",
    });
    if let Some(limit) = limit {
        request_body["limit"] = json!(limit);
    }

    let body = client.post_json("/api/search", &request_body).await?;
    emit(&body, &format, search_text)
}

/// Execute stats command
async fn execute_stats_command(client: &ServiceClient, format: OutputFormat) -> Result<(), CliError> {
    let body = client.get_json("/api/stats").await?;
    emit(&body, &format, stats_text)
}

/// Execute health command
///
/// A degraded deep check still prints the full check breakdown, then exits
/// nonzero so scripts can alert on it.
async fn execute_health_command(
    client: &ServiceClient,
    deep: bool,
    format: OutputFormat,
) -> Result<(), CliError> {
    let path = if deep { "/health/deep" } else { "/health" };
    let (status, body) = client.get_with_status(path).await?;

    emit(&body, &format, health_text)?;

    if !(200..300).contains(&status) {
        return Err(CliError::ServiceRejected {
            status,
            message: "service reported degraded health".to_string(),
        });
    }
    Ok(())
}

/// Execute report command
async fn execute_report_command(
    client: &ServiceClient,
    report_id: String,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    if report_id.is_empty() || !report_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CliError::InvalidArgument {
            arg: "report_id".to_string(),
            message: "report IDs are alphanumeric".to_string(),
        });
    }

    let body = client.get_text(&format!("/reports/{}", report_id)).await?;

    match output {
        Some(path) => {
            std::fs::write(&path, &body)?;
            info!(path = %path.display(), "Report written");
        }
        None => print!("{}", body),
    }
    Ok(())
}

/// Execute config command
fn execute_config_command(file: Option<PathBuf>, show: bool) -> Result<(), CliError> {
    let mut builder = config::Config::builder();

    match &file {
        Some(path) => {
            builder = builder.add_source(config::File::from(path.clone()).required(true));
        }
        None => {
            builder = builder
                .add_source(
                    config::File::with_name("/etc/breach-scout/service")
                        .required(false)
                        .format(config::FileFormat::Yaml),
                )
                .add_source(
                    config::File::with_name("config/service")
                        .required(false)
                        .format(config::FileFormat::Yaml),
                );
        }
    }

    let resolved = builder
        .add_source(config::Environment::with_prefix("BS").separator("__"))
        .build()
        .map_err(ConfigError::Load)?;

    let service_config: ServiceConfig = resolved.try_deserialize().map_err(ConfigError::Load)?;
    service_config.validate().map_err(ConfigError::Invalid)?;

    println!("Configuration is valid");
    if show {
        // Debug formatting keeps credential fields redacted
        println!("{:#?}", service_config);
    }
    Ok(())
}

/// Execute completions command
fn execute_completions_command(shell: clap_complete::Shell) -> Result<(), CliError> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
    Ok(())
}

// ============================================================================
// Output Rendering
// ============================================================================

/// Print a response value in the requested format
fn emit(value: &Value, format: &OutputFormat, text: fn(&Value) -> String) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => println!("{}", text(value)),
        OutputFormat::Json => {
            let rendered =
                serde_json::to_string_pretty(value).map_err(|e| CliError::Output {
                    message: e.to_string(),
                })?;
            println!("{}", rendered);
        }
        OutputFormat::Yaml => {
            let rendered = serde_yaml::to_string(value).map_err(|e| CliError::Output {
                message: e.to_string(),
            })?;
            print!("{}", rendered);
        }
    }
    Ok(())
}

/// Text rendering of a search response
fn search_text(body: &Value) -> String {
    let count = body["resultCount"].as_u64().unwrap_or(0);
    let query = body["query"].as_str().unwrap_or("");
    let mut out = format!("Found {} result(s) for {}\n", count, query);

    if let Some(results) = body["results"].as_array() {
        for (index, result) in results.iter().enumerate() {
            let source = result["sourceName"].as_str().unwrap_or("unknown source");
            let matched = result["matchedField"].as_str().unwrap_or("unknown");
            out.push_str(&format!("\n[{}] {}\n", index + 1, source));
            out.push_str(&format!("    Matched field: {}\n", matched));
            if let Some(content) = result["content"].as_str() {
                for line in content.lines() {
                    out.push_str(&format!("    {}\n", line));
                }
            }
        }
    }

    if let Some(search_id) = body["searchId"].as_str() {
        out.push_str(&format!("\nSearch ID: {}", search_id));
    }
    out
}

/// Text rendering of a statistics response
fn stats_text(body: &Value) -> String {
    format!(
        "Total searches: {}\nTotal results: {}",
        body["totalSearches"], body["totalResults"]
    )
}

/// Text rendering of a health response
fn health_text(body: &Value) -> String {
    let mut out = format!(
        "Status: {} (version {})",
        body["status"].as_str().unwrap_or("unknown"),
        body["version"].as_str().unwrap_or("unknown"),
    );

    if let Some(checks) = body["checks"].as_object() {
        for (name, check) in checks {
            let state = if check["healthy"].as_bool().unwrap_or(false) {
                "ok"
            } else {
                "failed"
            };
            out.push_str(&format!(
                "\n  {}: {} ({} ms) {}",
                name,
                state,
                check["duration_ms"],
                check["message"].as_str().unwrap_or(""),
            ));
        }
    }
    out
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
