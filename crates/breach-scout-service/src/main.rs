//! # Breach Scout Service
//!
//! Binary entry point for the Breach Scout HTTP service.
//!
//! This executable:
//! - Loads configuration from environment and files
//! - Initializes logging
//! - Wires the lookup client, stores, and command pipeline
//! - Starts the HTTP server from breach-scout-api

use breach_scout_api::{start_server, AppState, ServiceConfig, ServiceError, ServiceMetrics};
use breach_scout_core::{
    adapters::{FilesystemReportStore, InMemorySearchStore},
    lookup::{BreachLookupClient, LookupConfig},
    ApiToken, CommandDispatcher, InteractionVerifier, MessageRenderer, SearchOrchestrator,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "breach_scout_service=info,breach_scout_api=info,breach_scout_core=info,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Breach Scout Service");

    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Sources (applied in order, later sources override earlier ones):
    //  1. /etc/breach-scout/service.yaml   - system-wide defaults
    //  2. ./config/service.yaml            - deployment-local override
    //  3. Path given by BS_CONFIG_FILE env - operator-specified file
    //  4. Environment variables prefixed BS__ (double-underscore separator)
    //     e.g. BS__SERVER__PORT=9090 sets server.port = 9090
    //
    // All service configuration fields carry serde defaults, so partial files
    // are fine. The secrets have no usable defaults, which is why validate()
    // runs before anything is wired. A malformed file or an environment
    // variable that cannot be coerced to the correct type IS a hard error
    // because it indicates deliberate-but-broken operator configuration.
    // -------------------------------------------------------------------------
    let mut config_builder = config::Config::builder()
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

    // Optional explicit path supplied by the operator.
    if let Ok(explicit_path) = std::env::var("BS_CONFIG_FILE") {
        if !explicit_path.is_empty() {
            config_builder = config_builder.add_source(
                config::File::with_name(&explicit_path)
                    .required(true)
                    .format(config::FileFormat::Yaml),
            );
            info!(path = %explicit_path, "Loading configuration from explicit path");
        }
    }

    let config = match config_builder
        .add_source(config::Environment::with_prefix("BS").separator("__"))
        .build()
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "Failed to build configuration; aborting");
            std::process::exit(3);
        }
    };

    let service_config: ServiceConfig = match config.try_deserialize() {
        Ok(sc) => sc,
        Err(e) => {
            error!(
                error = %e,
                "Could not deserialize service configuration; aborting. \
                 Fix the configuration and restart."
            );
            std::process::exit(3);
        }
    };

    if let Err(e) = service_config.validate() {
        error!(error = %e, "Service configuration is invalid; aborting");
        std::process::exit(3);
    }

    // -------------------------------------------------------------------------
    // Wire the lookup pipeline
    //
    // The provider client, the stores, and the command dispatcher are shared
    // between the chat endpoints and the REST surface, so every entry point
    // sees the same search history and the same report links.
    // -------------------------------------------------------------------------
    let lookup_config = LookupConfig::new(ApiToken::from_string(
        service_config.lookup.api_token.clone(),
    ))
    .with_endpoint_url(service_config.lookup.endpoint_url.clone())
    .with_default_limit(service_config.lookup.default_limit)
    .with_timeout(Duration::from_secs(service_config.lookup.timeout_seconds))
    .with_language(service_config.lookup.language.clone());

    let lookup_client = match BreachLookupClient::new(lookup_config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!(error = %e, "Failed to construct breach lookup client; aborting");
            std::process::exit(3);
        }
    };

    let search_store = Arc::new(InMemorySearchStore::new());
    let report_store = Arc::new(FilesystemReportStore::new(
        service_config.reports.storage_path.clone(),
    ));

    let metrics = match ServiceMetrics::new() {
        Ok(metrics) => metrics,
        Err(e) => {
            error!(error = %e, "Failed to register metrics collectors; aborting");
            std::process::exit(3);
        }
    };

    let verifier = match InteractionVerifier::from_hex(&service_config.discord.public_key) {
        Ok(verifier) => verifier,
        Err(e) => {
            error!(error = %e, "Discord public key is not a usable Ed25519 key; aborting");
            std::process::exit(3);
        }
    };

    let revolt_token = ApiToken::from_string(service_config.revolt.webhook_token.clone());

    let orchestrator = Arc::new(SearchOrchestrator::new(lookup_client, search_store.clone()));
    let renderer = Arc::new(MessageRenderer::new(
        report_store.clone(),
        service_config.reports.public_base_url.clone(),
    ));
    let dispatcher = Arc::new(CommandDispatcher::new(
        orchestrator.clone(),
        renderer,
        search_store.clone(),
    ));

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        "Starting HTTP server"
    );

    let state = AppState::new(
        service_config,
        dispatcher,
        orchestrator,
        search_store,
        report_store,
        verifier,
        revolt_token,
        metrics,
    );

    // Start the server
    if let Err(e) = start_server(state).await {
        error!("Failed to start server: {}", e);

        let exit_code = match e {
            ServiceError::BindFailed { .. } => 1,
            ServiceError::ServerFailed { .. } => 2,
            ServiceError::Configuration(_) => 3,
        };

        std::process::exit(exit_code);
    }

    Ok(())
}
