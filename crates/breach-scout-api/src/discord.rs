//! Discord interactions endpoint
//!
//! Implements the interactions webhook contract: every request carries an
//! Ed25519 signature over the timestamp header and the raw body, and the
//! signature must verify before any part of the payload is trusted. Ping
//! interactions are answered with a pong; application commands run through
//! the shared dispatcher and are answered with an ephemeral channel message
//! so results stay visible only to the invoking user.

use crate::{errors::ApiError, AppState};
use axum::{
    extract::State,
    http::HeaderMap,
    response::Json,
};
use breach_scout_core::{ChannelProfile, Command, CommandOption, ValidationError};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Header carrying the hex-encoded request signature
pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";

/// Header carrying the timestamp the signature covers
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Interaction sent as a connectivity check
pub const INTERACTION_TYPE_PING: u8 = 1;

/// Interaction carrying a slash command invocation
pub const INTERACTION_TYPE_APPLICATION_COMMAND: u8 = 2;

/// Callback acknowledging a ping
pub const CALLBACK_TYPE_PONG: u8 = 1;

/// Callback posting a message into the channel
pub const CALLBACK_TYPE_CHANNEL_MESSAGE: u8 = 4;

/// Message flag that keeps the reply visible only to the invoking user
pub const EPHEMERAL_FLAG: u64 = 1 << 6;

/// Incoming interaction payload
#[derive(Debug, Clone, Deserialize)]
pub struct InteractionRequest {
    /// Interaction type discriminator
    #[serde(rename = "type")]
    pub interaction_type: u8,

    /// Command payload, present on application command interactions
    #[serde(default)]
    pub data: Option<InteractionData>,
}

/// Command portion of an application command interaction
#[derive(Debug, Clone, Deserialize)]
pub struct InteractionData {
    /// Command name as registered with the platform
    pub name: String,

    /// Supplied command options
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

/// Outgoing interaction callback
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionResponse {
    /// Callback type discriminator
    #[serde(rename = "type")]
    pub response_type: u8,

    /// Message payload, absent on pong callbacks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<InteractionCallbackData>,
}

/// Message content of a channel message callback
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionCallbackData {
    /// Reply text
    pub content: String,

    /// Message flags
    pub flags: u64,
}

impl InteractionResponse {
    /// Acknowledge a ping interaction
    pub fn pong() -> Self {
        Self {
            response_type: CALLBACK_TYPE_PONG,
            data: None,
        }
    }

    /// Reply with an ephemeral channel message
    pub fn ephemeral_message(content: impl Into<String>) -> Self {
        Self {
            response_type: CALLBACK_TYPE_CHANNEL_MESSAGE,
            data: Some(InteractionCallbackData {
                content: content.into(),
                flags: EPHEMERAL_FLAG,
            }),
        }
    }
}

/// Handle Discord interaction requests
///
/// Signature verification runs against the raw body before parsing.
/// Requests that fail verification get a uniform 401 with no detail about
/// which check rejected them.
#[instrument(skip(state, headers, body))]
pub async fn handle_discord_interaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<InteractionResponse>, ApiError> {
    let start = std::time::Instant::now();

    let signature = match header_value(&headers, SIGNATURE_HEADER) {
        Some(value) => value,
        None => {
            warn!(
                header = SIGNATURE_HEADER,
                "Interaction rejected: missing signature header"
            );
            state.metrics.record_authentication_failure(true);
            return Err(ApiError::Unauthorized);
        }
    };

    let timestamp = match header_value(&headers, TIMESTAMP_HEADER) {
        Some(value) => value,
        None => {
            warn!(
                header = TIMESTAMP_HEADER,
                "Interaction rejected: missing timestamp header"
            );
            state.metrics.record_authentication_failure(true);
            return Err(ApiError::Unauthorized);
        }
    };

    if !state.verifier.verify(timestamp, &body, signature) {
        warn!("Interaction rejected: signature verification failed");
        state.metrics.record_authentication_failure(true);
        return Err(ApiError::Unauthorized);
    }

    let interaction: InteractionRequest = serde_json::from_slice(&body).map_err(|e| {
        ApiError::Validation(ValidationError::InvalidFormat {
            field: "body".to_string(),
            message: format!("Invalid interaction payload: {}", e),
        })
    })?;

    match interaction.interaction_type {
        INTERACTION_TYPE_PING => {
            info!("Responding to interaction ping");
            state
                .metrics
                .record_interaction("discord", "ping", start.elapsed());
            Ok(Json(InteractionResponse::pong()))
        }
        INTERACTION_TYPE_APPLICATION_COMMAND => {
            let data = match interaction.data {
                Some(data) => data,
                None => {
                    return Err(ApiError::Validation(ValidationError::Required {
                        field: "data".to_string(),
                    }));
                }
            };

            let command = Command::from_interaction(&data.name, &data.options);
            let command_name = command.name();
            let profile = ChannelProfile::discord();
            let reply = state.dispatcher.dispatch(command, &profile).await;

            if reply.report.is_some() {
                state.metrics.overflow_reports_total.inc();
            }
            state
                .metrics
                .record_interaction("discord", command_name, start.elapsed());
            info!(
                command = command_name,
                truncated = reply.truncated,
                "Interaction command handled"
            );

            Ok(Json(InteractionResponse::ephemeral_message(reply.body_text)))
        }
        other => Err(ApiError::Validation(ValidationError::InvalidFormat {
            field: "type".to_string(),
            message: format!("Unsupported interaction type: {}", other),
        })),
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

#[cfg(test)]
#[path = "discord_tests.rs"]
mod tests;
