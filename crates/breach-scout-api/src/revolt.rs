//! Revolt bridge endpoint
//!
//! The bridge forwards channel messages as JSON events and authenticates
//! every delivery with a shared bearer token. Non-message events and
//! messages that do not start with the command prefix are acknowledged but
//! ignored, so the bridge can forward traffic unfiltered.

use crate::{errors::ApiError, AppState};
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    response::Json,
};
use breach_scout_core::{ChannelProfile, Command, ValidationError};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{debug, info, instrument, warn};

/// Event type the bridge forwards for channel messages
pub const MESSAGE_EVENT_TYPE: &str = "Message";

/// Incoming bridge event
#[derive(Debug, Clone, Deserialize)]
pub struct RevoltEvent {
    /// Event type discriminator
    #[serde(rename = "type")]
    pub event_type: String,

    /// Message text, present on message events
    #[serde(default)]
    pub content: Option<String>,

    /// Author identifier, used only for logging
    #[serde(default)]
    pub author: Option<String>,
}

/// Outcome returned to the bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevoltReply {
    /// "replied" when a command ran, "ignored" otherwise
    pub status: String,

    /// Reply text for the bridge to post back into the channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl RevoltReply {
    /// Reply carrying text for the bridge to post
    pub fn replied(content: impl Into<String>) -> Self {
        Self {
            status: "replied".to_string(),
            content: Some(content.into()),
        }
    }

    /// Acknowledgement without a reply
    pub fn ignored() -> Self {
        Self {
            status: "ignored".to_string(),
            content: None,
        }
    }
}

/// Handle message events forwarded by the Revolt bridge
#[instrument(skip(state, headers, body))]
pub async fn handle_revolt_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RevoltReply>, ApiError> {
    let start = std::time::Instant::now();

    let presented = match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) => value,
        None => {
            warn!("Bridge event rejected: missing authorization header");
            state.metrics.record_authentication_failure(false);
            return Err(ApiError::Unauthorized);
        }
    };

    if !token_matches(presented, state.revolt_token.expose_secret()) {
        warn!("Bridge event rejected: bearer token mismatch");
        state.metrics.record_authentication_failure(false);
        return Err(ApiError::Unauthorized);
    }

    let event: RevoltEvent = serde_json::from_slice(&body).map_err(|e| {
        ApiError::Validation(ValidationError::InvalidFormat {
            field: "body".to_string(),
            message: format!("Invalid bridge event payload: {}", e),
        })
    })?;

    if event.event_type != MESSAGE_EVENT_TYPE {
        debug!(event_type = %event.event_type, "Ignoring non-message bridge event");
        return Ok(Json(RevoltReply::ignored()));
    }

    let content = match event.content.as_deref() {
        Some(content) if !content.trim().is_empty() => content,
        _ => {
            debug!("Ignoring message event without content");
            return Ok(Json(RevoltReply::ignored()));
        }
    };

    let command = match Command::from_message_text(content, &state.config.revolt.command_prefix) {
        Some(command) => command,
        None => {
            debug!("Message does not start with the command prefix, ignoring");
            return Ok(Json(RevoltReply::ignored()));
        }
    };

    let command_name = command.name();
    let author = event.author.as_deref().unwrap_or("unknown");
    let profile = ChannelProfile::revolt();
    let reply = state.dispatcher.dispatch(command, &profile).await;

    if reply.report.is_some() {
        state.metrics.overflow_reports_total.inc();
    }
    state
        .metrics
        .record_interaction("revolt", command_name, start.elapsed());
    info!(
        command = command_name,
        author = author,
        truncated = reply.truncated,
        "Bridge command handled"
    );

    Ok(Json(RevoltReply::replied(reply.body_text)))
}

/// Compare a presented token against the configured one in constant time
///
/// The "Bearer " prefix is optional. Length is compared first; mismatched
/// lengths cannot be equal, and equal lengths are compared without
/// short-circuiting so the token cannot be probed byte by byte.
pub(crate) fn token_matches(presented: &str, expected: &str) -> bool {
    let presented = presented.strip_prefix("Bearer ").unwrap_or(presented);
    let presented = presented.as_bytes();
    let expected = expected.as_bytes();

    if presented.len() != expected.len() {
        return false;
    }

    presented.ct_eq(expected).into()
}

#[cfg(test)]
#[path = "revolt_tests.rs"]
mod tests;
