//! # Command Dispatch
//!
//! Parses chat commands from both entry points, slash-command interactions
//! and prefixed messages, and routes them to the search pipeline.
//!
//! Dispatch is the error boundary: every internal failure is logged in full
//! and replaced with a short generic reply. Provider URLs, tokens, and
//! backend error text never reach the channel.

use crate::orchestrator::{SearchError, SearchOrchestrator};
use crate::render::{ChannelProfile, MessageRenderer, RenderedMessage};
use crate::store::SearchStore;
use crate::LookupError;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Upper bound on user-facing error reply length
const ERROR_MESSAGE_MAX_CHARS: usize = 100;

/// Longest command name echoed back in an unknown-command reply
const UNKNOWN_NAME_MAX_CHARS: usize = 30;

/// Reply for the connectivity test command
const TEST_REPLY: &str = "Breach Scout is online.";

/// Reply listing every supported command
const HELP_TEXT: &str = "Breach Scout commands:\n\
    search <query> - search breach data for an email, username, phone, or password\n\
    stats - show totals across all searches\n\
    test - check that the bot is responsive\n\
    help - show this message";

// ============================================================================
// Command Model
// ============================================================================

/// Value carried by an interaction option
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Text option
    String(String),

    /// Numeric option, always a float on the wire
    Number(f64),

    /// Boolean option
    Boolean(bool),
}

impl OptionValue {
    /// The option as text, if it is one
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    /// The option as a non-negative integer, if it is one
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Number(value) if value.fract() == 0.0 && *value >= 0.0 && *value <= u32::MAX as f64 => {
                Some(*value as u32)
            }
            _ => None,
        }
    }
}

/// A named option attached to a slash-command interaction
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommandOption {
    /// Option name
    pub name: String,

    /// Option value
    pub value: OptionValue,
}

/// A parsed chat command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Run a breach search
    Search { query: String, limit: Option<u32> },

    /// Show aggregate search counters
    Stats,

    /// Show the command list
    Help,

    /// Connectivity check
    Test,

    /// Anything else the user typed
    Unknown { name: String },
}

impl Command {
    /// Build a command from a slash-command interaction.
    ///
    /// Missing options degrade rather than fail: a search without a query
    /// option becomes an empty-query search, which dispatch rejects with a
    /// usage message.
    pub fn from_interaction(name: &str, options: &[CommandOption]) -> Self {
        match name {
            "search" => {
                let query = options
                    .iter()
                    .find(|option| option.name == "query")
                    .and_then(|option| option.value.as_text())
                    .unwrap_or("")
                    .to_string();
                let limit = options
                    .iter()
                    .find(|option| option.name == "limit")
                    .and_then(|option| option.value.as_u32());
                Self::Search { query, limit }
            }
            "stats" => Self::Stats,
            "help" => Self::Help,
            "test" => Self::Test,
            other => Self::Unknown {
                name: other.to_string(),
            },
        }
    }

    /// Parse a command from prefixed message text.
    ///
    /// Returns `None` for messages that do not start with the prefix and
    /// for a bare prefix with nothing after it. The prefix may be attached
    /// directly to the command name or separated by whitespace.
    pub fn from_message_text(text: &str, prefix: &str) -> Option<Self> {
        let stripped = text.trim().strip_prefix(prefix)?;
        let mut parts = stripped.split_whitespace();
        let name = parts.next()?;

        Some(match name {
            "search" => {
                let query = parts.collect::<Vec<_>>().join(" ");
                Self::Search { query, limit: None }
            }
            "stats" => Self::Stats,
            "help" => Self::Help,
            "test" => Self::Test,
            other => Self::Unknown {
                name: other.to_string(),
            },
        })
    }

    /// Stable command name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Search { .. } => "search",
            Self::Stats => "stats",
            Self::Help => "help",
            Self::Test => "test",
            Self::Unknown { .. } => "unknown",
        }
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Routes parsed commands to the search pipeline and renders replies.
///
/// Dispatch never fails: errors are logged with their search ID and the
/// caller receives a short reply it can send as-is.
pub struct CommandDispatcher {
    orchestrator: Arc<SearchOrchestrator>,
    renderer: Arc<MessageRenderer>,
    store: Arc<dyn SearchStore>,
}

impl CommandDispatcher {
    /// Create a dispatcher over the given pipeline components
    pub fn new(
        orchestrator: Arc<SearchOrchestrator>,
        renderer: Arc<MessageRenderer>,
        store: Arc<dyn SearchStore>,
    ) -> Self {
        Self {
            orchestrator,
            renderer,
            store,
        }
    }

    /// Execute a command and produce the reply for the channel
    #[instrument(skip(self, command, profile), fields(command = command.name(), channel = %profile.name))]
    pub async fn dispatch(&self, command: Command, profile: &ChannelProfile) -> RenderedMessage {
        info!("Dispatching command");

        match command {
            Command::Search { query, limit } => self.run_search(&query, limit, profile).await,
            Command::Stats => self.show_stats().await,
            Command::Help => RenderedMessage::plain(HELP_TEXT),
            Command::Test => RenderedMessage::plain(TEST_REPLY),
            Command::Unknown { name } => {
                let shown: String = name.chars().take(UNKNOWN_NAME_MAX_CHARS).collect();
                RenderedMessage::plain(bounded(format!(
                    "Unknown command: {}. Send help for the command list.",
                    shown
                )))
            }
        }
    }

    async fn run_search(
        &self,
        query: &str,
        limit: Option<u32>,
        profile: &ChannelProfile,
    ) -> RenderedMessage {
        let query = query.trim();
        if query.is_empty() {
            return RenderedMessage::plain("Provide a query to search for.");
        }

        let outcome = match self.orchestrator.run(query, limit).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(
                    search_id = %error.search_id(),
                    error = %error,
                    "Search failed"
                );
                return RenderedMessage::plain(search_error_reply(&error));
            }
        };

        match self
            .renderer
            .render(&outcome.results, query, profile)
            .await
        {
            Ok(message) => message,
            Err(error) => {
                warn!(
                    search_id = %outcome.search_id,
                    error = %error,
                    "Rendering failed"
                );
                RenderedMessage::plain(bounded(
                    "Results were found but the reply could not be built. Try again shortly."
                        .to_string(),
                ))
            }
        }
    }

    async fn show_stats(&self) -> RenderedMessage {
        match self.store.stats().await {
            Ok(stats) => RenderedMessage::plain(format!(
                "Total searches: {}\nTotal results: {}",
                stats.total_searches, stats.total_results
            )),
            Err(error) => {
                warn!(error = %error, "Stats query failed");
                RenderedMessage::plain(bounded(
                    "Stats are unavailable right now. Try again shortly.".to_string(),
                ))
            }
        }
    }
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher").finish()
    }
}

// ============================================================================
// Error Replies
// ============================================================================

/// Map a search failure to a short reply safe for the channel.
///
/// Replies name the failure category only. Backend hostnames, tokens, and
/// raw error text stay in the logs.
fn search_error_reply(error: &SearchError) -> String {
    let reply = match error {
        SearchError::Lookup { source, .. } => match source {
            LookupError::Configuration { .. } => "The search backend is not configured.".to_string(),
            LookupError::Validation(validation) => validation.to_string(),
            LookupError::Transport { .. } => {
                "The breach provider is unreachable. Try again shortly.".to_string()
            }
            LookupError::Remote { code } => {
                format!("The breach provider rejected the request (code {}).", code)
            }
            LookupError::Malformed { .. } => {
                "The breach provider returned an unreadable response.".to_string()
            }
        },
        SearchError::Store { .. } => {
            "The search could not be recorded. Try again shortly.".to_string()
        }
    };

    bounded(reply)
}

/// Clamp a reply to the error message budget
fn bounded(message: String) -> String {
    if message.chars().count() <= ERROR_MESSAGE_MAX_CHARS {
        return message;
    }

    message.chars().take(ERROR_MESSAGE_MAX_CHARS).collect()
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
