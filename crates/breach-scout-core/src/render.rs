//! # Channel Rendering
//!
//! Turns normalized search results into chat-sized messages. Small result
//! sets render inline in full; large sets render a preview plus a link to a
//! stored overflow report. The hard body limit is enforced last, so no
//! message ever exceeds the channel's maximum regardless of content.

use crate::normalize::NormalizedResult;
use crate::report::{build_report, ReportError, ReportMetadata, ReportStore};
use crate::{ReportId, Timestamp};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Marker appended when a body is clamped to the channel limit
const TRUNCATION_MARKER: &str = "\n(response truncated)";

/// Marker appended to shortened content snippets
const ELLIPSIS: &str = "...";

// ============================================================================
// Channel Profiles
// ============================================================================

/// Markup dialect a channel understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupStyle {
    /// Discord/Revolt-flavored markdown
    Markdown,

    /// No markup, plain text only
    Plain,
}

impl MarkupStyle {
    /// Render text as bold
    pub fn bold(&self, text: &str) -> String {
        match self {
            Self::Markdown => format!("**{}**", text),
            Self::Plain => text.to_string(),
        }
    }

    /// Render text as inline code
    pub fn code(&self, text: &str) -> String {
        match self {
            Self::Markdown => format!("`{}`", text),
            Self::Plain => text.to_string(),
        }
    }
}

/// Rendering limits and markup for one chat channel
#[derive(Debug, Clone)]
pub struct ChannelProfile {
    /// Channel name used in logs
    pub name: String,

    /// Hard upper bound on message body characters
    pub max_body_chars: usize,

    /// Largest result count rendered fully inline
    pub max_inline_results: usize,

    /// Character budget for each result's content snippet
    pub snippet_chars: usize,

    /// How many data type names to list before collapsing the rest
    pub shown_data_types: usize,

    /// Markup dialect for this channel
    pub markup: MarkupStyle,
}

impl ChannelProfile {
    /// Profile for Discord interaction responses.
    ///
    /// Discord caps message content at 2000 characters; the body limit
    /// leaves headroom for client-side decoration.
    pub fn discord() -> Self {
        Self {
            name: "discord".to_string(),
            max_body_chars: 1900,
            max_inline_results: 3,
            snippet_chars: 150,
            shown_data_types: 3,
            markup: MarkupStyle::Markdown,
        }
    }

    /// Profile for Revolt messages
    pub fn revolt() -> Self {
        Self {
            name: "revolt".to_string(),
            max_body_chars: 1900,
            max_inline_results: 3,
            snippet_chars: 120,
            shown_data_types: 3,
            markup: MarkupStyle::Markdown,
        }
    }

    /// Markup-free profile for terminals and tests
    pub fn plain() -> Self {
        Self {
            name: "plain".to_string(),
            max_body_chars: 1900,
            max_inline_results: 3,
            snippet_chars: 150,
            shown_data_types: 3,
            markup: MarkupStyle::Plain,
        }
    }
}

// ============================================================================
// Rendered Output
// ============================================================================

/// A message ready to send to a chat channel
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    /// Message body, guaranteed within the channel's character limit
    pub body_text: String,

    /// Whether the body was clamped to the channel limit
    pub truncated: bool,

    /// Metadata of the overflow report, when one was generated
    pub report: Option<ReportMetadata>,
}

impl RenderedMessage {
    /// A plain informational message with no report attached
    pub fn plain(body_text: impl Into<String>) -> Self {
        Self {
            body_text: body_text.into(),
            truncated: false,
            report: None,
        }
    }
}

/// Errors that can occur during rendering
#[derive(Debug, Error)]
pub enum RenderError {
    /// Overflow report could not be persisted
    #[error("Report storage failed: {0}")]
    Report(#[from] ReportError),
}

// ============================================================================
// Renderer
// ============================================================================

/// Renders search results for a chat channel.
///
/// Rendering is deterministic for a given result set and profile; the only
/// side effect is persisting the overflow report when the result count
/// exceeds the inline limit.
pub struct MessageRenderer {
    report_store: Arc<dyn ReportStore>,
    public_base_url: String,
}

impl MessageRenderer {
    /// Create a renderer backed by the given report store.
    ///
    /// `public_base_url` is the externally reachable service root used to
    /// build report download links.
    pub fn new(report_store: Arc<dyn ReportStore>, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self {
            report_store,
            public_base_url,
        }
    }

    /// Render a result set for the given channel.
    ///
    /// Zero results yield a short notice. Up to `max_inline_results` render
    /// inline. Larger sets render a preview of the first results plus a link
    /// to the full report, which is persisted before the message is built.
    #[instrument(skip(self, results, query_text), fields(channel = %profile.name, result_count = results.len()))]
    pub async fn render(
        &self,
        results: &[NormalizedResult],
        query_text: &str,
        profile: &ChannelProfile,
    ) -> Result<RenderedMessage, RenderError> {
        if results.is_empty() {
            return Ok(RenderedMessage::plain(format!(
                "No results found for {}",
                profile.markup.code(query_text)
            )));
        }

        let body = if results.len() <= profile.max_inline_results {
            self.compose_inline(results, query_text, profile)
        } else {
            let report_id = ReportId::new();
            let report_body =
                build_report(results, query_text, results.len() as u64, Timestamp::now());
            let metadata = self.report_store.store_report(&report_id, &report_body).await?;

            info!(
                report_id = %report_id,
                size_bytes = metadata.size_bytes,
                "Stored overflow report"
            );

            let body = self.compose_overflow(results, query_text, &report_id, profile);
            let (body_text, truncated) = clamp_body(body, profile.max_body_chars);
            return Ok(RenderedMessage {
                body_text,
                truncated,
                report: Some(metadata),
            });
        };

        let (body_text, truncated) = clamp_body(body, profile.max_body_chars);
        if truncated {
            debug!(channel = %profile.name, "Inline body clamped to channel limit");
        }

        Ok(RenderedMessage {
            body_text,
            truncated,
            report: None,
        })
    }

    /// Compose the body for a result set that fits inline
    fn compose_inline(
        &self,
        results: &[NormalizedResult],
        query_text: &str,
        profile: &ChannelProfile,
    ) -> String {
        let mut body = header_line(results.len(), query_text, profile);

        for (index, result) in results.iter().enumerate() {
            body.push('\n');
            body.push('\n');
            body.push_str(&result_entry(result, index + 1, profile));
        }

        body
    }

    /// Compose the preview body for an oversized result set
    fn compose_overflow(
        &self,
        results: &[NormalizedResult],
        query_text: &str,
        report_id: &ReportId,
        profile: &ChannelProfile,
    ) -> String {
        let mut body = header_line(results.len(), query_text, profile);

        for (index, result) in results.iter().take(profile.max_inline_results).enumerate() {
            body.push('\n');
            body.push('\n');
            body.push_str(&result_entry(result, index + 1, profile));
        }

        body.push('\n');
        body.push('\n');
        body.push_str(&format!(
            "Full report ({} results): {}/reports/{}",
            results.len(),
            self.public_base_url,
            report_id
        ));

        body
    }
}

impl std::fmt::Debug for MessageRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRenderer")
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}

// ============================================================================
// Body Composition Helpers
// ============================================================================

/// Summary line opening every non-empty response
fn header_line(count: usize, query_text: &str, profile: &ChannelProfile) -> String {
    let noun = if count == 1 { "result" } else { "results" };
    format!(
        "Found {} {} for {}",
        count,
        noun,
        profile.markup.code(query_text)
    )
}

/// One numbered result entry with a content snippet
fn result_entry(result: &NormalizedResult, number: usize, profile: &ChannelProfile) -> String {
    let mut entry = profile
        .markup
        .bold(&format!("{}. {}", number, result.source_name));

    entry.push('\n');
    entry.push_str(&format!(
        "Matched field: {}",
        profile.markup.code(&result.matched_field)
    ));

    entry.push('\n');
    entry.push_str(&format!(
        "Data types: {}",
        data_type_summary(&result.data_type_names, profile.shown_data_types)
    ));

    if let Some(date) = &result.breach_date {
        entry.push('\n');
        entry.push_str(&format!("Breach date: {}", date));
    }

    entry.push('\n');
    entry.push_str(&snippet(&result.content, profile.snippet_chars));

    entry
}

/// Comma-joined data type names, collapsing the tail beyond `shown`
fn data_type_summary(names: &[String], shown: usize) -> String {
    if names.is_empty() {
        return "none".to_string();
    }

    let visible: Vec<&str> = names.iter().take(shown).map(String::as_str).collect();
    let hidden = names.len().saturating_sub(shown);

    if hidden > 0 {
        format!("{} (+{} more)", visible.join(", "), hidden)
    } else {
        visible.join(", ")
    }
}

/// Leading slice of the result content, marked when shortened
fn snippet(content: &str, snippet_chars: usize) -> String {
    let trimmed = content.trim_end();
    match truncate_chars(trimmed, snippet_chars) {
        Some(cut) => format!("{}{}", cut, ELLIPSIS),
        None => trimmed.to_string(),
    }
}

/// Enforce the channel's hard body limit.
///
/// When the body exceeds `max_chars`, it is cut so that body plus marker
/// together stay within the limit.
fn clamp_body(body: String, max_chars: usize) -> (String, bool) {
    if body.chars().count() <= max_chars {
        return (body, false);
    }

    let marker_chars = TRUNCATION_MARKER.chars().count();
    let keep = max_chars.saturating_sub(marker_chars);
    let cut: String = body.chars().take(keep).collect();

    (format!("{}{}", cut, TRUNCATION_MARKER), true)
}

/// Cut text to at most `max_chars` characters.
///
/// Returns `None` when the text already fits. Operates on character
/// boundaries, never splitting a multi-byte sequence.
fn truncate_chars(text: &str, max_chars: usize) -> Option<&str> {
    let byte_index = text.char_indices().nth(max_chars)?.0;
    Some(&text[..byte_index])
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
