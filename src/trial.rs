//! Trial executor
//!
//! Turns one collaborator envelope into one [`TrialOutcome`]:
//! ENVELOPE → CANDIDATE → SANITIZE → EVALUATE
//!
//! Synchronous and never retries. Resampling happens by running more trials.

use crate::collaborator::CompletionEnvelope;
use crate::document::Document;
use crate::error::TrialError;
use crate::models::TrialOutcome;
use crate::query::QueryRuntime;
use serde_json::Value;
use tracing::{debug, warn};

const FENCE: &str = "```";

/// Executes candidate queries against a document
#[derive(Clone, Copy)]
pub struct TrialExecutor {
    runtime: &'static QueryRuntime,
}

impl TrialExecutor {
    pub fn new(runtime: &'static QueryRuntime) -> Self {
        Self { runtime }
    }

    pub fn execute(&self, envelope: &CompletionEnvelope, document: &Document) -> TrialOutcome {
        self.run(envelope, document).into()
    }

    fn run(&self, envelope: &CompletionEnvelope, document: &Document) -> Result<Value, TrialError> {
        let raw = extract_candidate(envelope)?;
        let query = sanitize(raw);

        if query.is_empty() {
            return Err(TrialError::EmptyCandidate);
        }

        debug!(query = %query, "Evaluating candidate query");

        self.runtime
            .evaluate(&query, document.root())
            .map_err(|message| {
                warn!(query = %query, error = %message, "Candidate query failed");
                TrialError::QueryExecutionError(message)
            })
    }
}

/// Pull the first choice's message content out of the envelope.
pub fn extract_candidate(envelope: &CompletionEnvelope) -> Result<&str, TrialError> {
    let choice = envelope.choices.first().ok_or_else(|| {
        TrialError::MalformedEnvelope("Envelope contains no choices".to_string())
    })?;

    choice
        .message
        .as_ref()
        .ok_or_else(|| TrialError::MalformedEnvelope("Choice has no message".to_string()))?
        .content
        .as_deref()
        .ok_or_else(|| TrialError::MalformedEnvelope("Message has no content".to_string()))
}

/// Reduce raw model text to a bare query string.
///
/// If the text contains a fenced code block only its body is kept, without
/// the fences or a language tag on the opening line. Surrounding whitespace
/// and stray backticks are then trimmed. Clean input comes back unchanged.
pub fn sanitize(raw: &str) -> String {
    let text = match raw.find(FENCE) {
        Some(start) => fenced_body(&raw[start + FENCE.len()..]),
        None => raw,
    };

    text.trim_matches(|c: char| c.is_whitespace() || c == '`')
        .to_string()
}

/// Tags models put after the opening fence
const KNOWN_TAGS: &[&str] = &["jmespath", "json", "query"];

/// Body of a fenced block, given the text right after the opening fence.
fn fenced_body(after_fence: &str) -> &str {
    let block = match after_fence.find(FENCE) {
        Some(end) => &after_fence[..end],
        None => after_fence,
    };

    strip_language_tag(block)
}

/// Drop a leading language tag, but never the whole query.
///
/// A known tag followed by whitespace is dropped wherever the query starts.
/// Any other identifier-like first line only counts as a tag when more text
/// follows it inside the block.
fn strip_language_tag(block: &str) -> &str {
    for tag in KNOWN_TAGS {
        if let Some(rest) = block.strip_prefix(tag) {
            if rest.starts_with(char::is_whitespace) && !rest.trim().is_empty() {
                return rest;
            }
        }
    }

    match block.split_once('\n') {
        Some((first_line, rest))
            if is_language_tag(first_line.trim()) && !rest.trim().is_empty() =>
        {
            rest
        }
        _ => block,
    }
}

fn is_language_tag(line: &str) -> bool {
    line.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
