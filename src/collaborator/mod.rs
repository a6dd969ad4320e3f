//! Text-generation collaborator
//!
//! The collaborator translates a natural-language question into a candidate
//! JMESPath query. Only the request/response boundary lives here; sanitizing
//! and executing the answer is the trial executor's job.

use crate::error::TrialError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub mod openai;
pub mod prompt;

pub use openai::ChatCompletionsClient;

/// What every trial sends: fixed instruction plus the user question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub question: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            question: question.into(),
        }
    }
}

/// Chat-completions response envelope.
///
/// Missing pieces default to empty so that a structurally incomplete body
/// still parses and is reported as a malformed envelope downstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionEnvelope {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionEnvelope {
    /// Envelope with a single assistant message
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                message: Some(ChoiceMessage {
                    role: Some("assistant".to_string()),
                    content: Some(content.into()),
                }),
                finish_reason: Some("stop".to_string()),
            }],
        }
    }
}

/// Trait for the external text-generation service
#[async_trait]
pub trait Collaborator: Send + Sync {
    async fn complete(&self, prompt: &Prompt) -> Result<CompletionEnvelope, TrialError>;
}

/// One canned reply for [`ScriptedCollaborator`]
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Content(String),
    Envelope(CompletionEnvelope),
    Error(TrialError),
    Delayed(Duration, Box<ScriptedReply>),
}

impl ScriptedReply {
    pub fn content(text: impl Into<String>) -> Self {
        ScriptedReply::Content(text.into())
    }

    pub fn delayed(self, delay: Duration) -> Self {
        ScriptedReply::Delayed(delay, Box::new(self))
    }
}

/// Scripted collaborator for development & testing.
///
/// Replies are handed out in call order, cycling when the script runs out.
/// Every received prompt is recorded.
pub struct ScriptedCollaborator {
    replies: Vec<ScriptedReply>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedCollaborator {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Collaborator for ScriptedCollaborator {
    async fn complete(&self, prompt: &Prompt) -> Result<CompletionEnvelope, TrialError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.clone());
        }

        if self.replies.is_empty() {
            return Err(TrialError::CollaboratorError(
                "No scripted replies".to_string(),
            ));
        }

        let mut reply = self.replies[call % self.replies.len()].clone();

        loop {
            match reply {
                ScriptedReply::Content(text) => return Ok(CompletionEnvelope::with_content(text)),
                ScriptedReply::Envelope(envelope) => return Ok(envelope),
                ScriptedReply::Error(err) => return Err(err),
                ScriptedReply::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    reply = *inner;
                }
            }
        }
    }
}
