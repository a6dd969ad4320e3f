//! OpenAI-compatible chat completions client
//!
//! Works against any `/chat/completions` endpoint (OpenAI, LiteLLM proxies).
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::collaborator::{Collaborator, CompletionEnvelope, Prompt};
use crate::config::CollaboratorConfig;
use crate::error::{EngineError, TrialError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

/// Reusable completions client (connection-pooled)
pub struct ChatCompletionsClient {
    client: Client,
    api_url: String,
    api_token: String,
    model: String,
    temperature: Option<f32>,
}

impl ChatCompletionsClient {
    pub fn new(config: &CollaboratorConfig) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                EngineError::CollaboratorSetup(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_token: config.api_token.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn build_request<'a>(&'a self, prompt: &'a Prompt) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &prompt.system,
                },
                Message {
                    role: "user",
                    content: &prompt.question,
                },
            ],
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl Collaborator for ChatCompletionsClient {
    async fn complete(&self, prompt: &Prompt) -> Result<CompletionEnvelope, TrialError> {
        if self.api_token.is_empty() {
            return Err(TrialError::CollaboratorError(
                "LLM_API_TOKEN not configured".to_string(),
            ));
        }

        let request = self.build_request(prompt);

        debug!(model = %self.model, "Calling completion endpoint");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Completion request failed: {}", e);
                TrialError::CollaboratorError(format!("Request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Completion endpoint error response: {}", error_text);
            return Err(TrialError::CollaboratorError(format!(
                "Completion endpoint returned {}",
                status
            )));
        }

        response.json::<CompletionEnvelope>().await.map_err(|e| {
            error!("Failed to parse completion envelope: {}", e);
            TrialError::CollaboratorError(format!("Unparseable envelope: {}", e))
        })
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}
