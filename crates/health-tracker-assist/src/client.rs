//! Chat-completion client for the health assistant.

use health_tracker_core::config::AssistantConfig;
use health_tracker_core::models::{ChatMessage, VitalsHint};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::extraction::parse_vitals_reply;
use crate::prompts::VITALS_EXTRACTION_PROMPT;
use crate::{ensure_success, AssistError, AssistResult};

/// Client for an OpenAI-style chat-completion API.
#[derive(Debug, Clone)]
pub struct AssistantClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

impl AssistantClient {
    /// Build a client with the configured request timeout.
    pub fn from_config(config: &AssistantConfig) -> AssistResult<Self> {
        if !config.enabled {
            return Err(AssistError::NotConfigured("assistant is disabled".into()));
        }
        if config.api_key.is_empty() {
            return Err(AssistError::NotConfigured("assistant api_key is empty".into()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    /// Send a conversation and return the assistant's reply.
    pub async fn ask(&self, messages: &[ChatMessage]) -> AssistResult<String> {
        let messages = messages
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;

        self.complete(messages).await
    }

    /// Read vitals from a photo of a meter.
    ///
    /// The reply is parsed and range-checked; use the result only to prefill
    /// a health record form.
    pub async fn extract_vitals(&self, image_url: &str) -> AssistResult<VitalsHint> {
        let messages = vec![json!({
            "role": "user",
            "content": [
                { "type": "text", "text": VITALS_EXTRACTION_PROMPT },
                { "type": "image_url", "image_url": { "url": image_url } },
            ],
        })];

        let reply = self.complete(messages).await?;
        let hint = parse_vitals_reply(&reply)?;

        tracing::info!(empty = hint.is_empty(), "Extracted vitals from photo");
        Ok(hint)
    }

    async fn complete(&self, messages: Vec<serde_json::Value>) -> AssistResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = CompletionRequest {
            model: &self.model,
            messages,
        };

        tracing::debug!(model = %self.model, messages = request.messages.len(), "Calling assistant");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let body: CompletionResponse = serde_json::from_str(&response.text().await?)?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AssistError::InvalidFormat("Reply has no message content".into()))
    }
}
