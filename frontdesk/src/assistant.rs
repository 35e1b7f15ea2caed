//! Conversational assistant backed by an OpenAI-compatible chat API

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use shared::config::AssistantConfig;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Oldest turns beyond this many are dropped before a request
pub const MAX_HISTORY: usize = 20;

pub const SYSTEM_PROMPT: &str = "You are the front-desk assistant of a hotel. \
Answer staff questions about arrivals, departures, occupancy and guests using only \
the hotel data provided. Be concise and answer in the language of the question. \
If the data does not contain the answer, say so.";

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Assistant request failed: {0}")]
    Transport(String),

    #[error("Assistant returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Assistant returned an empty reply")]
    EmptyReply,
}

impl From<reqwest::Error> for AssistantError {
    fn from(err: reqwest::Error) -> Self {
        AssistantError::Transport(err.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait Assistant: Send + Sync {
    /// Answer the last turn of `history` given the hotel `context`
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        context: &str,
    ) -> Result<String, AssistantError>;
}

/// System prompt, then the hotel context, then the most recent conversation turns.
///
/// System messages supplied by the caller are discarded.
pub fn build_messages(system_prompt: &str, history: &[ChatMessage], context: &str) -> Vec<ChatMessage> {
    let turns: Vec<&ChatMessage> = history
        .iter()
        .filter(|m| m.role != ChatRole::System && !m.content.trim().is_empty())
        .collect();
    let skip = turns.len().saturating_sub(MAX_HISTORY);

    let mut messages = vec![
        ChatMessage::new(ChatRole::System, system_prompt),
        ChatMessage::new(ChatRole::System, format!("Current hotel data:\n{context}")),
    ];
    messages.extend(turns.into_iter().skip(skip).cloned());
    messages
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ApiError {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Client for `{base_url}/chat/completions`
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ChatCompletionsClient {
    pub fn new(config: &AssistantConfig) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Assistant for ChatCompletionsClient {
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        context: &str,
    ) -> Result<String, AssistantError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: build_messages(system_prompt, history, context),
            temperature: 0.3,
        };
        debug!(
            "assistant request: model={}, messages={}",
            self.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ApiError>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            warn!("assistant error: status={}, message={}", status, message);

            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => AssistantError::Status {
                    status: status.as_u16(),
                    message: format!("rate limited: {message}"),
                },
                _ => AssistantError::Status {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let body: CompletionResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .filter(|reply| !reply.is_empty())
            .ok_or(AssistantError::EmptyReply)
    }
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
