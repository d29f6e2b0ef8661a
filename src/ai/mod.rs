//! Reasoning-service access.
//!
//! A thin client for the hosted chat-completions API. One attempt per
//! request, no retry; the callers in [`timeline`] and [`contract`] own the
//! fallback behavior when a call fails.

pub mod contract;
pub mod timeline;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("reasoning request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("reasoning service returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("completion had no content")]
    EmptyCompletion,
    #[error("malformed completion payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub struct ReasoningClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

// ─── Client ───────────────────────────────────────────────────────────────────

impl ReasoningClient {
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Run one chat completion and return the assistant text.
    ///
    /// `json_object` asks the service to constrain the answer to a single
    /// JSON object (used by the timeline prompt).
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        json_object: bool,
    ) -> Result<String, AiError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            response_format: json_object.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let resp = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AiError::Status {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        let body: ChatResponse = resp.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AiError::EmptyCompletion)
    }

    /// Cheap authenticated probe used by `agencyd doctor`. Lists models,
    /// which exercises the key without spending tokens.
    pub async fn probe(&self) -> Result<(), AiError> {
        let resp = self
            .http
            .get(format!("{}/v1/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(AiError::Status {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            })
        }
    }
}
