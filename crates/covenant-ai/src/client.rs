//! The [`CompletionClient`] capability and its OpenAI-compatible
//! implementation.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Capability to run one chat completion and return the assistant text.
pub trait CompletionClient: Send + Sync {
  fn complete<'a>(
    &'a self,
    system_prompt: &'a str,
    user_prompt: &'a str,
    temperature: f32,
    max_tokens: u32,
  ) -> impl Future<Output = Result<String>> + Send + 'a;
}

// ─── OpenAI-compatible implementation ────────────────────────────────────────

/// Talks to any `/chat/completions` endpoint speaking the OpenAI wire
/// format.
#[derive(Clone)]
pub struct OpenAiCompletionClient {
  http:     reqwest::Client,
  base_url: String,
  api_key:  String,
  model:    String,
}

impl OpenAiCompletionClient {
  pub fn new(
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
  ) -> Self {
    Self { http, base_url, api_key, model }
  }
}

impl CompletionClient for OpenAiCompletionClient {
  async fn complete<'a>(
    &'a self,
    system_prompt: &'a str,
    user_prompt: &'a str,
    temperature: f32,
    max_tokens: u32,
  ) -> Result<String> {
    let request = ChatRequest {
      model: &self.model,
      messages: vec![
        ChatMessage { role: "system", content: system_prompt },
        ChatMessage { role: "user", content: user_prompt },
      ],
      temperature,
      max_tokens,
    };

    let response: ChatResponse = self
      .http
      .post(format!("{}/chat/completions", self.base_url))
      .bearer_auth(&self.api_key)
      .json(&request)
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;

    response
      .choices
      .into_iter()
      .next()
      .map(|c| c.message.content)
      .ok_or(Error::EmptyCompletion)
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
  model:       &'a str,
  messages:    Vec<ChatMessage<'a>>,
  temperature: f32,
  max_tokens:  u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
  role:    &'a str,
  content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
  choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
  message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
  content: String,
}
