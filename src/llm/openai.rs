//! `OpenAI`-compatible chat-completion client
//!
//! Talks to a locally hosted inference server (llama.cpp, vLLM, Ollama's
//! `/v1` shim) over the `/v1/chat/completions` wire format.

use super::types::{ChatReply, ChatRequest, PromptMessage, Usage};
use super::{LlmError, LlmService};
use crate::config::ChatConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Longest slice of a raw error body carried into an error message
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Chat-completion service for a single configured endpoint and model
pub struct ChatCompletionsService {
    client: Client,
    endpoint: String,
    model_id: String,
}

impl ChatCompletionsService {
    pub fn new(config: &ChatConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model_id: config.model.clone(),
        })
    }

    fn translate_request(&self, request: &ChatRequest) -> OpenAIRequest {
        OpenAIRequest {
            model: self.model_id.clone(),
            messages: request.messages.iter().map(OpenAIMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        }
    }

    fn normalize_response(resp: OpenAIResponse) -> Result<ChatReply, LlmError> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::invalid_response("No choices in response"))?;

        let usage = resp.usage.map_or_else(Usage::default, |u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        Ok(ChatReply {
            text: choice.message.content.unwrap_or_default(),
            usage,
        })
    }

    fn classify_status(status: reqwest::StatusCode, body: &str) -> LlmError {
        let message = match serde_json::from_str::<OpenAIErrorResponse>(body) {
            Ok(error_resp) => error_resp.error.message,
            Err(_) => truncate_chars(body.trim(), MAX_ERROR_BODY_CHARS),
        };
        let code = status.as_u16();
        let message = match code {
            500..=599 => format!("Server error (HTTP {code}): {message}"),
            _ => format!("HTTP {status}: {message}"),
        };
        LlmError::http_status(code, message)
    }
}

#[async_trait]
impl LlmService for ChatCompletionsService {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, LlmError> {
        let openai_request = self.translate_request(request);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::timeout(format!("Timed out reading response: {e}"))
            } else {
                LlmError::unknown(format!("Failed to read response: {e}"))
            }
        })?;

        if !status.is_success() {
            return Err(Self::classify_status(status, &body));
        }

        let openai_response: OpenAIResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::invalid_response(format!(
                "Failed to parse response: {e} - body: {}",
                truncate_chars(&body, MAX_ERROR_BODY_CHARS)
            ))
        })?;

        Self::normalize_response(openai_response)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let mut truncated: String = text.chars().take(max).collect();
        truncated.push_str("...");
        truncated
    } else {
        text.to_string()
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

impl From<&PromptMessage> for OpenAIMessage {
    fn from(msg: &PromptMessage) -> Self {
        Self {
            role: msg.role.as_str(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorDetail {
    message: String,
}
