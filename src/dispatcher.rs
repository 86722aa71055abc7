//! Conversation dispatch
//!
//! Turns the running history plus a new message into one chat-completion
//! call and folds the reply (or a readable diagnostic) back into the history.
//! Failures never leave this module: the transcript is the only place they
//! surface.

#[cfg(test)]
mod proptests;

use crate::config::ChatConfig;
use crate::conversation::{Exchange, History};
use crate::llm::{ChatRequest, LlmError, LlmErrorKind, LlmService, PromptMessage};
use std::sync::Arc;
use std::time::Duration;

/// Fixed persona prepended to every prompt
pub const NEWSLETTER_SYSTEM_PROMPT: &str = "You are a friendly, professional assistant that helps \
write company newsletters. Suggest headlines, section ideas and full newsletter copy, and adapt \
tone and length to the audience the user describes. Keep answers well structured and ready to \
paste into a newsletter.";

/// Build the ordered prompt: persona, prior turns, then the new message.
pub fn build_prompt(message: &str, history: &History) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 2);
    messages.push(PromptMessage::system(NEWSLETTER_SYSTEM_PROMPT));
    for exchange in history {
        messages.push(PromptMessage::user(exchange.user()));
        messages.push(PromptMessage::assistant(exchange.assistant()));
    }
    messages.push(PromptMessage::user(message));
    messages
}

/// Sends one submission to the inference endpoint per call
pub struct Dispatcher {
    llm: Arc<dyn LlmService>,
    temperature: f32,
    max_tokens: u32,
    request_timeout: Duration,
}

impl Dispatcher {
    pub fn new(llm: Arc<dyn LlmService>, config: &ChatConfig) -> Self {
        Self {
            llm,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            request_timeout: config.request_timeout,
        }
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    pub fn endpoint(&self) -> &str {
        self.llm.endpoint()
    }

    /// Send `message` with `history` as context and return the history
    /// extended by exactly one exchange. Never fails: errors become the reply.
    pub async fn dispatch(&self, message: &str, history: &History) -> History {
        let request = ChatRequest {
            messages: build_prompt(message, history),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        tracing::debug!(
            prior_exchanges = history.len(),
            prompt_messages = request.messages.len(),
            "Dispatching chat message"
        );

        let reply = match self.llm.complete(&request).await {
            Ok(reply) => reply.text,
            Err(e) => {
                tracing::warn!(kind = e.kind.as_str(), error = %e, "Substituting error reply");
                self.fallback_reply(&e)
            }
        };

        history.with_exchange(Exchange::new(message, reply))
    }

    /// Human-readable stand-in for a failed completion
    pub fn fallback_reply(&self, error: &LlmError) -> String {
        match error.kind {
            LlmErrorKind::Connection => format!(
                "Error: Cannot connect to the language model server at {}. \
                 Make sure the server is running and reachable.",
                self.endpoint()
            ),
            LlmErrorKind::Timeout => format!(
                "Error: The request timed out after {} seconds. \
                 The model may be busy or the prompt too long; please try again.",
                self.request_timeout.as_secs()
            ),
            LlmErrorKind::HttpStatus => match error.status {
                Some(status) => format!(
                    "Error: The language model server returned HTTP {status}. {}",
                    error.message
                ),
                None => format!(
                    "Error: The language model server returned an error. {}",
                    error.message
                ),
            },
            LlmErrorKind::InvalidResponse | LlmErrorKind::Unknown => {
                format!("Error: An unexpected error occurred: {}", error.message)
            }
        }
    }
}
