//! API request and response types

use crate::conversation::History;
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: History,
}

/// Response carrying the page's new history
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: History,
}

/// Non-secret settings shown by the page
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub model: String,
    pub endpoint: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
