//! Conversation history value types
//!
//! The page owns the history and sends it with every submission; the server
//! only ever sees it as an immutable value.

use serde::{Deserialize, Serialize};

/// One user message paired with the assistant's reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Exchange {
    user: String,
    assistant: String,
}

impl Exchange {
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn assistant(&self) -> &str {
        &self.assistant
    }
}

impl From<(String, String)> for Exchange {
    fn from((user, assistant): (String, String)) -> Self {
        Self { user, assistant }
    }
}

impl From<Exchange> for (String, String) {
    fn from(exchange: Exchange) -> Self {
        (exchange.user, exchange.assistant)
    }
}

/// Ordered exchanges of one session, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(Vec<Exchange>);

#[allow(dead_code)] // Accessors used by tests and the prop suite
impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// The result of the "clear" action
    pub fn cleared() -> Self {
        Self::default()
    }

    /// A copy of this history with `exchange` appended
    #[must_use]
    pub fn with_exchange(&self, exchange: Exchange) -> Self {
        let mut exchanges = Vec::with_capacity(self.0.len() + 1);
        exchanges.extend_from_slice(&self.0);
        exchanges.push(exchange);
        Self(exchanges)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Exchange> {
        self.0.iter()
    }

    pub fn last(&self) -> Option<&Exchange> {
        self.0.last()
    }
}

impl From<Vec<Exchange>> for History {
    fn from(exchanges: Vec<Exchange>) -> Self {
        Self(exchanges)
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Exchange;
    type IntoIter = std::slice::Iter<'a, Exchange>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
