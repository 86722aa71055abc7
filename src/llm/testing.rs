//! Test doubles for the chat-completion layer
//!
//! `MockLlmService` replaces the network entirely; `MockEndpoint` is a real
//! HTTP server on an ephemeral port for exercising the reqwest client.

use super::{ChatReply, ChatRequest, LlmError, LlmService};
use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Mock LLM service with queued outcomes and a request log
pub struct MockLlmService {
    responses: Mutex<VecDeque<Result<ChatReply, LlmError>>>,
    model_id: String,
    endpoint: String,
    /// Record of all requests made
    pub requests: Mutex<Vec<ChatRequest>>,
}

#[allow(dead_code)]
impl MockLlmService {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            endpoint: "http://mock.invalid/v1/chat/completions".to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, text: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(ChatReply::text(text)));
    }

    /// Queue an error
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Number of requests received
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::unknown("No more mock responses")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Clone)]
struct EndpointState {
    status: StatusCode,
    body: Value,
    delay: Duration,
    received: Arc<Mutex<Vec<Value>>>,
}

/// Local chat-completion endpoint answering every POST with a fixed reply
pub struct MockEndpoint {
    addr: std::net::SocketAddr,
    received: Arc<Mutex<Vec<Value>>>,
    handle: tokio::task::JoinHandle<()>,
}

#[allow(dead_code)]
impl MockEndpoint {
    pub async fn start(status: StatusCode, body: Value) -> Self {
        Self::start_delayed(status, body, Duration::ZERO).await
    }

    /// Start an endpoint that waits `delay` before answering
    pub async fn start_delayed(status: StatusCode, body: Value, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));

        let state = EndpointState {
            status,
            body,
            delay,
            received: received.clone(),
        };
        let app = Router::new()
            .route("/v1/chat/completions", post(answer))
            .with_state(state);

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            received,
            handle,
        }
    }

    /// A URL on a port nothing is listening on
    pub async fn unused_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}/v1/chat/completions")
    }

    /// A URL whose server sends a 200 with a body shorter than its
    /// `Content-Length`, then closes the connection
    pub async fn truncated_body_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = "HTTP/1.1 200 OK\r\n\
                                Content-Type: application/json\r\n\
                                Content-Length: 500\r\n\
                                \r\n\
                                {\"choices\":";
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
                // Drain until the client hangs up so the close is a clean FIN
                while matches!(socket.read(&mut buf).await, Ok(n) if n > 0) {}
            }
        });

        format!("http://{addr}/v1/chat/completions")
    }

    pub fn url(&self) -> String {
        format!("http://{}/v1/chat/completions", self.addr)
    }

    /// JSON bodies received so far
    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }
}

impl Drop for MockEndpoint {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn answer(
    State(state): State<EndpointState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.received.lock().unwrap().push(body);
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    (state.status, Json(state.body))
}
