//! HTTP request handlers

use super::assets::{get_asset, get_index_html};
use super::types::{ChatRequest, ConfigResponse, ErrorResponse, HistoryResponse};
use super::AppState;
use crate::conversation::History;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Root serves the chat page
        .route("/", get(serve_page))
        .route("/assets/*path", get(serve_asset))
        .route("/api/chat", post(send_chat))
        .route("/api/clear", post(clear_chat))
        .route("/api/config", get(get_config))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Page
// ============================================================

async fn serve_page() -> impl IntoResponse {
    match get_index_html() {
        Some(content) => Html(content).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - UI not found</h1>".to_string()),
        )
            .into_response(),
    }
}

async fn serve_asset(Path(path): Path<String>) -> Response {
    match get_asset(&path) {
        Some((mime, data)) => ([(header::CONTENT_TYPE, mime)], data).into_response(),
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

// ============================================================
// Chat
// ============================================================

/// One submission: the page's history in, the extended history out
async fn send_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<HistoryResponse>, AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::BadRequest("Message cannot be empty".to_string()));
    }

    let history = state.dispatcher.dispatch(&req.message, &req.history).await;
    tracing::info!(exchanges = history.len(), "Chat message handled");

    Ok(Json(HistoryResponse { history }))
}

async fn clear_chat() -> Json<HistoryResponse> {
    Json(HistoryResponse {
        history: History::cleared(),
    })
}

async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        model: state.dispatcher.model_id().to_string(),
        endpoint: state.dispatcher.endpoint().to_string(),
    })
}

async fn get_version() -> &'static str {
    concat!("newsletter-chat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
