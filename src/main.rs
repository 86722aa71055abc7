//! Newsletter Chat - a small chat page in front of a local LLM server
//!
//! Serves a single page whose submissions are forwarded to an
//! `OpenAI`-compatible chat-completion endpoint with a fixed newsletter
//! writing persona.

mod api;
mod config;
mod conversation;
mod dispatcher;
mod llm;

use api::{create_router, AppState};
use config::ChatConfig;
use dispatcher::Dispatcher;
use llm::{ChatCompletionsService, LoggingService};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsletter_chat=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = ChatConfig::from_env()?;
    tracing::info!(
        endpoint = %config.endpoint,
        model = %config.model,
        timeout_secs = config.request_timeout.as_secs(),
        "Inference endpoint configured"
    );

    let service = ChatCompletionsService::new(&config)?;
    let llm = Arc::new(LoggingService::new(Arc::new(service)));
    let state = AppState::new(Dispatcher::new(llm, &config));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    tracing::info!("Newsletter chat listening on {}", config.bind);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
