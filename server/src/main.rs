mod error;
mod llm;
mod routes;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::llm::LlmChat;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    // Non-fatal: without a key the server still runs and answers 500 on chat.
    let llm: Option<Arc<dyn LlmChat>> = match llm::GeminiClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.model(), "LLM client initialized");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "LLM client not configured, chat requests will fail");
            None
        }
    };

    let state = state::AppState::new(llm);
    let static_dir = std::env::var("STATIC_DIR").ok().map(PathBuf::from);
    if let Some(dir) = &static_dir {
        tracing::info!(dir = %dir.display(), "serving static front-end");
    }

    let app = routes::app(state, static_dir);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "chat relay listening");
    axum::serve(listener, app).await.expect("server failed");
}
