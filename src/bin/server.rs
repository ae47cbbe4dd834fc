//! Tarot service HTTP server binary.
//!
//! # Environment Variables
//!
//! - `HOST` / `PORT` — HTTP bind address (default: 0.0.0.0:5000)
//! - `TAROT_MODEL` — Ollama model name (default: llama3.2:3b)
//! - `OLLAMA_URL` — Ollama base URL (default: http://localhost:11434)
//! - `PIPER_BIN` — Piper executable (default: piper)
//! - `PIPER_VOICE` — Voice model path (must exist; startup fails otherwise)
//! - `TAROT_SPEECH_RATE` — Default length-scale (default: 1.0)
//! - `TAROT_CACHE_FILE` — Meaning cache path (default: tarot_cache.json)
//! - `RUST_LOG` — Tracing filter (default: "info")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin server
//! ```

use anyhow::Context;
use tarot_service::server::{app_router, AppState};
use tarot_service::ServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tarot_service=debug".into()),
        )
        .init();

    let config = ServiceConfig::from_env();
    let bind_addr = config.bind_addr();

    // Voice model check is fail-fast: a missing model is a deployment error.
    let state = AppState::from_config(&config)
        .with_context(|| "Failed to initialize service components")?;

    let app = app_router(state);

    tracing::info!("Starting tarot interpretation service on {}", bind_addr);
    tracing::info!(
        "Make sure Ollama is running (`ollama serve`) and the model is pulled (`ollama pull {}`)",
        config.model
    );
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /api/health           — liveness probe");
    tracing::info!("  POST /api/interpret        — reading interpretation");
    tracing::info!("  POST /api/interpret_stream — streamed interpretation");
    tracing::info!("  POST /api/tts              — text to speech (WAV)");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}
