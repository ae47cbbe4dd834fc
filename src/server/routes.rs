//! Axum route handlers for the tarot service HTTP server.
//!
//! # Routes
//!
//! - `GET  /api/health`           — Returns `{"status": "healthy", ...}`
//! - `POST /api/interpret`        — Full reading interpretation (JSON)
//! - `POST /api/interpret_stream` — Interpretation streamed as `text/plain`
//! - `POST /api/tts`              — Text to speech, returns `audio/wav`
//!
//! Input validation happens here, before any component is invoked; component
//! failures are mapped to the error taxonomy: client errors become 400s,
//! synthesis failures become 500s, and model failures become diagnostic text
//! delivered with status 200.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::llm::streaming::StreamReceiver;
use crate::llm::InterpretationGenerator;
use crate::meanings::{CardMeaning, MeaningResolver};
use crate::spread::{is_valid_spread_size, CardDraw};
use crate::tts::{TtsError, TtsService};

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// Card meaning resolver (owns the cache file).
    pub resolver: Arc<MeaningResolver>,
    /// Interpretation generator (Ollama client).
    pub generator: Arc<InterpretationGenerator>,
    /// Speech synthesizer (Piper subprocess wrapper).
    pub tts: Arc<TtsService>,
}

impl AppState {
    /// Build the state from service configuration.
    ///
    /// Fails if the TTS voice model is missing; that is a startup error.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, TtsError> {
        Ok(Self {
            resolver: Arc::new(MeaningResolver::new(&config.cache_file)),
            generator: Arc::new(InterpretationGenerator::new(config)),
            tts: Arc::new(TtsService::new(config)?),
        })
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/interpret", post(interpret_handler))
        .route("/api/interpret_stream", post(interpret_stream_handler))
        .route("/api/tts", post(tts_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type HandlerError = (StatusCode, Json<Value>);

fn bad_request(message: &str) -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": message})),
    )
}

/// GET /api/health — liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "message": "Tarot interpretation service is running",
        "version": crate::VERSION,
    }))
}

/// Pull `cards` and `spreadType` out of a request body.
///
/// The body is treated as a loose JSON object so a missing or wrong-typed
/// field surfaces as a descriptive 400, never a framework rejection.
fn parse_reading_request(body: &Value) -> Result<(Vec<CardDraw>, usize), HandlerError> {
    if body.is_null() {
        return Err(bad_request("No data provided"));
    }

    let cards: Vec<CardDraw> = body
        .get("cards")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|_| bad_request("Malformed 'cards' field"))?
        .unwrap_or_default();

    if cards.is_empty() {
        return Err(bad_request("No cards provided"));
    }

    // An absent field defaults to a single-card reading; a present field
    // must be a non-negative integer (JSON floats with no fractional part
    // count, so 3.0 reads as 3). Anything else is a client error, never a
    // silent fallback to the default.
    let spread_type = match body.get("spreadType") {
        None => 1,
        Some(v) => parse_spread_type(v).ok_or_else(|| bad_request("Invalid spread type"))?,
    };

    Ok((cards, spread_type))
}

/// Interpret a `spreadType` value as a spread size, accepting integers and
/// integer-valued floats only.
fn parse_spread_type(value: &Value) -> Option<usize> {
    if let Some(n) = value.as_u64() {
        return Some(n as usize);
    }
    match value.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 => Some(f as usize),
        _ => None,
    }
}

/// Resolve meanings for every distinct card in the spread.
///
/// Resolution may rewrite the cache file, so it runs on the blocking pool.
async fn resolve_meanings(
    resolver: Arc<MeaningResolver>,
    cards: Vec<CardDraw>,
) -> HashMap<String, CardMeaning> {
    tokio::task::spawn_blocking(move || {
        let mut meanings = HashMap::new();
        for draw in &cards {
            meanings.insert(
                draw.card.to_lowercase(),
                resolver.get_meaning(&draw.card, draw.reversed),
            );
        }
        meanings
    })
    .await
    .unwrap_or_default()
}

/// POST /api/interpret — generate a complete interpretation.
///
/// Request:  `{"cards": [{"card": "The Fool", "reversed": false}, ...], "spreadType": 3}`
/// Response: `{"interpretation": ..., "cardCount": ..., "spreadType": ...}`
async fn interpret_handler(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, HandlerError> {
    let (cards, spread_type) = parse_reading_request(&body)?;

    if !is_valid_spread_size(spread_type) {
        return Err(bad_request("Invalid spread type"));
    }

    let meanings = resolve_meanings(state.resolver.clone(), cards.clone()).await;
    let interpretation = state.generator.generate(&cards, spread_type, &meanings).await;

    Ok(Json(serde_json::json!({
        "interpretation": interpretation,
        "cardCount": cards.len(),
        "spreadType": spread_type,
    })))
}

/// POST /api/interpret_stream — stream the interpretation as plain text.
///
/// The response body relays chunks as the model produces them. Mid-stream
/// failures are delivered as text content, not as an HTTP error; spread size
/// is not validated here (unknown sizes get generic position labels).
async fn interpret_stream_handler(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, HandlerError> {
    let (cards, spread_type) = parse_reading_request(&body)?;

    let meanings = resolve_meanings(state.resolver.clone(), cards.clone()).await;
    let receiver = state.generator.generate_stream(&cards, spread_type, &meanings);

    // Dropping this stream (client disconnect) drops the receiver, which the
    // producer task observes as a closed channel.
    let stream = futures::stream::unfold(receiver, |mut rx| async move {
        rx.next()
            .await
            .map(|chunk| (Ok::<_, std::convert::Infallible>(Bytes::from(chunk)), rx))
    });

    Response::builder()
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from_stream(stream))
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("Failed to build response: {}", e)})),
            )
        })
}

/// POST /api/tts — convert text to WAV speech audio.
///
/// Request: `{"text": "Text to convert to speech"}`
async fn tts_handler(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, HandlerError> {
    if body.is_null() {
        return Err(bad_request("No data provided"));
    }

    let text = body.get("text").and_then(|v| v.as_str()).unwrap_or("");
    if text.trim().is_empty() {
        return Err(bad_request("No text provided"));
    }

    match state.tts.synthesize(text, None).await {
        Ok(wav) => Response::builder()
            .header(header::CONTENT_TYPE, "audio/wav")
            .body(Body::from(wav))
            .map_err(|e| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"error": format!("Failed to build response: {}", e)})),
                )
            }),
        Err(TtsError::EmptyText) => Err(bad_request("No text provided")),
        Err(e) => {
            tracing::error!("Speech synthesis failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("Error generating speech: {}", e)})),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
