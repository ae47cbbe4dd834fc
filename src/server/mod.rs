//! HTTP server for the tarot interpretation service.
//!
//! # Endpoints
//!
//! - `GET  /api/health`           — Liveness probe
//! - `POST /api/interpret`        — Complete interpretation for a spread
//! - `POST /api/interpret_stream` — Interpretation streamed as plain text
//! - `POST /api/tts`              — Text to WAV speech audio

pub mod routes;

pub use routes::{app_router, AppState};
