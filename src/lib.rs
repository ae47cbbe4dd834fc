//! # Tarot Interpretation Service
//!
//! Backend glue service for tarot readings: resolves per-card meanings from a
//! static table (with a flat-file cache), asks a local Ollama model to
//! synthesize a prose interpretation (blocking or streamed), and renders text
//! to speech through the Piper CLI.
//!
//! The HTTP surface lives in [`server`]; the components it wires together are
//! [`meanings`] (card meaning resolution), [`prompt`] (prompt construction),
//! [`llm`] (interpretation generation), and [`tts`] (speech synthesis).

pub mod config;
pub mod llm;
pub mod meanings;
pub mod prompt;
pub mod server;
pub mod spread;
pub mod tts;

pub use config::ServiceConfig;
pub use meanings::{CardMeaning, MeaningResolver};
pub use spread::CardDraw;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
