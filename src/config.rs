//! Service configuration.
//!
//! Every externally-configurable knob is collected here and read from the
//! environment once at startup. Specific values are deployment detail; the
//! defaults match a local development setup (Ollama on its default port,
//! `piper` on PATH, cache file in the working directory).

use serde::{Deserialize, Serialize};

/// Runtime configuration for the tarot service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Ollama model name used for interpretation generation.
    pub model: String,
    /// Base URL of the Ollama HTTP API.
    pub ollama_url: String,
    /// Piper executable name or path.
    pub piper_bin: String,
    /// Path to the Piper voice model (.onnx). Checked at startup.
    pub voice_model: String,
    /// Default speech rate (Piper length-scale: >1.0 slower, <1.0 faster).
    pub speech_rate: f32,
    /// Path of the JSON card-meaning cache file.
    pub cache_file: String,
    /// HTTP bind host.
    pub host: String,
    /// HTTP bind port.
    pub port: u16,
}

impl ServiceConfig {
    /// Build a configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    ///
    /// Recognized variables: `TAROT_MODEL`, `OLLAMA_URL`, `PIPER_BIN`,
    /// `PIPER_VOICE`, `TAROT_SPEECH_RATE`, `TAROT_CACHE_FILE`, `HOST`, `PORT`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            model: env_or("TAROT_MODEL", defaults.model),
            ollama_url: env_or("OLLAMA_URL", defaults.ollama_url),
            piper_bin: env_or("PIPER_BIN", defaults.piper_bin),
            voice_model: env_or("PIPER_VOICE", defaults.voice_model),
            speech_rate: std::env::var("TAROT_SPEECH_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.speech_rate),
            cache_file: env_or("TAROT_CACHE_FILE", defaults.cache_file),
            host: env_or("HOST", defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
        }
    }

    /// Socket address string for the HTTP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model: "llama3.2:3b".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            piper_bin: "piper".to_string(),
            voice_model: "./voices/ru_RU-irina-medium.onnx".to_string(),
            speech_rate: 1.0,
            cache_file: "tarot_cache.json".to_string(),
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.model, "llama3.2:3b");
        assert_eq!(config.speech_rate, 1.0);
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn test_serde_round_trip() {
        let config = ServiceConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: ServiceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ollama_url, config.ollama_url);
        assert_eq!(back.port, config.port);
    }
}
