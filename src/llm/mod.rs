//! Interpretation generation via an Ollama chat backend.
//!
//! [`InterpretationGenerator`] builds the reading prompt, sends it with a
//! fixed persona instruction to `{base}/api/chat`, and returns either the
//! complete response text or a stream of incremental fragments.
//!
//! # Failure policy
//!
//! A failed backend call never fails the request. Any transport or model
//! error degrades to a human-readable diagnostic string returned as if it
//! were a normal interpretation (in streaming mode, as the sole chunk).
//! Input validation is the router's job and happens before this module is
//! invoked.

pub mod streaming;

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ServiceConfig;
use crate::meanings::CardMeaning;
use crate::prompt::{build_prompt, PromptConfig};
use crate::spread::CardDraw;

use streaming::ChannelStreamReceiver;

/// Persona and stylistic constraints sent as the system message.
const SYSTEM_INSTRUCTION: &str = "You are an experienced tarot reader who provides insightful, \
compassionate, and meaningful interpretations. Focus on practical guidance and spiritual \
insight. Hedge predictions rather than stating them as certainties, prefer gentle questions \
over definitive claims about the querent's life, and avoid markdown or other markup \
characters in your response. For a single-card reading, speak to that one card directly \
instead of using multi-position spread language.";

/// Request timeout for the blocking (non-streaming) chat call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Connect timeout; applies to both modes so an unreachable backend fails
/// fast instead of hanging the stream.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Buffer size of the producer/consumer chunk channel.
const STREAM_BUFFER: usize = 32;

/// A chat message in the Ollama wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMMessage {
    pub role: String,
    pub content: String,
}

impl LLMMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Generates reading interpretations through an Ollama chat endpoint.
pub struct InterpretationGenerator {
    model: String,
    base_url: String,
    prompt_config: PromptConfig,
    client: reqwest::Client,
}

impl InterpretationGenerator {
    /// Build a generator from service configuration.
    pub fn new(config: &ServiceConfig) -> Self {
        Self::with_prompt_config(config, PromptConfig::default())
    }

    /// Build a generator with a non-default prompt configuration.
    pub fn with_prompt_config(config: &ServiceConfig, prompt_config: PromptConfig) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            model: config.model.clone(),
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            prompt_config,
            client,
        }
    }

    /// The configured model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn chat_endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    /// Build the chat request body for the given spread.
    fn build_request_body(
        &self,
        cards: &[CardDraw],
        spread_size: usize,
        meanings: &HashMap<String, CardMeaning>,
        stream: bool,
    ) -> Value {
        let prompt = build_prompt(cards, spread_size, meanings, &self.prompt_config);
        let messages = vec![
            LLMMessage::system(SYSTEM_INSTRUCTION),
            LLMMessage::user(prompt),
        ];
        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": stream,
        })
    }

    /// Diagnostic text returned in place of an interpretation when the
    /// backend call fails.
    fn diagnostic(&self, error: impl std::fmt::Display) -> String {
        diagnostic_text(&error.to_string(), &self.model)
    }

    /// Generate a complete interpretation, blocking until the model finishes.
    ///
    /// Always returns a string: on backend failure it is the diagnostic text.
    pub async fn generate(
        &self,
        cards: &[CardDraw],
        spread_size: usize,
        meanings: &HashMap<String, CardMeaning>,
    ) -> String {
        let body = self.build_request_body(cards, spread_size, meanings, false);

        match self.chat_blocking(&body).await {
            Ok(content) => content,
            Err(e) => {
                log::warn!("LLM call failed: {}", e);
                self.diagnostic(e)
            }
        }
    }

    async fn chat_blocking(&self, body: &Value) -> Result<String, String> {
        let response = self
            .client
            .post(self.chat_endpoint())
            .timeout(REQUEST_TIMEOUT)
            .json(body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        let text = response.text().await.map_err(|e| e.to_string())?;
        if !status.is_success() {
            return Err(format!("Ollama returned {}: {}", status, text));
        }

        let json: Value = serde_json::from_str(&text)
            .map_err(|e| format!("Failed to parse Ollama response: {}", e))?;
        json.get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| "No message content in Ollama response".to_string())
    }

    /// Generate an interpretation as a stream of text fragments.
    ///
    /// A producer task reads the backend's NDJSON response and forwards each
    /// non-empty content fragment in arrival order. If the receiver is
    /// dropped mid-stream the producer stops pulling from the backend. On
    /// backend failure the diagnostic text is the sole chunk.
    pub fn generate_stream(
        &self,
        cards: &[CardDraw],
        spread_size: usize,
        meanings: &HashMap<String, CardMeaning>,
    ) -> ChannelStreamReceiver {
        let body = self.build_request_body(cards, spread_size, meanings, true);
        let (tx, rx) = ChannelStreamReceiver::pair(STREAM_BUFFER);

        let client = self.client.clone();
        let endpoint = self.chat_endpoint();
        let model = self.model.clone();

        tokio::spawn(async move {
            if let Err(e) = relay_chunks(&client, &endpoint, &body, &tx).await {
                log::warn!("LLM stream failed: {}", e);
                let _ = tx.send(diagnostic_text(&e, &model)).await;
            }
        });

        rx
    }
}

fn diagnostic_text(error: &str, model: &str) -> String {
    format!(
        "Error generating interpretation: {}\n\nPlease ensure Ollama is running \
         (`ollama serve`) and the model '{}' is installed (`ollama pull {}`).",
        error, model, model
    )
}

/// Pull the NDJSON response body and forward content fragments until the
/// stream ends or the consumer goes away.
async fn relay_chunks(
    client: &reqwest::Client,
    endpoint: &str,
    body: &Value,
    tx: &tokio::sync::mpsc::Sender<String>,
) -> Result<(), String> {
    use futures::StreamExt;

    let response = client
        .post(endpoint)
        .json(body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(format!("Ollama returned {}: {}", status, text));
    }

    let mut bytes = response.bytes_stream();
    let mut buffer = String::new();

    while let Some(chunk) = bytes.next().await {
        let chunk = chunk.map_err(|e| e.to_string())?;
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(newline) = buffer.find('\n') {
            let line: String = buffer.drain(..=newline).collect();
            if let Some(content) = parse_stream_line(line.trim()) {
                if !content.is_empty() && tx.send(content).await.is_err() {
                    // Consumer dropped (client disconnect): stop pulling.
                    return Ok(());
                }
            }
        }
    }

    // Trailing line without a newline terminator.
    if let Some(content) = parse_stream_line(buffer.trim()) {
        if !content.is_empty() {
            let _ = tx.send(content).await;
        }
    }

    Ok(())
}

/// Extract the content fragment from one NDJSON stream line, if any.
fn parse_stream_line(line: &str) -> Option<String> {
    if line.is_empty() {
        return None;
    }
    let json: Value = serde_json::from_str(line).ok()?;
    json.get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::streaming::{collect, StreamReceiver};

    fn unreachable_generator() -> InterpretationGenerator {
        let config = ServiceConfig {
            // Reserved port; connections are refused immediately.
            ollama_url: "http://127.0.0.1:1".to_string(),
            ..ServiceConfig::default()
        };
        InterpretationGenerator::new(&config)
    }

    fn sample_cards() -> Vec<CardDraw> {
        vec![CardDraw::new("The Fool", false)]
    }

    #[test]
    fn test_request_body_shape() {
        let generator = unreachable_generator();
        let body = generator.build_request_body(&sample_cards(), 1, &HashMap::new(), true);

        assert_eq!(body["model"], "llama3.2:3b");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert!(body["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("experienced tarot reader"));
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .starts_with("Please interpret this 1-card tarot reading:"));
    }

    #[test]
    fn test_parse_stream_line() {
        assert_eq!(
            parse_stream_line(r#"{"message":{"role":"assistant","content":"The"},"done":false}"#),
            Some("The".to_string())
        );
        assert_eq!(
            parse_stream_line(r#"{"done":true,"total_duration":1}"#),
            None
        );
        assert_eq!(parse_stream_line(""), None);
        assert_eq!(parse_stream_line("not json"), None);
    }

    #[tokio::test]
    async fn test_blocking_failure_degrades_to_diagnostic() {
        let generator = unreachable_generator();
        let result = generator
            .generate(&sample_cards(), 1, &HashMap::new())
            .await;
        assert!(result.starts_with("Error generating interpretation:"));
        assert!(result.contains("ollama serve"));
        assert!(result.contains("llama3.2:3b"));
    }

    #[tokio::test]
    async fn test_stream_failure_is_sole_diagnostic_chunk() {
        let generator = unreachable_generator();
        let mut rx = generator.generate_stream(&sample_cards(), 1, &HashMap::new());

        let first = rx.next().await.expect("expected a diagnostic chunk");
        assert!(first.starts_with("Error generating interpretation:"));
        assert!(rx.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_collect_matches_diagnostic() {
        let generator = unreachable_generator();
        let rx = generator.generate_stream(&sample_cards(), 1, &HashMap::new());
        let text = collect(rx).await;
        assert!(text.contains("Please ensure Ollama is running"));
    }
}
