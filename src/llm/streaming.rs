//! Streaming response support for the interpretation generator.
//!
//! The streaming endpoint relays model output to the client as it arrives,
//! so latency-to-first-token is preserved. The producer (the Ollama response
//! reader) pushes text fragments through a bounded channel; the consumer (the
//! HTTP response body) pulls them. Dropping the consumer closes the channel,
//! which the producer observes as a failed send and stops pulling chunks;
//! that is the cancellation path for client disconnects.

use async_trait::async_trait;

/// Receiver for incremental text fragments of an interpretation.
///
/// Abstracts over the underlying transport so handlers and tests can consume
/// streams the same way.
#[async_trait]
pub trait StreamReceiver: Send {
    /// Next text fragment, or `None` when the stream is complete.
    async fn next(&mut self) -> Option<String>;
}

/// A [`StreamReceiver`] backed by a bounded tokio mpsc channel.
pub struct ChannelStreamReceiver {
    rx: tokio::sync::mpsc::Receiver<String>,
}

impl ChannelStreamReceiver {
    /// Create a matched sender + receiver pair.
    pub fn pair(buffer: usize) -> (tokio::sync::mpsc::Sender<String>, Self) {
        let (tx, rx) = tokio::sync::mpsc::channel(buffer);
        (tx, Self { rx })
    }
}

#[async_trait]
impl StreamReceiver for ChannelStreamReceiver {
    async fn next(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

/// Drain a receiver into a single string (used by tests and any caller that
/// wants the full text despite a streaming source).
pub async fn collect(mut receiver: impl StreamReceiver) -> String {
    let mut text = String::new();
    while let Some(fragment) = receiver.next().await {
        text.push_str(&fragment);
    }
    text
}
