//! Inbound message source trait

use serde::{Deserialize, Serialize};

use crate::Result;

/// One payload as delivered by the transport, with the topic it arrived on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl RawMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self { topic: topic.into(), payload: payload.into() }
    }
}

/// Queue of raw payloads feeding the consumer loop.
///
/// Sources block until a message is available and handle their own pacing.
/// Reconnecting a broken transport is the source's job; the loop only backs
/// off between errors.
#[async_trait::async_trait]
pub trait MessageSource: Send + 'static {
    /// Wait for the next message.
    ///
    /// Returns:
    /// - `Ok(Some(message))` - message available
    /// - `Ok(None)` - source ended (normal termination)
    /// - `Err(e)` - transient failure; the loop retries after a backoff
    async fn next_message(&mut self) -> Result<Option<RawMessage>>;
}
