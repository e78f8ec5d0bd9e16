//! Source fed through a bounded tokio channel

use tokio::sync::mpsc;
use tracing::debug;

use crate::source::{MessageSource, RawMessage};
use crate::{Result, UadpError};

/// Sending half handed to the transport.
#[derive(Debug, Clone)]
pub struct MessageSender {
    tx: mpsc::Sender<RawMessage>,
}

impl MessageSender {
    /// Queue a payload, waiting while the channel is full.
    ///
    /// Fails with [`UadpError::SourceClosed`] once the source is gone.
    pub async fn send(&self, topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Result<()> {
        self.tx
            .send(RawMessage::new(topic, payload))
            .await
            .map_err(|_| UadpError::SourceClosed)
    }

    /// Queue a payload without waiting; fails when full or closed.
    pub fn try_send(&self, topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Result<()> {
        self.tx.try_send(RawMessage::new(topic, payload)).map_err(|_| UadpError::SourceClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half; ends when every [`MessageSender`] is dropped.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<RawMessage>,
}

impl ChannelSource {
    /// Create a connected sender and source buffering up to `capacity`
    /// messages.
    pub fn new(capacity: usize) -> (MessageSender, ChannelSource) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (MessageSender { tx }, ChannelSource { rx })
    }
}

#[async_trait::async_trait]
impl MessageSource for ChannelSource {
    async fn next_message(&mut self) -> Result<Option<RawMessage>> {
        let message = self.rx.recv().await;
        if message.is_none() {
            debug!("All message senders dropped");
        }
        Ok(message)
    }
}
