//! Driver spawns and manages the consumer loop task

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::decoder::{MessageDecoder, NetworkMessage};
use crate::source::MessageSource;

/// A decoded message and the topic it arrived on.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    pub topic: String,
    pub message: NetworkMessage,
}

/// Lifecycle of the consumer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum DriverState {
    Running,
    /// Source returned end of stream
    SourceEnded,
    /// Too many source errors in a row
    SourceFailed,
    /// Stop signal received
    Cancelled,
}

impl DriverState {
    pub fn is_running(self) -> bool {
        self == DriverState::Running
    }
}

/// Result of spawning the driver task
pub struct DriverChannels {
    /// Decoded events; resubscribe for additional consumers
    pub events: broadcast::Receiver<Arc<DecodedEvent>>,
    /// Loop lifecycle
    pub state: watch::Receiver<DriverState>,
    /// Stop signal, checked once per iteration
    pub cancel: CancellationToken,
}

/// Driver spawns and manages the consumer loop task
///
/// The task owns the source and the decoder, so chunk and schema state is
/// only ever touched by one decode path.
pub struct Driver;

impl Driver {
    /// Spawn the consumer loop for `source`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<S>(source: S, decoder: MessageDecoder) -> DriverChannels
    where
        S: MessageSource,
    {
        let (event_tx, event_rx) = broadcast::channel(decoder.config().event_buffer.max(1));
        let (state_tx, state_rx) = watch::channel(DriverState::Running);
        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();

        tokio::spawn(async move {
            let state = Self::consume_task(source, decoder, event_tx, cancel_task).await;
            let _ = state_tx.send(state);
        });

        DriverChannels { events: event_rx, state: state_rx, cancel }
    }

    /// Backoff before retrying a failed source: 100ms, 200ms, ... capped at 1.6s.
    fn backoff(error_count: u32) -> Duration {
        Duration::from_millis(50 * (1 << error_count.min(5)))
    }

    async fn consume_task<S>(
        mut source: S,
        mut decoder: MessageDecoder,
        events: broadcast::Sender<Arc<DecodedEvent>>,
        cancel: CancellationToken,
    ) -> DriverState
    where
        S: MessageSource,
    {
        info!("Consumer loop started");
        let max_errors = decoder.config().max_consecutive_source_errors.max(1);
        let mut received = 0u64;
        let mut emitted = 0u64;
        let mut error_count = 0u32;

        let state = loop {
            if cancel.is_cancelled() {
                info!("Consumer loop cancelled");
                break DriverState::Cancelled;
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Consumer loop cancelled while waiting for a message");
                    break DriverState::Cancelled;
                }
                result = source.next_message() => result,
            };

            match result {
                Ok(Some(raw)) => {
                    received += 1;
                    error_count = 0;
                    match decoder.parse(&raw.payload) {
                        Ok(Some(message)) => {
                            trace!(
                                topic = %raw.topic,
                                status = ?message.status,
                                "Decoded message {}",
                                received
                            );
                            emitted += 1;
                            let event = Arc::new(DecodedEvent { topic: raw.topic, message });
                            if events.send(event).is_err() {
                                trace!("No subscribers for decoded event");
                            }
                        }
                        Ok(None) => {
                            debug!(
                                topic = %raw.topic,
                                bytes = raw.payload.len(),
                                "Payload held no message"
                            );
                        }
                        Err(e) => {
                            warn!(topic = %raw.topic, "Failed to decode message: {}", e);
                        }
                    }
                }
                Ok(None) => {
                    info!("Message source ended after {} messages", received);
                    break DriverState::SourceEnded;
                }
                Err(e) => {
                    error_count += 1;
                    error!("Source error ({}/{}): {}", error_count, max_errors, e);

                    if error_count >= max_errors {
                        error!("Too many source errors, shutting down");
                        break DriverState::SourceFailed;
                    }

                    tokio::select! {
                        _ = cancel.cancelled() => {
                            info!("Consumer loop cancelled during backoff");
                            break DriverState::Cancelled;
                        }
                        _ = tokio::time::sleep(Self::backoff(error_count)) => {}
                    }
                }
            }
        };

        info!(
            ?state,
            "Consumer loop ended (received {} messages, emitted {} events)",
            received,
            emitted
        );
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecoderConfig;
    use crate::frame::FieldEncoding;
    use crate::source::RawMessage;
    use crate::sources::{ChannelSource, ReplaySource};
    use crate::test_utils::*;
    use crate::{Result, UadpError};

    struct FailingSource;

    #[async_trait::async_trait]
    impl MessageSource for FailingSource {
        async fn next_message(&mut self) -> Result<Option<RawMessage>> {
            Err(UadpError::SourceClosed)
        }
    }

    async fn final_state(mut state: watch::Receiver<DriverState>) -> DriverState {
        let _ = state.wait_for(|s| !s.is_running()).await;
        *state.borrow()
    }

    #[tokio::test]
    async fn bad_messages_do_not_stop_the_loop() -> anyhow::Result<()> {
        let meta = sample_meta(version());
        let mut chunk_a = chunk_messages(&key_frame(FieldEncoding::Variant, 3), &meta, 3, 4);
        let chunk_b = chunk_messages(&key_frame(FieldEncoding::DataValue, 3), &meta, 3, 4);
        let messages = vec![
            RawMessage::new("t", vec![0x07, 0x00]),
            RawMessage::new("t", chunk_a.remove(0)),
            // Same sequence, different total size
            RawMessage::new("t", chunk_b[1].clone()),
            RawMessage::new("t", meta_message(&meta)),
            RawMessage::new("t", data_message(&key_frame(FieldEncoding::RawData, 4), &meta)),
        ];

        let mut channels = Driver::spawn(ReplaySource::new(messages), MessageDecoder::default());
        assert_eq!(final_state(channels.state.clone()).await, DriverState::SourceEnded);

        let mut statuses = Vec::new();
        while let Ok(event) = channels.events.try_recv() {
            statuses.push(event.message.is_complete());
        }
        // pending chunk, meta frame, key frame
        assert_eq!(statuses, vec![false, true, true]);
        Ok(())
    }

    #[tokio::test]
    async fn cancel_stops_a_waiting_loop() {
        let (_sender, source) = ChannelSource::new(1);
        let channels = Driver::spawn(source, MessageDecoder::default());
        channels.cancel.cancel();
        assert_eq!(final_state(channels.state).await, DriverState::Cancelled);
    }

    #[tokio::test]
    async fn repeated_source_errors_stop_the_loop() {
        let config = DecoderConfig { max_consecutive_source_errors: 2, ..DecoderConfig::default() };
        let channels = Driver::spawn(FailingSource, MessageDecoder::new(config));
        assert_eq!(final_state(channels.state).await, DriverState::SourceFailed);
    }

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(Driver::backoff(1), Duration::from_millis(100));
        assert_eq!(Driver::backoff(2), Duration::from_millis(200));
        assert_eq!(Driver::backoff(9), Duration::from_millis(1600));
    }
}
