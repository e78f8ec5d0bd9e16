//! Connection: the consumer loop behind a subscribable handle.
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use uadp::DecoderConfig;
//! use uadp::connection::UadpConnection;
//! use uadp::sources::ChannelSource;
//!
//! # #[tokio::main]
//! # async fn main() -> uadp::Result<()> {
//! let (sender, source) = ChannelSource::new(256);
//! let connection = UadpConnection::start(source, DecoderConfig::default())?;
//! let mut events = connection.subscribe_topic("plant/line-3");
//!
//! sender.send("plant/line-3", vec![0x01, 0x81, 0x03]).await?;
//! if let Some(event) = events.next().await {
//!     println!("{:?}", event.message.status);
//! }
//! # Ok(())
//! # }
//! ```

use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::Result;
use crate::codecs::CodecRegistry;
use crate::config::DecoderConfig;
use crate::decoder::{CounterSnapshot, DecodeCounters, MessageDecoder};
use crate::driver::{DecodedEvent, Driver, DriverState};
use crate::source::MessageSource;


/// Running consumer loop. Dropping the connection stops the loop.
pub struct UadpConnection {
    /// Kept so late subscribers can resubscribe
    events: broadcast::Receiver<Arc<DecodedEvent>>,
    state: watch::Receiver<DriverState>,
    counters: Arc<DecodeCounters>,
    cancel: CancellationToken,
}

impl UadpConnection {
    /// Validate `config` and start consuming `source`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<S>(source: S, config: DecoderConfig) -> Result<Self>
    where
        S: MessageSource,
    {
        Self::start_with_registry(source, config, CodecRegistry::new())
    }

    /// Like [`start`](Self::start), decoding custom types with `registry`.
    pub fn start_with_registry<S>(
        source: S,
        config: DecoderConfig,
        registry: CodecRegistry,
    ) -> Result<Self>
    where
        S: MessageSource,
    {
        config.validate()?;
        let counters = Arc::new(DecodeCounters::new());
        let decoder = MessageDecoder::new(config)
            .with_registry(registry)
            .with_observer(counters.clone());
        let channels = Driver::spawn(source, decoder);
        info!("UADP connection started");

        Ok(Self {
            events: channels.events,
            state: channels.state,
            counters,
            cancel: channels.cancel,
        })
    }

    /// Events decoded from now on, in arrival order.
    ///
    /// Ends when the loop stops. A subscriber that falls more than the
    /// configured event buffer behind skips the missed events.
    pub fn subscribe(&self) -> BoxStream<'static, Arc<DecodedEvent>> {
        BroadcastStream::new(self.events.resubscribe())
            .filter_map(|item| async move {
                match item {
                    Ok(event) => Some(event),
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!("Subscriber lagged, skipped {} decoded events", skipped);
                        None
                    }
                }
            })
            .boxed()
    }

    /// Events from a single topic.
    pub fn subscribe_topic(
        &self,
        topic: impl Into<String>,
    ) -> BoxStream<'static, Arc<DecodedEvent>> {
        let topic = topic.into();
        self.subscribe()
            .filter(move |event| {
                let matches = event.topic == topic;
                async move { matches }
            })
            .boxed()
    }

    pub fn state(&self) -> DriverState {
        *self.state.borrow()
    }

    /// Current state followed by every change.
    pub fn state_updates(&self) -> impl Stream<Item = DriverState> + Unpin + 'static {
        WatchStream::new(self.state.clone())
    }

    /// Wait for the loop to stop and return why it stopped.
    pub async fn finished(&self) -> DriverState {
        let mut state = self.state.clone();
        let _ = state.wait_for(|s| !s.is_running()).await;
        *state.borrow()
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Signal the loop to stop after its current message.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            info!("Stopping UADP connection");
            self.cancel.cancel();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled() || !self.state().is_running()
    }
}

impl Drop for UadpConnection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
