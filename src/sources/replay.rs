//! Replay of recorded messages

use std::collections::VecDeque;
use tokio::time::{Duration, Interval, MissedTickBehavior, interval};
use tracing::{debug, info, trace};

use crate::Result;
use crate::source::{MessageSource, RawMessage};

/// Source that replays a fixed list of messages, optionally paced.
pub struct ReplaySource {
    queue: VecDeque<RawMessage>,
    /// Pacing between messages; `None` replays as fast as consumed
    interval: Option<Interval>,
    delivered: u64,
}

impl ReplaySource {
    pub fn new(messages: impl IntoIterator<Item = RawMessage>) -> Self {
        let queue: VecDeque<_> = messages.into_iter().collect();
        info!("Replaying {} recorded messages", queue.len());
        Self { queue, interval: None, delivered: 0 }
    }

    /// Deliver at most one message per `period`.
    pub fn with_interval(mut self, period: Duration) -> Self {
        let mut pacing = interval(period);
        pacing.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(?period, "Replay pacing enabled");
        self.interval = Some(pacing);
        self
    }

    pub fn push(&mut self, message: RawMessage) {
        self.queue.push_back(message);
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

#[async_trait::async_trait]
impl MessageSource for ReplaySource {
    async fn next_message(&mut self) -> Result<Option<RawMessage>> {
        let Some(message) = self.queue.pop_front() else {
            debug!(delivered = self.delivered, "Replay finished");
            return Ok(None);
        };
        if let Some(pacing) = &mut self.interval {
            pacing.tick().await;
        }
        self.delivered += 1;
        trace!(topic = %message.topic, bytes = message.payload.len(), "Replaying message");
        Ok(Some(message))
    }
}
