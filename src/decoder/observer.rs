//! Decode observability sink

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use super::NetworkMessage;
use crate::UadpError;
use crate::chunk::ChunkKey;
use crate::header::PublisherId;
use crate::types::ConfigurationVersion;

/// Receives decode outcomes from a [`MessageDecoder`](super::MessageDecoder).
///
/// All methods default to doing nothing. Implementations are called on the
/// decode path and must not block.
pub trait DecodeObserver: Send + Sync {
    /// A message was produced, whatever its status.
    fn on_decoded(&self, _message: &NetworkMessage) {}

    /// A chunk was stored and its group is still incomplete.
    fn on_chunk_pending(&self, _key: &ChunkKey) {}

    /// A key or delta frame arrived before its schema.
    fn on_schema_missing(
        &self,
        _publisher: &PublisherId,
        _writer_id: u16,
        _version: Option<ConfigurationVersion>,
    ) {
    }

    /// Decoding hit an error, fatal or not.
    fn on_failure(&self, _error: &UadpError) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl DecodeObserver for NoopObserver {}

/// Lock-free counters of decode outcomes.
#[derive(Debug, Default)]
pub struct DecodeCounters {
    decoded: AtomicU64,
    chunks_pending: AtomicU64,
    schema_missing: AtomicU64,
    failures: AtomicU64,
}

/// Point-in-time copy of [`DecodeCounters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct CounterSnapshot {
    pub decoded: u64,
    pub chunks_pending: u64,
    pub schema_missing: u64,
    pub failures: u64,
}

impl DecodeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            decoded: self.decoded.load(Ordering::Relaxed),
            chunks_pending: self.chunks_pending.load(Ordering::Relaxed),
            schema_missing: self.schema_missing.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

impl DecodeObserver for DecodeCounters {
    fn on_decoded(&self, _message: &NetworkMessage) {
        self.decoded.fetch_add(1, Ordering::Relaxed);
    }

    fn on_chunk_pending(&self, _key: &ChunkKey) {
        self.chunks_pending.fetch_add(1, Ordering::Relaxed);
    }

    fn on_schema_missing(
        &self,
        _publisher: &PublisherId,
        _writer_id: u16,
        _version: Option<ConfigurationVersion>,
    ) {
        self.schema_missing.fetch_add(1, Ordering::Relaxed);
    }

    fn on_failure(&self, _error: &UadpError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}
