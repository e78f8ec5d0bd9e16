//! Chunk reassembly.
//!
//! Oversized messages arrive as [`ChunkedMessage`]s, each holding one byte
//! range of the original payload together with the payload's total size.
//! The reassembler groups chunks by publisher, writer id and sequence number
//! and rebuilds the payload once the group is complete.
//!
//! # Completion
//!
//! - [`ChunkCompletion::ByteCount`] (default): complete when the summed chunk
//!   lengths equal the total size. Overlapping chunks whose lengths happen to
//!   add up are accepted.
//! - [`ChunkCompletion::Coverage`]: complete only when the stored ranges
//!   cover every byte of `[0, total_size)`.
//!
//! In both modes a chunk reaching past the total size is rejected, and a
//! total size disagreeing with the group's first chunk is a fatal error.
//!
//! ```rust
//! use uadp::chunk::{ChunkKey, ChunkReassembler};
//! use uadp::frame::ChunkedMessage;
//! use uadp::header::PublisherId;
//!
//! let payload = b"0123456789".to_vec();
//! let publisher = PublisherId::from("plc-1");
//! let mut chunks = ChunkReassembler::new();
//!
//! let mut complete = false;
//! for (offset, end) in [(7, 10), (0, 4), (4, 7)] {
//!     let chunk = ChunkedMessage {
//!         writer_id: 1,
//!         sequence_number: 42,
//!         offset,
//!         total_size: 10,
//!         data: payload[offset as usize..end].to_vec(),
//!     };
//!     complete = chunks.store(&publisher, &chunk)?;
//! }
//! assert!(complete);
//!
//! let key = ChunkKey::new(publisher, 1, 42);
//! assert_eq!(chunks.retrieve(&key, true), Some(payload));
//! assert!(chunks.is_empty());
//! # Ok::<(), uadp::UadpError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::frame::ChunkedMessage;
use crate::header::PublisherId;
use crate::{Result, UadpError};

/// How a chunk group decides it is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum ChunkCompletion {
    /// Summed chunk lengths equal the total size
    #[default]
    ByteCount,
    /// Stored ranges cover the whole payload
    Coverage,
}

/// Identity of one chunked message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    pub publisher: PublisherId,
    pub writer_id: u16,
    pub sequence_number: u16,
}

impl ChunkKey {
    pub fn new(publisher: PublisherId, writer_id: u16, sequence_number: u16) -> Self {
        Self { publisher, writer_id, sequence_number }
    }
}

/// One stored byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub offset: u32,
    pub data: Vec<u8>,
}

/// Chunks received so far for one [`ChunkKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkStorage {
    total_size: u32,
    received_size: u64,
    /// Ordered by offset; equal offsets keep insertion order
    chunks: Vec<Chunk>,
}

impl ChunkStorage {
    fn new(total_size: u32) -> Self {
        Self { total_size, received_size: 0, chunks: Vec::new() }
    }

    pub fn total_size(&self) -> u32 {
        self.total_size
    }

    /// Summed length of all stored chunks, overlaps counted twice.
    pub fn received_size(&self) -> u64 {
        self.received_size
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    fn insert(&mut self, chunk: Chunk) {
        self.received_size += chunk.data.len() as u64;
        let position = self.chunks.partition_point(|c| c.offset <= chunk.offset);
        self.chunks.insert(position, chunk);
    }

    fn covers_total(&self) -> bool {
        let mut covered = 0u64;
        for chunk in &self.chunks {
            if chunk.offset as u64 > covered {
                return false;
            }
            covered = covered.max(chunk.offset as u64 + chunk.data.len() as u64);
        }
        covered >= self.total_size as u64
    }

    pub fn is_complete(&self, completion: ChunkCompletion) -> bool {
        match completion {
            ChunkCompletion::ByteCount => self.received_size == self.total_size as u64,
            ChunkCompletion::Coverage => self.covers_total(),
        }
    }

    /// Copy every chunk to its offset; later chunks overwrite earlier ones.
    fn assemble(&self) -> Vec<u8> {
        let mut payload = vec![0u8; self.total_size as usize];
        for chunk in &self.chunks {
            let start = chunk.offset as usize;
            payload[start..start + chunk.data.len()].copy_from_slice(&chunk.data);
        }
        payload
    }
}

/// Chunk groups of all publishers, keyed by [`ChunkKey`].
///
/// Groups that never complete stay until retrieved or cleared.
#[derive(Debug, Clone, Default)]
pub struct ChunkReassembler {
    completion: ChunkCompletion,
    groups: HashMap<ChunkKey, ChunkStorage>,
}

impl ChunkReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_completion(completion: ChunkCompletion) -> Self {
        Self { completion, groups: HashMap::new() }
    }

    pub fn completion(&self) -> ChunkCompletion {
        self.completion
    }

    /// Store one chunk and report whether its group is now complete.
    ///
    /// # Errors
    ///
    /// - [`UadpError::ChunkSizeMismatch`] when the group was started with a
    ///   different total size
    /// - [`UadpError::ChunkOutOfBounds`] when the chunk ends past the total size
    pub fn store(&mut self, publisher: &PublisherId, message: &ChunkedMessage) -> Result<bool> {
        if message.end() > message.total_size as u64 {
            return Err(UadpError::ChunkOutOfBounds {
                offset: message.offset,
                length: message.data.len(),
                total_size: message.total_size,
            });
        }

        let key = ChunkKey::new(publisher.clone(), message.writer_id, message.sequence_number);
        if let Some(storage) = self.groups.get(&key)
            && storage.total_size != message.total_size
        {
            return Err(UadpError::ChunkSizeMismatch {
                publisher: key.publisher,
                writer_id: key.writer_id,
                sequence_number: key.sequence_number,
                stored: storage.total_size,
                incoming: message.total_size,
            });
        }

        let completion = self.completion;
        let storage = self.groups.entry(key).or_insert_with(|| {
            debug!(
                publisher = %publisher,
                writer_id = message.writer_id,
                sequence_number = message.sequence_number,
                total_size = message.total_size,
                "Started chunk group"
            );
            ChunkStorage::new(message.total_size)
        });
        storage.insert(Chunk { offset: message.offset, data: message.data.clone() });

        let complete = storage.is_complete(completion);
        debug!(
            publisher = %publisher,
            writer_id = message.writer_id,
            sequence_number = message.sequence_number,
            offset = message.offset,
            received = storage.received_size,
            total_size = storage.total_size,
            complete,
            "Stored chunk"
        );
        Ok(complete)
    }

    /// Reassembled payload of a complete group, `None` otherwise.
    ///
    /// With `clear_after_retrieval` the group is removed from the index.
    pub fn retrieve(&mut self, key: &ChunkKey, clear_after_retrieval: bool) -> Option<Vec<u8>> {
        let storage = self.groups.get(key)?;
        if !storage.is_complete(self.completion) {
            return None;
        }
        let payload = storage.assemble();
        if clear_after_retrieval {
            self.groups.remove(key);
            debug!(
                publisher = %key.publisher,
                writer_id = key.writer_id,
                sequence_number = key.sequence_number,
                "Cleared chunk group"
            );
        }
        Some(payload)
    }

    pub fn storage(&self, key: &ChunkKey) -> Option<&ChunkStorage> {
        self.groups.get(key)
    }

    /// Keys of groups still waiting for chunks.
    pub fn pending(&self) -> Vec<ChunkKey> {
        let mut keys: Vec<_> = self
            .groups
            .iter()
            .filter(|(_, storage)| !storage.is_complete(self.completion))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Drop a group; returns whether it existed.
    pub fn clear(&mut self, key: &ChunkKey) -> bool {
        self.groups.remove(key).is_some()
    }

    pub fn clear_all(&mut self) {
        self.groups.clear();
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Split a payload into chunks of at most `max_chunk` bytes.
///
/// An empty payload yields a single empty chunk with a total size of zero.
pub fn split_payload(
    payload: &[u8],
    writer_id: u16,
    sequence_number: u16,
    max_chunk: usize,
) -> Result<Vec<ChunkedMessage>> {
    if max_chunk == 0 {
        return Err(UadpError::encode_error("chunk split", "chunk size must be positive"));
    }
    let total_size = u32::try_from(payload.len()).map_err(|_| {
        UadpError::encode_error("chunk split", format!("{} bytes exceed u32", payload.len()))
    })?;
    if payload.is_empty() {
        return Ok(vec![ChunkedMessage {
            writer_id,
            sequence_number,
            offset: 0,
            total_size,
            data: Vec::new(),
        }]);
    }
    Ok(payload
        .chunks(max_chunk)
        .enumerate()
        .map(|(i, data)| ChunkedMessage {
            writer_id,
            sequence_number,
            offset: (i * max_chunk) as u32,
            total_size,
            data: data.to_vec(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunk(offset: u32, total_size: u32, data: &[u8]) -> ChunkedMessage {
        ChunkedMessage { writer_id: 1, sequence_number: 9, offset, total_size, data: data.to_vec() }
    }

    fn key() -> ChunkKey {
        ChunkKey::new(PublisherId::from("plc"), 1, 9)
    }

    #[test]
    fn completes_only_after_last_chunk() {
        let publisher = PublisherId::from("plc");
        let payload: Vec<u8> = (0..10).collect();
        let mut chunks = ChunkReassembler::new();

        assert!(!chunks.store(&publisher, &chunk(4, 10, &payload[4..7])).unwrap());
        assert!(chunks.retrieve(&key(), true).is_none());
        assert!(!chunks.store(&publisher, &chunk(7, 10, &payload[7..])).unwrap());
        assert_eq!(chunks.pending(), vec![key()]);
        assert!(chunks.store(&publisher, &chunk(0, 10, &payload[..4])).unwrap());

        assert_eq!(chunks.retrieve(&key(), false), Some(payload.clone()));
        assert_eq!(chunks.len(), 1);
        assert!(chunks.pending().is_empty());
        assert_eq!(chunks.retrieve(&key(), true), Some(payload));
        assert!(chunks.is_empty());
    }

    #[test]
    fn size_mismatch_is_fatal_and_keeps_first_size() {
        let publisher = PublisherId::from("plc");
        let mut chunks = ChunkReassembler::new();
        chunks.store(&publisher, &chunk(0, 10, &[1, 2])).unwrap();

        let err = chunks.store(&publisher, &chunk(2, 12, &[3, 4])).unwrap_err();
        assert!(matches!(err, UadpError::ChunkSizeMismatch { stored: 10, incoming: 12, .. }));
        assert!(err.is_fatal());
        assert_eq!(chunks.storage(&key()).map(ChunkStorage::total_size), Some(10));
        assert_eq!(chunks.storage(&key()).map(|s| s.chunks().len()), Some(1));
    }

    #[test]
    fn chunk_past_total_size_is_rejected() {
        let mut chunks = ChunkReassembler::new();
        let err = chunks.store(&PublisherId::from("plc"), &chunk(8, 10, &[0; 4])).unwrap_err();
        assert!(matches!(err, UadpError::ChunkOutOfBounds { offset: 8, length: 4, .. }));
        assert!(chunks.is_empty());
    }

    #[test]
    fn byte_count_accepts_overlap_but_coverage_does_not() {
        let publisher = PublisherId::from("plc");
        // [0,6) twice sums to the total size of 12 but leaves [6,12) empty
        let mut by_count = ChunkReassembler::new();
        by_count.store(&publisher, &chunk(0, 12, &[1; 6])).unwrap();
        assert!(by_count.store(&publisher, &chunk(0, 12, &[2; 6])).unwrap());
        let assembled = by_count.retrieve(&key(), true).unwrap();
        // The later chunk at the same offset wins
        assert_eq!(&assembled[..6], &[2; 6]);
        assert_eq!(&assembled[6..], &[0; 6]);

        let mut by_coverage = ChunkReassembler::with_completion(ChunkCompletion::Coverage);
        by_coverage.store(&publisher, &chunk(0, 12, &[1; 6])).unwrap();
        assert!(!by_coverage.store(&publisher, &chunk(0, 12, &[2; 6])).unwrap());
        assert!(by_coverage.store(&publisher, &chunk(6, 12, &[3; 6])).unwrap());
    }

    #[test]
    fn groups_are_independent() {
        let mut chunks = ChunkReassembler::new();
        chunks.store(&PublisherId::from("a"), &chunk(0, 4, &[1, 2])).unwrap();
        chunks.store(&PublisherId::from("b"), &chunk(0, 4, &[1, 2])).unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.clear(&ChunkKey::new(PublisherId::from("a"), 1, 9)));
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn split_covers_payload() {
        let payload: Vec<u8> = (0..25).collect();
        let parts = split_payload(&payload, 3, 8, 10).unwrap();
        assert_eq!(parts.iter().map(|c| c.offset).collect::<Vec<_>>(), vec![0, 10, 20]);
        assert!(parts.iter().all(|c| c.total_size == 25));
        assert!(split_payload(&payload, 3, 8, 0).is_err());
    }

    #[test]
    fn empty_payload_is_one_empty_chunk() {
        let parts = split_payload(&[], 1, 9, 10).unwrap();
        assert_eq!(parts, vec![chunk(0, 0, &[])]);

        for mode in [ChunkCompletion::ByteCount, ChunkCompletion::Coverage] {
            let mut chunks = ChunkReassembler::with_completion(mode);
            assert!(chunks.store(&PublisherId::from("plc"), &parts[0]).unwrap());
            assert_eq!(chunks.retrieve(&key(), true), Some(Vec::new()));
            assert!(chunks.is_empty());
        }
    }

    proptest! {
        #[test]
        fn prop_tiling_in_any_order_reassembles(
            payload in prop::collection::vec(any::<u8>(), 1..200),
            max_chunk in 1usize..40,
            seed in any::<u64>(),
            coverage in any::<bool>(),
        ) {
            let mode =
                if coverage { ChunkCompletion::Coverage } else { ChunkCompletion::ByteCount };
            let mut parts = split_payload(&payload, 1, 9, max_chunk).unwrap();
            // Deterministic shuffle from the seed
            let mut state = seed;
            for i in (1..parts.len()).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                parts.swap(i, (state >> 33) as usize % (i + 1));
            }

            let publisher = PublisherId::from("plc");
            let mut chunks = ChunkReassembler::with_completion(mode);
            let last = parts.len() - 1;
            for (i, part) in parts.iter().enumerate() {
                let complete = chunks.store(&publisher, part).unwrap();
                prop_assert_eq!(complete, i == last);
            }
            prop_assert_eq!(chunks.retrieve(&key(), true), Some(payload));
        }
    }
}
