//! Bounded per-writer schema cache

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::frame::MetaFrame;
use crate::header::PublisherId;
use crate::types::ConfigurationVersion;

/// Default number of configuration versions kept per writer.
pub const DEFAULT_VERSIONS_PER_WRITER: usize = 10;

/// Composite cache key. Ordering groups all versions of one writer together,
/// ascending by version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaKey {
    pub publisher: PublisherId,
    pub writer_id: u16,
    pub version: ConfigurationVersion,
}

impl SchemaKey {
    pub fn new(publisher: PublisherId, writer_id: u16, version: ConfigurationVersion) -> Self {
        Self { publisher, writer_id, version }
    }

    fn of(frame: &MetaFrame) -> Self {
        Self::new(frame.publisher_id.clone(), frame.writer_id, frame.configuration_version)
    }
}

/// Decoded meta frames by (publisher, writer, configuration version).
///
/// Entries are immutable: storing a known version again keeps the first
/// frame. When a writer already holds `capacity` versions, the numerically
/// smallest one is evicted before the new one goes in.
#[derive(Debug, Clone)]
pub struct LocalSchemaCache {
    capacity: usize,
    entries: BTreeMap<SchemaKey, Arc<MetaFrame>>,
}

impl Default for LocalSchemaCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSchemaCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_VERSIONS_PER_WRITER)
    }

    /// Cache keeping at most `capacity` versions per writer (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), entries: BTreeMap::new() }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn writer_range(
        &self,
        publisher: &PublisherId,
        writer_id: u16,
    ) -> impl DoubleEndedIterator<Item = (&SchemaKey, &Arc<MetaFrame>)> {
        let low = SchemaKey::new(publisher.clone(), writer_id, ConfigurationVersion::new(0, 0));
        let high = SchemaKey::new(
            publisher.clone(),
            writer_id,
            ConfigurationVersion::new(u32::MAX, u32::MAX),
        );
        self.entries.range(low..=high)
    }

    pub fn is_known(
        &self,
        publisher: &PublisherId,
        writer_id: u16,
        version: ConfigurationVersion,
    ) -> bool {
        self.entries.contains_key(&SchemaKey::new(publisher.clone(), writer_id, version))
    }

    pub fn resolve(
        &self,
        publisher: &PublisherId,
        writer_id: u16,
        version: ConfigurationVersion,
    ) -> Option<Arc<MetaFrame>> {
        self.entries.get(&SchemaKey::new(publisher.clone(), writer_id, version)).cloned()
    }

    /// Store a frame under its own publisher, writer and version.
    ///
    /// Returns `false` when the version was already cached.
    pub fn store(&mut self, frame: Arc<MetaFrame>) -> bool {
        let key = SchemaKey::of(&frame);
        if self.entries.contains_key(&key) {
            debug!(
                publisher = %key.publisher,
                writer_id = key.writer_id,
                version = %key.version,
                "Schema version already cached"
            );
            return false;
        }

        if self.writer_range(&key.publisher, key.writer_id).count() >= self.capacity {
            let oldest = self
                .writer_range(&key.publisher, key.writer_id)
                .next()
                .map(|(oldest, _)| oldest.clone());
            if let Some(oldest) = oldest {
                debug!(
                    publisher = %oldest.publisher,
                    writer_id = oldest.writer_id,
                    version = %oldest.version,
                    "Evicting oldest schema version"
                );
                self.entries.remove(&oldest);
            }
        }

        debug!(
            publisher = %key.publisher,
            writer_id = key.writer_id,
            version = %key.version,
            fields = frame.fields.len(),
            "Cached schema version"
        );
        self.entries.insert(key, frame);
        true
    }

    /// Cached versions of one writer, ascending.
    pub fn versions(&self, publisher: &PublisherId, writer_id: u16) -> Vec<ConfigurationVersion> {
        self.writer_range(publisher, writer_id).map(|(key, _)| key.version).collect()
    }

    /// Highest cached version of one writer.
    pub fn latest(&self, publisher: &PublisherId, writer_id: u16) -> Option<Arc<MetaFrame>> {
        self.writer_range(publisher, writer_id).next_back().map(|(_, frame)| Arc::clone(frame))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
