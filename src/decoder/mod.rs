//! Decode orchestrator.
//!
//! [`MessageDecoder::parse`] turns one raw payload into a [`NetworkMessage`]:
//!
//! 1. Empty payloads, unsupported protocol versions and unreadable headers
//!    produce no message.
//! 2. Chunk messages are stored for reassembly. An incomplete group yields
//!    the chunk envelope with status [`DecodeStatus::ChunkPending`]; the
//!    group's last chunk yields the reassembled inner message.
//! 3. Discovery responses are decoded to a [`MetaFrame`] and stored in the
//!    schema cache.
//! 4. Data set messages are decoded against the cached schema. Key and delta
//!    frames without one keep only their prefix
//!    ([`DecodeStatus::SchemaMissing`]).
//!
//! Once a header has been read the result always carries it. Body failures
//! are folded into the status, except for protocol inconsistencies
//! ([`UadpError::is_fatal`]) which are returned as errors.
//!
//! ```rust
//! use uadp::decoder::{DecodeStatus, MessageDecoder};
//!
//! let mut decoder = MessageDecoder::default();
//! assert!(decoder.parse(&[])?.is_none());
//!
//! // Version 1, no optional fields, then a keep-alive without a schema
//! let message = decoder.parse(&[0x01, 0x81, 0x03])?.expect("header decodes");
//! assert_eq!(message.status, DecodeStatus::Complete);
//! # Ok::<(), uadp::UadpError>(())
//! ```

mod message;
mod observer;

pub use message::{DecodeStatus, MessageBody, NetworkMessage};
pub use observer::{CounterSnapshot, DecodeCounters, DecodeObserver, NoopObserver};

use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::chunk::{ChunkKey, ChunkReassembler};
use crate::codec::Reader;
use crate::codecs::CodecRegistry;
use crate::config::DecoderConfig;
use crate::frame::{ChunkedMessage, DataFrame, DataSetFrame, MetaFrame};
use crate::header::{NetworkMessageHeader, NetworkMessageType, PublisherId};
use crate::schema::LocalSchemaCache;
use crate::{Result, UadpError};

type Decoded = (MessageBody, DecodeStatus);

fn status_of(error: &UadpError) -> DecodeStatus {
    match error {
        UadpError::UnsupportedVariant { .. } | UadpError::UnsupportedVersion { .. } => {
            DecodeStatus::Unsupported(error.to_string())
        }
        _ => DecodeStatus::Malformed(error.to_string()),
    }
}

/// Stateful decoder owning the chunk index and the schema cache.
pub struct MessageDecoder {
    config: DecoderConfig,
    chunks: ChunkReassembler,
    schemas: LocalSchemaCache,
    registry: CodecRegistry,
    observer: Arc<dyn DecodeObserver>,
}

impl Default for MessageDecoder {
    fn default() -> Self {
        Self::new(DecoderConfig::default())
    }
}

impl std::fmt::Debug for MessageDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageDecoder")
            .field("config", &self.config)
            .field("pending_chunks", &self.chunks.len())
            .field("schemas", &self.schemas.len())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl MessageDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            chunks: ChunkReassembler::with_completion(config.chunk_completion),
            schemas: LocalSchemaCache::with_capacity(config.schema_versions_per_writer),
            registry: CodecRegistry::new(),
            observer: Arc::new(NoopObserver),
            config,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn DecodeObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Use `registry` for custom value codecs.
    pub fn with_registry(mut self, registry: CodecRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn schemas(&self) -> &LocalSchemaCache {
        &self.schemas
    }

    /// Seed or inspect the schema cache directly.
    pub fn schemas_mut(&mut self) -> &mut LocalSchemaCache {
        &mut self.schemas
    }

    pub fn chunks(&self) -> &ChunkReassembler {
        &self.chunks
    }

    pub fn chunks_mut(&mut self) -> &mut ChunkReassembler {
        &mut self.chunks
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    /// Decode one raw payload.
    ///
    /// Returns `Ok(None)` when no header could be produced.
    ///
    /// # Errors
    ///
    /// Only protocol inconsistencies: [`UadpError::ChunkSizeMismatch`],
    /// [`UadpError::ChunkOutOfBounds`] and
    /// [`UadpError::IncompleteConfigurationVersion`].
    pub fn parse(&mut self, payload: &[u8]) -> Result<Option<NetworkMessage>> {
        if payload.is_empty() {
            trace!("Ignoring empty payload");
            return Ok(None);
        }

        let mut reader = Reader::new(payload);
        let header = match NetworkMessageHeader::decode(&mut reader) {
            Ok(header) => header,
            Err(error) => {
                warn!(%error, bytes = payload.len(), "Dropping message without a usable header");
                self.observer.on_failure(&error);
                return Ok(None);
            }
        };

        let (body, status) = match self.decode_payload(&header, &mut reader) {
            Ok(decoded) => decoded,
            Err(error) if error.is_fatal() => {
                warn!(
                    %error,
                    publisher = %header.publisher_key(),
                    "Protocol inconsistency in network message"
                );
                self.observer.on_failure(&error);
                return Err(error);
            }
            Err(error) => {
                warn!(
                    %error,
                    publisher = %header.publisher_key(),
                    "Network message body could not be decoded"
                );
                self.observer.on_failure(&error);
                (MessageBody::None, status_of(&error))
            }
        };

        let message = NetworkMessage { header, body, status };
        trace!(status = ?message.status, "Parsed network message");
        self.observer.on_decoded(&message);
        Ok(Some(message))
    }

    fn decode_payload(
        &mut self,
        header: &NetworkMessageHeader,
        reader: &mut Reader<'_>,
    ) -> Result<Decoded> {
        if let Some(PublisherId::Unsupported(code)) = &header.publisher_id {
            return Err(UadpError::unsupported_variant("publisher id type", *code as u32));
        }
        if header.security_enabled() {
            return Ok((MessageBody::None, DecodeStatus::Unsupported("security".to_string())));
        }
        if header.has_promoted_fields() {
            return Ok((
                MessageBody::None,
                DecodeStatus::Unsupported("promoted fields".to_string()),
            ));
        }

        let publisher = header.publisher_key();
        if header.is_chunk() {
            return self.decode_chunk(header.message_type(), publisher, reader);
        }
        match header.message_type() {
            NetworkMessageType::DataSetMessage => {
                let prefix = DataFrame::decode(reader, header.has_payload_header())?;
                self.decode_data_set(&publisher, prefix, reader)
            }
            NetworkMessageType::DiscoveryResponse => self.decode_meta(publisher, reader),
            other => {
                Err(UadpError::unsupported_variant("network message type", other.code() as u32))
            }
        }
    }

    fn decode_chunk(
        &mut self,
        message_type: NetworkMessageType,
        publisher: PublisherId,
        reader: &mut Reader<'_>,
    ) -> Result<Decoded> {
        let mut chunk = ChunkedMessage::decode(reader)?;
        let complete = self.chunks.store(&publisher, &chunk)?;
        let key = ChunkKey::new(publisher, chunk.writer_id, chunk.sequence_number);

        let payload = if complete {
            self.chunks.retrieve(&key, self.config.clear_chunks_on_read)
        } else {
            None
        };
        let Some(payload) = payload else {
            self.observer.on_chunk_pending(&key);
            chunk.data = Vec::new();
            return Ok((MessageBody::Chunk(chunk), DecodeStatus::ChunkPending));
        };

        debug!(
            publisher = %key.publisher,
            writer_id = key.writer_id,
            sequence_number = key.sequence_number,
            bytes = payload.len(),
            "Reassembled chunked message"
        );
        let mut inner = Reader::new(&payload);
        match message_type {
            NetworkMessageType::DataSetMessage => {
                let prefix = DataFrame::decode_chunked(&mut inner, chunk.writer_id)?;
                self.decode_data_set(&key.publisher, prefix, &mut inner)
            }
            NetworkMessageType::DiscoveryResponse => self.decode_meta(key.publisher, &mut inner),
            other => {
                Err(UadpError::unsupported_variant("network message type", other.code() as u32))
            }
        }
    }

    /// Schema for a key or delta prefix; the writer's latest version when the
    /// prefix carries none.
    fn schema_for(&self, publisher: &PublisherId, prefix: &DataFrame) -> Option<Arc<MetaFrame>> {
        match prefix.configuration_version {
            Some(version) => self.schemas.resolve(publisher, prefix.writer_id, version),
            None => self.schemas.latest(publisher, prefix.writer_id),
        }
    }

    fn decode_data_set(
        &self,
        publisher: &PublisherId,
        prefix: DataFrame,
        reader: &mut Reader<'_>,
    ) -> Result<Decoded> {
        let schema = if prefix.message_type().needs_schema() {
            let Some(schema) = self.schema_for(publisher, &prefix) else {
                debug!(
                    publisher = %publisher,
                    writer_id = prefix.writer_id,
                    version = ?prefix.configuration_version,
                    "No schema cached for data set message"
                );
                self.observer.on_schema_missing(
                    publisher,
                    prefix.writer_id,
                    prefix.configuration_version,
                );
                return Ok((
                    MessageBody::DataSet(DataSetFrame::Unresolved(prefix)),
                    DecodeStatus::SchemaMissing,
                ));
            };
            Some(schema)
        } else {
            None
        };

        let fallback = prefix.clone();
        match DataSetFrame::decode_body(prefix, reader, schema.as_deref(), &self.registry) {
            Ok(frame) => {
                trace!(
                    publisher = %publisher,
                    writer_id = frame.data_frame().writer_id,
                    message_type = ?frame.message_type(),
                    "Decoded data set message"
                );
                Ok((MessageBody::DataSet(frame), DecodeStatus::Complete))
            }
            Err(error) if error.is_fatal() => Err(error),
            Err(error) => {
                warn!(
                    %error,
                    publisher = %publisher,
                    writer_id = fallback.writer_id,
                    "Data set body could not be decoded, keeping prefix"
                );
                self.observer.on_failure(&error);
                Ok((MessageBody::DataSet(DataSetFrame::Unresolved(fallback)), status_of(&error)))
            }
        }
    }

    fn decode_meta(&mut self, publisher: PublisherId, reader: &mut Reader<'_>) -> Result<Decoded> {
        let meta = Arc::new(MetaFrame::decode(reader, publisher)?);
        let stored = self.schemas.store(Arc::clone(&meta));
        debug!(
            publisher = %meta.publisher_id,
            writer_id = meta.writer_id,
            version = %meta.configuration_version,
            stored,
            "Decoded data set metadata"
        );
        Ok((MessageBody::Meta(meta), DecodeStatus::Complete))
    }
}
