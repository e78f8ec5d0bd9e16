//! Decoded network message model

use std::sync::Arc;

use crate::codec::Writer;
use crate::codecs::CodecRegistry;
use crate::frame::{ChunkedMessage, DataSetFrame, MetaFrame};
use crate::header::NetworkMessageHeader;
use crate::{Result, UadpError};

/// How far decoding of a message got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeStatus {
    Complete,
    /// Chunk stored; the message is not reassembled yet
    ChunkPending,
    /// Key or delta frame whose schema is not cached; the body holds the prefix
    SchemaMissing,
    /// Reserved code or feature this decoder does not handle
    Unsupported(String),
    /// Input ended early or was inconsistent; the body holds what was read
    Malformed(String),
}

/// Payload following the network header.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    /// Nothing past the header could be decoded
    None,
    /// Pending chunk; its data is not echoed back
    Chunk(ChunkedMessage),
    DataSet(DataSetFrame),
    Meta(Arc<MetaFrame>),
}

/// Result of [`MessageDecoder::parse`](super::MessageDecoder::parse).
///
/// Always carries the network header, even when the body failed to decode.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkMessage {
    pub header: NetworkMessageHeader,
    pub body: MessageBody,
    pub status: DecodeStatus,
}

impl NetworkMessage {
    pub fn new(header: NetworkMessageHeader, body: MessageBody) -> Self {
        Self { header, body, status: DecodeStatus::Complete }
    }

    pub fn data_set(header: NetworkMessageHeader, frame: DataSetFrame) -> Self {
        Self::new(header, MessageBody::DataSet(frame))
    }

    pub fn meta(header: NetworkMessageHeader, meta: MetaFrame) -> Self {
        Self::new(header, MessageBody::Meta(Arc::new(meta)))
    }

    pub fn chunk(header: NetworkMessageHeader, chunk: ChunkedMessage) -> Self {
        Self::new(header, MessageBody::Chunk(chunk))
    }

    pub fn is_complete(&self) -> bool {
        self.status == DecodeStatus::Complete
    }

    pub fn as_data_set(&self) -> Option<&DataSetFrame> {
        match &self.body {
            MessageBody::DataSet(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn as_meta(&self) -> Option<&Arc<MetaFrame>> {
        match &self.body {
            MessageBody::Meta(meta) => Some(meta),
            _ => None,
        }
    }

    pub fn as_chunk(&self) -> Option<&ChunkedMessage> {
        match &self.body {
            MessageBody::Chunk(chunk) => Some(chunk),
            _ => None,
        }
    }

    /// Encode header and body.
    ///
    /// Data set bodies are laid out with `schema`; the header flags must
    /// already describe the body (payload header, chunk bit, message type).
    pub fn encode(&self, schema: Option<&MetaFrame>, registry: &CodecRegistry) -> Result<Vec<u8>> {
        let mut writer = Writer::with_capacity(64);
        self.header.encode(&mut writer)?;
        match &self.body {
            MessageBody::None => {}
            MessageBody::Chunk(chunk) => {
                if !self.header.is_chunk() {
                    return Err(UadpError::encode_error(
                        "network message",
                        "chunk body without the chunk flag",
                    ));
                }
                chunk.encode(&mut writer)?;
            }
            MessageBody::DataSet(frame) => frame.encode(&mut writer, schema, registry)?,
            MessageBody::Meta(meta) => meta.encode(&mut writer)?,
        }
        Ok(writer.into_inner())
    }
}
