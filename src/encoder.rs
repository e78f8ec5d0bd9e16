//! Message encoding entry points.
//!
//! [`MessageEncoder`] holds a header template for one publisher and fills in
//! the per-message flags: payload header, message type and chunk bit.
//!
//! ```rust
//! use uadp::decoder::MessageDecoder;
//! use uadp::encoder::MessageEncoder;
//! use uadp::frame::{DataFrame, DataSetFrame, DataSetMessageType, FieldEncoding};
//! use uadp::header::PublisherId;
//!
//! let encoder = MessageEncoder::new(PublisherId::from("plc-1"));
//! let keep_alive = DataSetFrame::KeepAlive(
//!     DataFrame::new(3, DataSetMessageType::KeepAlive, FieldEncoding::Variant)
//!         .with_payload_header()
//!         .with_sequence_number(10),
//! );
//! let bytes = encoder.encode_data_set(&keep_alive, None)?;
//!
//! let message = MessageDecoder::default().parse(&bytes)?.expect("header decodes");
//! assert_eq!(message.as_data_set(), Some(&keep_alive));
//! # Ok::<(), uadp::UadpError>(())
//! ```

use tracing::trace;

use crate::Result;
use crate::chunk::split_payload;
use crate::codec::Writer;
use crate::codecs::CodecRegistry;
use crate::decoder::NetworkMessage;
use crate::frame::{DataSetFrame, MetaFrame};
use crate::header::{NetworkMessageHeader, NetworkMessageType, PublisherId, UadpFlags};

/// Builds wire messages for one publisher.
#[derive(Debug, Clone)]
pub struct MessageEncoder {
    header: NetworkMessageHeader,
    registry: CodecRegistry,
}

impl MessageEncoder {
    pub fn new(publisher_id: PublisherId) -> Self {
        Self::with_header(NetworkMessageHeader::new().with_publisher_id(publisher_id))
    }

    /// Use `header` as the template; group header, timestamps and class id
    /// are copied into every message.
    pub fn with_header(header: NetworkMessageHeader) -> Self {
        Self { header, registry: CodecRegistry::new() }
    }

    pub fn with_registry(mut self, registry: CodecRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn header(&self) -> &NetworkMessageHeader {
        &self.header
    }

    fn header_for(
        &self,
        message_type: NetworkMessageType,
        payload_header: bool,
    ) -> NetworkMessageHeader {
        let mut header = self.header.clone();
        header.flags.set(UadpFlags::PAYLOAD_HEADER, payload_header);
        if header.message_type() != message_type {
            header = header.with_message_type(message_type);
        }
        header
    }

    /// Data set message; the payload header flag follows the frame.
    pub fn encode_data_set(
        &self,
        frame: &DataSetFrame,
        schema: Option<&MetaFrame>,
    ) -> Result<Vec<u8>> {
        let payload_header = frame.data_frame().payload_header.is_some();
        let header = self.header_for(NetworkMessageType::DataSetMessage, payload_header);
        NetworkMessage::data_set(header, frame.clone()).encode(schema, &self.registry)
    }

    /// Discovery response carrying `meta`.
    pub fn encode_meta(&self, meta: &MetaFrame) -> Result<Vec<u8>> {
        let header = self.header_for(NetworkMessageType::DiscoveryResponse, false);
        NetworkMessage::meta(header, meta.clone()).encode(None, &self.registry)
    }

    /// Chunk messages carrying `payload` in pieces of at most `max_chunk`
    /// bytes. An empty payload is sent as one empty chunk.
    pub fn split_into_chunks(
        &self,
        payload: &[u8],
        writer_id: u16,
        sequence_number: u16,
        max_chunk: usize,
    ) -> Result<Vec<Vec<u8>>> {
        let header = self.header_for(NetworkMessageType::DataSetMessage, false).with_chunk();
        let messages = split_payload(payload, writer_id, sequence_number, max_chunk)?
            .into_iter()
            .map(|chunk| NetworkMessage::chunk(header.clone(), chunk).encode(None, &self.registry))
            .collect::<Result<Vec<_>>>()?;
        trace!(
            writer_id,
            sequence_number,
            bytes = payload.len(),
            chunks = messages.len(),
            "Split payload into chunk messages"
        );
        Ok(messages)
    }

    /// Data set message split into chunk messages.
    ///
    /// The frame is encoded without its payload header; the chunk envelope
    /// carries the writer id instead.
    pub fn encode_chunked_data_set(
        &self,
        frame: &DataSetFrame,
        schema: Option<&MetaFrame>,
        sequence_number: u16,
        max_chunk: usize,
    ) -> Result<Vec<Vec<u8>>> {
        let mut payload = Writer::new();
        frame.encode_chunked(&mut payload, schema, &self.registry)?;
        self.split_into_chunks(
            payload.as_slice(),
            frame.data_frame().writer_id,
            sequence_number,
            max_chunk,
        )
    }
}
