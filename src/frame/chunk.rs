//! Chunk envelope

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::codec::{Reader, Writer};

/// One byte range of an oversized message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChunkedMessage {
    pub writer_id: u16,
    pub sequence_number: u16,
    /// Position of `data` within the reassembled message
    pub offset: u32,
    /// Size of the reassembled message
    pub total_size: u32,
    pub data: Vec<u8>,
}

impl ChunkedMessage {
    /// End of this chunk's byte range, widened so it cannot overflow.
    pub fn end(&self) -> u64 {
        self.offset as u64 + self.data.len() as u64
    }

    pub fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let writer_id = reader.read_u16()?;
        let sequence_number = reader.read_u16()?;
        let offset = reader.read_u32()?;
        let total_size = reader.read_u32()?;
        let data = reader.read_byte_string()?.unwrap_or_default();
        Ok(Self { writer_id, sequence_number, offset, total_size, data })
    }

    pub fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer.write_u16(self.writer_id);
        writer.write_u16(self.sequence_number);
        writer.write_u32(self.offset);
        writer.write_u32(self.total_size);
        writer.write_byte_string(Some(self.data.as_slice()))
    }
}
