//! DataValue encoding: variant plus optional status and timestamps

use bitflags::bitflags;

use super::{CodecContext, decode_variant, encode_variant};
use crate::Result;
use crate::codec::{Reader, Writer};
use crate::types::DataPointValue;

bitflags! {
    /// Leading mask of a DataValue.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DataValueMask: u8 {
        const VALUE = 0x01;
        const STATUS = 0x02;
        const SOURCE_TIMESTAMP = 0x04;
        const SERVER_TIMESTAMP = 0x08;
        const SOURCE_PICOSECONDS = 0x10;
        const SERVER_PICOSECONDS = 0x20;
    }
}

impl DataValueMask {
    pub fn of(value: &DataPointValue) -> Self {
        let mut mask = Self::empty();
        mask.set(Self::VALUE, value.value.is_some());
        mask.set(Self::STATUS, value.status.is_some());
        mask.set(Self::SOURCE_TIMESTAMP, value.source_timestamp.is_some());
        mask.set(Self::SERVER_TIMESTAMP, value.server_timestamp.is_some());
        mask.set(Self::SOURCE_PICOSECONDS, value.source_picoseconds.is_some());
        mask.set(Self::SERVER_PICOSECONDS, value.server_picoseconds.is_some());
        mask
    }
}

/// Fields follow the mask in the order value, status, source timestamp,
/// source picoseconds, server timestamp, server picoseconds.
pub fn decode_data_value(
    reader: &mut Reader<'_>,
    context: &CodecContext<'_>,
) -> Result<DataPointValue> {
    let mask = DataValueMask::from_bits_retain(reader.read_u8()?);
    let mut value = DataPointValue::default();
    if mask.contains(DataValueMask::VALUE) {
        value.value = Some(decode_variant(reader, context)?);
    }
    if mask.contains(DataValueMask::STATUS) {
        value.status = Some(reader.read_u32()?);
    }
    if mask.contains(DataValueMask::SOURCE_TIMESTAMP) {
        value.source_timestamp = Some(reader.read_i64()?);
    }
    if mask.contains(DataValueMask::SOURCE_PICOSECONDS) {
        value.source_picoseconds = Some(reader.read_u16()?);
    }
    if mask.contains(DataValueMask::SERVER_TIMESTAMP) {
        value.server_timestamp = Some(reader.read_i64()?);
    }
    if mask.contains(DataValueMask::SERVER_PICOSECONDS) {
        value.server_picoseconds = Some(reader.read_u16()?);
    }
    Ok(value)
}

/// The mask is derived from which fields are populated.
pub fn encode_data_value(
    value: &DataPointValue,
    writer: &mut Writer,
    context: &CodecContext<'_>,
) -> Result<()> {
    writer.write_u8(DataValueMask::of(value).bits());
    if let Some(inner) = &value.value {
        encode_variant(inner, writer, context)?;
    }
    if let Some(status) = value.status {
        writer.write_u32(status);
    }
    if let Some(timestamp) = value.source_timestamp {
        writer.write_i64(timestamp);
    }
    if let Some(picoseconds) = value.source_picoseconds {
        writer.write_u16(picoseconds);
    }
    if let Some(timestamp) = value.server_timestamp {
        writer.write_i64(timestamp);
    }
    if let Some(picoseconds) = value.server_picoseconds {
        writer.write_u16(picoseconds);
    }
    Ok(())
}
