//! Key, delta, event and keep-alive frames

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::values::{decode_field, encode_field};
use super::{DataFrame, DataSetMessageType, MetaFrame};
use crate::codec::{Reader, Writer};
use crate::codecs::{CodecContext, CodecRegistry, decode_variant, encode_variant};
use crate::schema::TypeDescriptions;
use crate::types::{DataPointValue, Variant};
use crate::{Result, UadpError};

/// Full snapshot: one value per schema field, in schema order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFrame {
    pub frame: DataFrame,
    pub values: Vec<DataPointValue>,
}

/// Changed field of a delta frame. `field_index` points into the schema's
/// field list and is independent of the item's position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaItem {
    pub field_index: u16,
    pub value: DataPointValue,
}

/// Sparse update carrying only changed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaFrame {
    pub frame: DataFrame,
    pub items: Vec<DeltaItem>,
}

/// Event: self-describing variants, decodable without a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFrame {
    pub frame: DataFrame,
    pub values: Vec<Variant>,
}

/// A decoded DataSet message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataSetFrame {
    /// Key or delta frame whose schema is not cached; prefix only
    Unresolved(DataFrame),
    Key(KeyFrame),
    Delta(DeltaFrame),
    Event(EventFrame),
    KeepAlive(DataFrame),
}

fn count_u16(len: usize, context: &str) -> Result<u16> {
    u16::try_from(len).map_err(|_| {
        UadpError::encode_error(context, format!("{} items exceed the u16 count", len))
    })
}

fn schema_required(message_type: DataSetMessageType) -> UadpError {
    UadpError::encode_error(
        format!("{:?} frame", message_type),
        "field metadata is required to lay out values",
    )
}

impl DataSetFrame {
    pub fn data_frame(&self) -> &DataFrame {
        match self {
            DataSetFrame::Unresolved(frame) | DataSetFrame::KeepAlive(frame) => frame,
            DataSetFrame::Key(key) => &key.frame,
            DataSetFrame::Delta(delta) => &delta.frame,
            DataSetFrame::Event(event) => &event.frame,
        }
    }

    pub fn message_type(&self) -> DataSetMessageType {
        self.data_frame().message_type()
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, DataSetFrame::Unresolved(_))
    }

    /// Decode the body that follows an already decoded prefix.
    ///
    /// Key and delta frames need `schema`; without one the prefix is returned
    /// as [`DataSetFrame::Unresolved`] and the body is left unread.
    pub fn decode_body(
        frame: DataFrame,
        reader: &mut Reader<'_>,
        schema: Option<&MetaFrame>,
        registry: &CodecRegistry,
    ) -> Result<Self> {
        let empty = TypeDescriptions::default();
        let types = schema.map_or(&empty, |meta| &meta.types);
        let context = CodecContext::new(registry, types);
        let encoding = frame.field_encoding();

        match frame.message_type() {
            DataSetMessageType::KeepAlive => Ok(DataSetFrame::KeepAlive(frame)),
            DataSetMessageType::Event => {
                let count = reader.read_u16()? as usize;
                let mut values = Vec::with_capacity(count.min(reader.remaining()));
                for _ in 0..count {
                    values.push(decode_variant(reader, &context)?);
                }
                Ok(DataSetFrame::Event(EventFrame { frame, values }))
            }
            DataSetMessageType::KeyFrame | DataSetMessageType::DeltaFrame if schema.is_none() => {
                Ok(DataSetFrame::Unresolved(frame))
            }
            DataSetMessageType::KeyFrame => {
                let meta = schema.ok_or_else(|| schema_required(DataSetMessageType::KeyFrame))?;
                let count = reader.read_u16()? as usize;
                if count != meta.fields.len() {
                    return Err(UadpError::FieldCountMismatch {
                        expected: meta.fields.len(),
                        found: count,
                    });
                }
                let values = meta
                    .fields
                    .iter()
                    .map(|field| decode_field(reader, encoding, field, &context))
                    .collect::<Result<Vec<_>>>()?;
                trace!(writer_id = frame.writer_id, fields = values.len(), "Decoded key frame");
                Ok(DataSetFrame::Key(KeyFrame { frame, values }))
            }
            DataSetMessageType::DeltaFrame => {
                let meta = schema.ok_or_else(|| schema_required(DataSetMessageType::DeltaFrame))?;
                let count = reader.read_u16()? as usize;
                let mut items = Vec::with_capacity(count.min(meta.fields.len()));
                for _ in 0..count {
                    let field_index = reader.read_u16()?;
                    let field = meta.field(field_index as usize).ok_or(
                        UadpError::FieldIndexOutOfRange {
                            index: field_index,
                            field_count: meta.fields.len(),
                        },
                    )?;
                    let value = decode_field(reader, encoding, field, &context)?;
                    items.push(DeltaItem { field_index, value });
                }
                trace!(writer_id = frame.writer_id, items = items.len(), "Decoded delta frame");
                Ok(DataSetFrame::Delta(DeltaFrame { frame, items }))
            }
            DataSetMessageType::Reserved(code) => {
                Err(UadpError::unsupported_variant("data set message type", code as u32))
            }
        }
    }

    /// Encode prefix (with payload header when set) and body.
    pub fn encode(
        &self,
        writer: &mut Writer,
        schema: Option<&MetaFrame>,
        registry: &CodecRegistry,
    ) -> Result<()> {
        self.data_frame().encode(writer)?;
        self.encode_body(writer, schema, registry)
    }

    /// Encode for a chunk payload: prefix without payload header, then body.
    pub fn encode_chunked(
        &self,
        writer: &mut Writer,
        schema: Option<&MetaFrame>,
        registry: &CodecRegistry,
    ) -> Result<()> {
        self.data_frame().encode_chunked(writer)?;
        self.encode_body(writer, schema, registry)
    }

    fn encode_body(
        &self,
        writer: &mut Writer,
        schema: Option<&MetaFrame>,
        registry: &CodecRegistry,
    ) -> Result<()> {
        let empty = TypeDescriptions::default();
        let types = schema.map_or(&empty, |meta| &meta.types);
        let context = CodecContext::new(registry, types);
        let encoding = self.data_frame().field_encoding();

        match self {
            DataSetFrame::Unresolved(_) | DataSetFrame::KeepAlive(_) => Ok(()),
            DataSetFrame::Event(event) => {
                writer.write_u16(count_u16(event.values.len(), "event frame")?);
                for value in &event.values {
                    encode_variant(value, writer, &context)?;
                }
                Ok(())
            }
            DataSetFrame::Key(key) => {
                let meta = schema.ok_or_else(|| schema_required(DataSetMessageType::KeyFrame))?;
                if key.values.len() != meta.fields.len() {
                    return Err(UadpError::FieldCountMismatch {
                        expected: meta.fields.len(),
                        found: key.values.len(),
                    });
                }
                writer.write_u16(count_u16(key.values.len(), "key frame")?);
                for (value, field) in key.values.iter().zip(&meta.fields) {
                    encode_field(value, writer, encoding, field, &context)?;
                }
                Ok(())
            }
            DataSetFrame::Delta(delta) => {
                let meta = schema.ok_or_else(|| schema_required(DataSetMessageType::DeltaFrame))?;
                writer.write_u16(count_u16(delta.items.len(), "delta frame")?);
                for item in &delta.items {
                    let field = meta.field(item.field_index as usize).ok_or(
                        UadpError::FieldIndexOutOfRange {
                            index: item.field_index,
                            field_count: meta.fields.len(),
                        },
                    )?;
                    writer.write_u16(item.field_index);
                    encode_field(&item.value, writer, encoding, field, &context)?;
                }
                Ok(())
            }
        }
    }
}
