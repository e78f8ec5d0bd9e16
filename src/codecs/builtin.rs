//! Built-in scalar codec

use super::{CodecContext, FILE_DATA_TYPE, ValueCodec};
use crate::codec::{Reader, Writer};
use crate::types::{BuiltInType, ExtensionObject, NodeId, Variant};
use crate::{Result, UadpError};

// Extension object body encodings
const NO_BODY: u8 = 0x00;
const BINARY_BODY: u8 = 0x01;

/// Codec for one built-in scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltInCodec(BuiltInType);

impl BuiltInCodec {
    pub const fn new(built_in_type: BuiltInType) -> Self {
        Self(built_in_type)
    }

    pub const fn built_in_type(&self) -> BuiltInType {
        self.0
    }

    fn mismatch(&self, value: &Variant) -> UadpError {
        UadpError::encode_error(
            "built-in value",
            format!("{:?} value cannot be written as {:?}", value.built_in_type(), self.0),
        )
    }
}

impl ValueCodec for BuiltInCodec {
    fn decode(&self, reader: &mut Reader<'_>, context: &CodecContext<'_>) -> Result<Variant> {
        Ok(match self.0 {
            BuiltInType::Null => Variant::Empty,
            BuiltInType::Boolean => Variant::Boolean(reader.read_bool()?),
            BuiltInType::SByte => Variant::SByte(reader.read_i8()?),
            BuiltInType::Byte => Variant::Byte(reader.read_u8()?),
            BuiltInType::Int16 => Variant::Int16(reader.read_i16()?),
            BuiltInType::UInt16 => Variant::UInt16(reader.read_u16()?),
            BuiltInType::Int32 => Variant::Int32(reader.read_i32()?),
            BuiltInType::UInt32 => Variant::UInt32(reader.read_u32()?),
            BuiltInType::Int64 => Variant::Int64(reader.read_i64()?),
            BuiltInType::UInt64 => Variant::UInt64(reader.read_u64()?),
            BuiltInType::Float => Variant::Float(reader.read_f32()?),
            BuiltInType::Double => Variant::Double(reader.read_f64()?),
            BuiltInType::String => Variant::String(reader.read_string()?),
            BuiltInType::DateTime => Variant::DateTime(reader.read_i64()?),
            BuiltInType::Guid => Variant::Guid(reader.read_guid()?),
            BuiltInType::ByteString => Variant::ByteString(reader.read_byte_string()?),
            BuiltInType::NodeId => Variant::NodeId(NodeId::decode(reader)?),
            BuiltInType::StatusCode => Variant::StatusCode(reader.read_u32()?),
            BuiltInType::ExtensionObject => decode_extension_object(reader, context)?,
        })
    }

    fn encode(
        &self,
        value: &Variant,
        writer: &mut Writer,
        context: &CodecContext<'_>,
    ) -> Result<()> {
        match (self.0, value) {
            (BuiltInType::Null, Variant::Empty) => {}
            (BuiltInType::Boolean, Variant::Boolean(v)) => writer.write_bool(*v),
            (BuiltInType::SByte, Variant::SByte(v)) => writer.write_i8(*v),
            (BuiltInType::Byte, Variant::Byte(v)) => writer.write_u8(*v),
            (BuiltInType::Int16, Variant::Int16(v)) => writer.write_i16(*v),
            (BuiltInType::UInt16, Variant::UInt16(v)) => writer.write_u16(*v),
            (BuiltInType::Int32, Variant::Int32(v)) => writer.write_i32(*v),
            (BuiltInType::Int32, Variant::Enumeration(v)) => writer.write_i32(v.value),
            (BuiltInType::UInt32, Variant::UInt32(v)) => writer.write_u32(*v),
            (BuiltInType::Int64, Variant::Int64(v)) => writer.write_i64(*v),
            (BuiltInType::UInt64, Variant::UInt64(v)) => writer.write_u64(*v),
            (BuiltInType::Float, Variant::Float(v)) => writer.write_f32(*v),
            (BuiltInType::Double, Variant::Double(v)) => writer.write_f64(*v),
            (BuiltInType::String, Variant::String(v)) => writer.write_string(v.as_deref())?,
            (BuiltInType::DateTime, Variant::DateTime(v)) => writer.write_i64(*v),
            (BuiltInType::Guid, Variant::Guid(v)) => writer.write_guid(v),
            (BuiltInType::ByteString, Variant::ByteString(v)) => {
                writer.write_byte_string(v.as_deref())?
            }
            (BuiltInType::NodeId, Variant::NodeId(v)) => v.encode(writer)?,
            (BuiltInType::StatusCode, Variant::StatusCode(v)) => writer.write_u32(*v),
            (BuiltInType::ExtensionObject, value) => {
                encode_extension_object(value, writer, context)?
            }
            (_, value) => return Err(self.mismatch(value)),
        }
        Ok(())
    }
}

/// Read an extension object and decode its body when a codec for the type
/// id is known; unknown types stay opaque.
fn decode_extension_object(reader: &mut Reader<'_>, context: &CodecContext<'_>) -> Result<Variant> {
    let type_id = NodeId::decode(reader)?;
    let body = match reader.read_u8()? {
        NO_BODY => None,
        BINARY_BODY => reader.read_byte_string()?,
        other => {
            return Err(UadpError::unsupported_variant("extension object encoding", other as u32));
        }
    };

    if let (Some(bytes), Some(codec)) = (body.as_deref(), context.resolve_extension(&type_id)) {
        let nested = context.nested(&type_id)?;
        return codec.as_codec().decode(&mut Reader::new(bytes), &nested);
    }
    Ok(Variant::ExtensionObject(ExtensionObject { type_id, body }))
}

fn encode_extension_object(
    value: &Variant,
    writer: &mut Writer,
    context: &CodecContext<'_>,
) -> Result<()> {
    let type_id = match value {
        Variant::ExtensionObject(object) => {
            object.type_id.encode(writer)?;
            match &object.body {
                Some(body) => {
                    writer.write_u8(BINARY_BODY);
                    writer.write_byte_string(Some(body.as_slice()))?;
                }
                None => writer.write_u8(NO_BODY),
            }
            return Ok(());
        }
        Variant::Structure(structure) => structure.type_id.clone(),
        Variant::File(_) => FILE_DATA_TYPE,
        other => {
            return Err(UadpError::encode_error(
                "extension object",
                format!("{:?} value is not structured", other.built_in_type()),
            ));
        }
    };

    let codec = context.resolve_extension(&type_id).ok_or_else(|| {
        UadpError::encode_error("extension object", format!("no codec for type {}", type_id))
    })?;
    let nested = context.nested(&type_id)?;
    let mut body = Writer::new();
    codec.as_codec().encode(value, &mut body, &nested)?;
    type_id.encode(writer)?;
    writer.write_u8(BINARY_BODY);
    writer.write_byte_string(Some(body.as_slice()))
}
