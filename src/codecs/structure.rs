//! Codecs driven by structure and enumeration descriptions

use super::{CodecContext, ValueCodec};
use crate::codec::{Reader, Writer};
use crate::schema::{EnumDescription, StructureDescription};
use crate::types::{EnumValue, NamedValue, StructureValue, Variant};
use crate::{Result, UadpError};

/// Decodes a structure body member by member.
///
/// Structures with optional members start with a u32 mask holding one bit
/// per optional member, in declaration order.
#[derive(Debug, Clone, Copy)]
pub struct StructureCodec<'a> {
    description: &'a StructureDescription,
}

impl<'a> StructureCodec<'a> {
    pub fn new(description: &'a StructureDescription) -> Self {
        Self { description }
    }

    fn error(&self, details: impl Into<String>) -> UadpError {
        UadpError::encode_error(format!("structure {}", self.description.name), details)
    }
}

impl ValueCodec for StructureCodec<'_> {
    fn decode(&self, reader: &mut Reader<'_>, context: &CodecContext<'_>) -> Result<Variant> {
        let description = self.description;
        let mask = if description.has_optional_fields() { reader.read_u32()? } else { 0 };

        let mut optional_bit = 0u32;
        let mut fields = Vec::with_capacity(description.fields.len());
        for field in &description.fields {
            let present = if field.is_optional {
                let present = optional_bit < 32 && mask & (1 << optional_bit) != 0;
                optional_bit += 1;
                present
            } else {
                true
            };
            let value = if present {
                Some(context.decode_value(reader, &field.data_type, None, field.value_rank)?)
            } else {
                None
            };
            fields.push(NamedValue { name: field.name.clone(), value });
        }

        Ok(Variant::Structure(StructureValue { type_id: description.data_type_id.clone(), fields }))
    }

    fn encode(
        &self,
        value: &Variant,
        writer: &mut Writer,
        context: &CodecContext<'_>,
    ) -> Result<()> {
        let description = self.description;
        let structure = match value {
            Variant::Structure(structure) => structure,
            Variant::ExtensionObject(object) if object.type_id == description.data_type_id => {
                writer.write_bytes(object.body.as_deref().unwrap_or_default());
                return Ok(());
            }
            other => {
                return Err(self.error(format!("expected a structure, got {:?}", other)));
            }
        };
        if structure.fields.len() != description.fields.len() {
            return Err(self.error(format!(
                "{} members given, {} declared",
                structure.fields.len(),
                description.fields.len()
            )));
        }

        if description.has_optional_fields() {
            let mut mask = 0u32;
            let optional =
                description.fields.iter().zip(&structure.fields).filter(|(f, _)| f.is_optional);
            for (bit, (_, member)) in optional.enumerate() {
                if member.value.is_some() && bit < 32 {
                    mask |= 1 << bit;
                }
            }
            writer.write_u32(mask);
        }

        for (field, member) in description.fields.iter().zip(&structure.fields) {
            match (&member.value, field.is_optional) {
                (Some(value), _) => {
                    context.encode_value(value, writer, &field.data_type, None, field.value_rank)?
                }
                (None, true) => {}
                (None, false) => {
                    return Err(self.error(format!("mandatory member {} is absent", field.name)));
                }
            }
        }
        Ok(())
    }
}

/// Int32 on the wire, decoded with the symbolic name when known.
#[derive(Debug, Clone, Copy)]
pub struct EnumCodec<'a> {
    description: &'a EnumDescription,
}

impl<'a> EnumCodec<'a> {
    pub fn new(description: &'a EnumDescription) -> Self {
        Self { description }
    }
}

impl ValueCodec for EnumCodec<'_> {
    fn decode(&self, reader: &mut Reader<'_>, _context: &CodecContext<'_>) -> Result<Variant> {
        let value = reader.read_i32()?;
        let name = self.description.name_of(value as i64).map(str::to_string);
        Ok(Variant::Enumeration(EnumValue { value, name }))
    }

    fn encode(
        &self,
        value: &Variant,
        writer: &mut Writer,
        _context: &CodecContext<'_>,
    ) -> Result<()> {
        match value {
            Variant::Enumeration(value) => writer.write_i32(value.value),
            Variant::Int32(value) => writer.write_i32(*value),
            other => {
                return Err(UadpError::encode_error(
                    format!("enumeration {}", self.description.name),
                    format!("expected an enumerated value, got {:?}", other.built_in_type()),
                ));
            }
        }
        Ok(())
    }
}
