//! Field metadata

use serde::{Deserialize, Serialize};

use crate::codec::{Reader, Writer};
use crate::types::{BuiltInType, NodeId};
use crate::{Result, UadpError};

/// Key/value property attached to a field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Description of one field of a data set.
///
/// The field's position in [`MetaFrame::fields`](crate::frame::MetaFrame) is
/// the index delta frames refer to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldMetaData {
    pub name: String,
    pub description: Option<String>,
    pub field_flags: u16,
    /// Wire id of the built-in type carrying the value
    pub built_in_type: u8,
    pub data_type: NodeId,
    /// -1 scalar, 1 one-dimensional array
    pub value_rank: i32,
    pub array_dimensions: Vec<u32>,
    pub max_string_length: u32,
    pub properties: Vec<KeyValue>,
}

impl FieldMetaData {
    /// Scalar field of a built-in type.
    pub fn scalar(name: impl Into<String>, built_in_type: BuiltInType) -> Self {
        Self {
            name: name.into(),
            built_in_type: built_in_type.id(),
            data_type: built_in_type.node_id(),
            value_rank: -1,
            ..Self::default()
        }
    }

    /// One-dimensional array field of a built-in type.
    pub fn array(name: impl Into<String>, built_in_type: BuiltInType) -> Self {
        Self { value_rank: 1, ..Self::scalar(name, built_in_type) }
    }

    /// Scalar field of a structured, enumerated or custom data type.
    pub fn typed(name: impl Into<String>, built_in_type: BuiltInType, data_type: NodeId) -> Self {
        Self { data_type, ..Self::scalar(name, built_in_type) }
    }

    pub fn built_in(&self) -> Option<BuiltInType> {
        BuiltInType::from_id(self.built_in_type)
    }

    pub fn is_array(&self) -> bool {
        self.value_rank >= 1
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.iter().find(|p| p.key == key).map(|p| p.value.as_str())
    }

    pub fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let name = reader.read_string()?.unwrap_or_default();
        let description = reader.read_string()?;
        let field_flags = reader.read_u16()?;
        let built_in_type = reader.read_u8()?;
        let data_type = NodeId::decode(reader)?;
        let value_rank = reader.read_i32()?;
        let array_dimensions = reader.read_array(|r| r.read_u32())?.unwrap_or_default();
        let max_string_length = reader.read_u32()?;
        let properties = reader
            .read_array(|r| {
                let key = r.read_string()?.unwrap_or_default();
                let value = r.read_string()?.unwrap_or_default();
                Ok(KeyValue { key, value })
            })?
            .unwrap_or_default();
        Ok(Self {
            name,
            description,
            field_flags,
            built_in_type,
            data_type,
            value_rank,
            array_dimensions,
            max_string_length,
            properties,
        })
    }

    pub fn encode(&self, writer: &mut Writer) -> Result<()> {
        if BuiltInType::from_id(self.built_in_type).is_none() {
            return Err(UadpError::unsupported_variant("built-in type", self.built_in_type as u32));
        }
        writer.write_string(Some(self.name.as_str()))?;
        writer.write_string(self.description.as_deref())?;
        writer.write_u16(self.field_flags);
        writer.write_u8(self.built_in_type);
        self.data_type.encode(writer)?;
        writer.write_i32(self.value_rank);
        writer.write_array(Some(self.array_dimensions.as_slice()), |w, d| {
            w.write_u32(*d);
            Ok(())
        })?;
        writer.write_u32(self.max_string_length);
        writer.write_array(Some(self.properties.as_slice()), |w, p| {
            w.write_string(Some(p.key.as_str()))?;
            w.write_string(Some(p.value.as_str()))
        })
    }
}
