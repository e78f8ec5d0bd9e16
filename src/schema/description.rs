//! Structure and enumeration type descriptions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::codec::{Reader, Writer};
use crate::types::NodeId;
use crate::Result;

/// Member of a structured data type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructureField {
    pub name: String,
    pub data_type: NodeId,
    pub value_rank: i32,
    pub is_optional: bool,
}

impl StructureField {
    pub fn new(name: impl Into<String>, data_type: NodeId) -> Self {
        Self { name: name.into(), data_type, value_rank: -1, is_optional: false }
    }

    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }
}

/// Layout of a structured data type, members in wire order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructureDescription {
    pub data_type_id: NodeId,
    pub name: String,
    pub fields: Vec<StructureField>,
}

impl StructureDescription {
    pub fn has_optional_fields(&self) -> bool {
        self.fields.iter().any(|f| f.is_optional)
    }

    pub fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let data_type_id = NodeId::decode(reader)?;
        let name = reader.read_string()?.unwrap_or_default();
        let fields = reader
            .read_array(|r| {
                let name = r.read_string()?.unwrap_or_default();
                let data_type = NodeId::decode(r)?;
                let value_rank = r.read_i32()?;
                let is_optional = r.read_u8()? != 0;
                Ok(StructureField { name, data_type, value_rank, is_optional })
            })?
            .unwrap_or_default();
        Ok(Self { data_type_id, name, fields })
    }

    pub fn encode(&self, writer: &mut Writer) -> Result<()> {
        self.data_type_id.encode(writer)?;
        writer.write_string(Some(self.name.as_str()))?;
        writer.write_array(Some(self.fields.as_slice()), |w, field| {
            w.write_string(Some(field.name.as_str()))?;
            field.data_type.encode(w)?;
            w.write_i32(field.value_rank);
            w.write_u8(field.is_optional as u8);
            Ok(())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnumField {
    pub value: i64,
    pub name: String,
}

/// Symbolic names of an enumerated data type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnumDescription {
    pub data_type_id: NodeId,
    pub name: String,
    pub fields: Vec<EnumField>,
}

impl EnumDescription {
    pub fn name_of(&self, value: i64) -> Option<&str> {
        self.fields.iter().find(|f| f.value == value).map(|f| f.name.as_str())
    }

    pub fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let data_type_id = NodeId::decode(reader)?;
        let name = reader.read_string()?.unwrap_or_default();
        let fields = reader
            .read_array(|r| {
                let value = r.read_i64()?;
                let name = r.read_string()?.unwrap_or_default();
                Ok(EnumField { value, name })
            })?
            .unwrap_or_default();
        Ok(Self { data_type_id, name, fields })
    }

    pub fn encode(&self, writer: &mut Writer) -> Result<()> {
        self.data_type_id.encode(writer)?;
        writer.write_string(Some(self.name.as_str()))?;
        writer.write_array(Some(self.fields.as_slice()), |w, field| {
            w.write_i64(field.value);
            w.write_string(Some(field.name.as_str()))
        })
    }
}

/// Type descriptions of one meta frame, keyed by data type id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeDescriptions {
    pub structures: BTreeMap<NodeId, StructureDescription>,
    pub enums: BTreeMap<NodeId, EnumDescription>,
}

impl TypeDescriptions {
    pub fn structure(&self, data_type: &NodeId) -> Option<&StructureDescription> {
        self.structures.get(data_type)
    }

    pub fn enumeration(&self, data_type: &NodeId) -> Option<&EnumDescription> {
        self.enums.get(data_type)
    }

    pub fn add_structure(&mut self, description: StructureDescription) {
        self.structures.insert(description.data_type_id.clone(), description);
    }

    pub fn add_enum(&mut self, description: EnumDescription) {
        self.enums.insert(description.data_type_id.clone(), description);
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty() && self.enums.is_empty()
    }
}
