//! Runtime value representation

use serde::{Deserialize, Serialize};

use super::{BuiltInType, Guid, NodeId};

/// Runtime value that can hold any decoded field.
///
/// Built-in scalars map one-to-one onto variants. Structured values decode to
/// [`Variant::Structure`] or [`Variant::File`] when a codec for their type id is
/// known, and stay opaque as [`Variant::ExtensionObject`] otherwise.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Variant {
    #[default]
    Empty,
    Boolean(bool),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(Option<String>),
    DateTime(i64),
    Guid(Guid),
    ByteString(Option<Vec<u8>>),
    NodeId(NodeId),
    StatusCode(u32),
    ExtensionObject(ExtensionObject),
    Structure(StructureValue),
    File(FileValue),
    Enumeration(EnumValue),
    /// One-dimensional array of scalars sharing an element type
    Array(BuiltInType, Vec<Variant>),
}

impl Variant {
    /// Built-in type this value is carried as on the wire.
    pub fn built_in_type(&self) -> BuiltInType {
        match self {
            Variant::Empty => BuiltInType::Null,
            Variant::Boolean(_) => BuiltInType::Boolean,
            Variant::SByte(_) => BuiltInType::SByte,
            Variant::Byte(_) => BuiltInType::Byte,
            Variant::Int16(_) => BuiltInType::Int16,
            Variant::UInt16(_) => BuiltInType::UInt16,
            Variant::Int32(_) | Variant::Enumeration(_) => BuiltInType::Int32,
            Variant::UInt32(_) => BuiltInType::UInt32,
            Variant::Int64(_) => BuiltInType::Int64,
            Variant::UInt64(_) => BuiltInType::UInt64,
            Variant::Float(_) => BuiltInType::Float,
            Variant::Double(_) => BuiltInType::Double,
            Variant::String(_) => BuiltInType::String,
            Variant::DateTime(_) => BuiltInType::DateTime,
            Variant::Guid(_) => BuiltInType::Guid,
            Variant::ByteString(_) => BuiltInType::ByteString,
            Variant::NodeId(_) => BuiltInType::NodeId,
            Variant::StatusCode(_) => BuiltInType::StatusCode,
            Variant::ExtensionObject(_) | Variant::Structure(_) | Variant::File(_) => {
                BuiltInType::ExtensionObject
            }
            Variant::Array(element, _) => *element,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Variant::Array(..))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Variant::SByte(v) => Some(v as f64),
            Variant::Byte(v) => Some(v as f64),
            Variant::Int16(v) => Some(v as f64),
            Variant::UInt16(v) => Some(v as f64),
            Variant::Int32(v) => Some(v as f64),
            Variant::UInt32(v) => Some(v as f64),
            Variant::Int64(v) => Some(v as f64),
            Variant::UInt64(v) => Some(v as f64),
            Variant::Float(v) => Some(v as f64),
            Variant::Double(v) => Some(v),
            _ => None,
        }
    }
}

/// Undecoded structured value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionObject {
    pub type_id: NodeId,
    /// Binary body, `None` when the object carries no body
    pub body: Option<Vec<u8>>,
}

/// Structured value decoded from a structure description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureValue {
    pub type_id: NodeId,
    pub fields: Vec<NamedValue>,
}

impl StructureValue {
    pub fn field(&self, name: &str) -> Option<&Variant> {
        self.fields.iter().find(|f| f.name == name).and_then(|f| f.value.as_ref())
    }
}

/// Structure member; `None` for an absent optional member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: Option<Variant>,
}

/// File payload carried by the well-known file data type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FileValue {
    pub name: String,
    pub content: Vec<u8>,
}

/// Enumerated value with its symbolic name when the description is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub value: i32,
    pub name: Option<String>,
}
