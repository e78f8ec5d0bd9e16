//! Built-in data type identifiers

use serde::{Deserialize, Serialize};

use super::NodeId;

/// Built-in data types with their wire identifiers.
///
/// The discriminants are the numeric ids used in variant encoding masks and in
/// field metadata; namespace-0 data type NodeIds with these ids resolve to the
/// same types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[repr(u8)]
pub enum BuiltInType {
    /// No value
    Null = 0,
    Boolean = 1,
    SByte = 2,
    Byte = 3,
    Int16 = 4,
    UInt16 = 5,
    Int32 = 6,
    UInt32 = 7,
    Int64 = 8,
    UInt64 = 9,
    Float = 10,
    Double = 11,
    String = 12,
    /// 100ns intervals since 1601-01-01 UTC, stored as i64
    DateTime = 13,
    Guid = 14,
    ByteString = 15,
    NodeId = 17,
    StatusCode = 19,
    /// Structured value with an embedded type id
    ExtensionObject = 22,
}

impl BuiltInType {
    /// Map a wire id to a built-in type, `None` for ids this codec does not carry.
    pub const fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => BuiltInType::Null,
            1 => BuiltInType::Boolean,
            2 => BuiltInType::SByte,
            3 => BuiltInType::Byte,
            4 => BuiltInType::Int16,
            5 => BuiltInType::UInt16,
            6 => BuiltInType::Int32,
            7 => BuiltInType::UInt32,
            8 => BuiltInType::Int64,
            9 => BuiltInType::UInt64,
            10 => BuiltInType::Float,
            11 => BuiltInType::Double,
            12 => BuiltInType::String,
            13 => BuiltInType::DateTime,
            14 => BuiltInType::Guid,
            15 => BuiltInType::ByteString,
            17 => BuiltInType::NodeId,
            19 => BuiltInType::StatusCode,
            22 => BuiltInType::ExtensionObject,
            _ => return None,
        })
    }

    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Resolve a data type NodeId to a built-in type (namespace 0 numeric ids only).
    pub fn from_node_id(node_id: &NodeId) -> Option<Self> {
        match node_id.as_numeric() {
            Some((0, id)) => u8::try_from(id).ok().and_then(Self::from_id),
            _ => None,
        }
    }

    /// The namespace-0 data type NodeId for this built-in type.
    pub fn node_id(self) -> NodeId {
        NodeId::numeric(0, self.id() as u32)
    }

    /// Encoded size of a scalar of this type, `None` for variable-length types.
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            BuiltInType::Boolean | BuiltInType::SByte | BuiltInType::Byte => Some(1),
            BuiltInType::Int16 | BuiltInType::UInt16 => Some(2),
            BuiltInType::Int32 | BuiltInType::UInt32 | BuiltInType::Float => Some(4),
            BuiltInType::StatusCode => Some(4),
            BuiltInType::Int64 | BuiltInType::UInt64 | BuiltInType::Double => Some(8),
            BuiltInType::DateTime => Some(8),
            BuiltInType::Guid => Some(16),
            BuiltInType::Null => Some(0),
            BuiltInType::String
            | BuiltInType::ByteString
            | BuiltInType::NodeId
            | BuiltInType::ExtensionObject => None,
        }
    }
}
