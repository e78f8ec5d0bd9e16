//! Node identifiers and their compact binary forms

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Guid;
use crate::codec::{Reader, Writer};
use crate::{Result, UadpError};

// Encoding byte values for the NodeId forms
const TWO_BYTE: u8 = 0x00;
const FOUR_BYTE: u8 = 0x01;
const NUMERIC: u8 = 0x02;
const STRING: u8 = 0x03;
const GUID: u8 = 0x04;
const OPAQUE: u8 = 0x05;

/// Identifier part of a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Identifier {
    Numeric(u32),
    String(String),
    Guid(Guid),
    Opaque(Vec<u8>),
}

/// Namespace-qualified identifier used for data types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    pub namespace: u16,
    pub identifier: Identifier,
}

impl Default for NodeId {
    fn default() -> Self {
        Self::numeric(0, 0)
    }
}

impl NodeId {
    pub const fn numeric(namespace: u16, id: u32) -> Self {
        Self { namespace, identifier: Identifier::Numeric(id) }
    }

    pub fn string(namespace: u16, id: impl Into<String>) -> Self {
        Self { namespace, identifier: Identifier::String(id.into()) }
    }

    /// `(namespace, id)` for numeric identifiers.
    pub fn as_numeric(&self) -> Option<(u16, u32)> {
        match self.identifier {
            Identifier::Numeric(id) => Some((self.namespace, id)),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.as_numeric() == Some((0, 0))
    }

    pub fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let encoding = reader.read_u8()?;
        match encoding {
            TWO_BYTE => Ok(Self::numeric(0, reader.read_u8()? as u32)),
            FOUR_BYTE => {
                let namespace = reader.read_u8()? as u16;
                Ok(Self::numeric(namespace, reader.read_u16()? as u32))
            }
            NUMERIC => {
                let namespace = reader.read_u16()?;
                Ok(Self::numeric(namespace, reader.read_u32()?))
            }
            STRING => {
                let namespace = reader.read_u16()?;
                let value = reader.read_string()?.unwrap_or_default();
                Ok(Self { namespace, identifier: Identifier::String(value) })
            }
            GUID => {
                let namespace = reader.read_u16()?;
                Ok(Self { namespace, identifier: Identifier::Guid(reader.read_guid()?) })
            }
            OPAQUE => {
                let namespace = reader.read_u16()?;
                let value = reader.read_byte_string()?.unwrap_or_default();
                Ok(Self { namespace, identifier: Identifier::Opaque(value) })
            }
            other => Err(UadpError::unsupported_variant("NodeId encoding", other as u32)),
        }
    }

    /// Encode using the most compact form that represents the identifier.
    pub fn encode(&self, writer: &mut Writer) -> Result<()> {
        match &self.identifier {
            Identifier::Numeric(id) => {
                if self.namespace == 0 && *id <= u8::MAX as u32 {
                    writer.write_u8(TWO_BYTE);
                    writer.write_u8(*id as u8);
                } else if self.namespace <= u8::MAX as u16 && *id <= u16::MAX as u32 {
                    writer.write_u8(FOUR_BYTE);
                    writer.write_u8(self.namespace as u8);
                    writer.write_u16(*id as u16);
                } else {
                    writer.write_u8(NUMERIC);
                    writer.write_u16(self.namespace);
                    writer.write_u32(*id);
                }
            }
            Identifier::String(value) => {
                writer.write_u8(STRING);
                writer.write_u16(self.namespace);
                writer.write_string(Some(value.as_str()))?;
            }
            Identifier::Guid(value) => {
                writer.write_u8(GUID);
                writer.write_u16(self.namespace);
                writer.write_guid(value);
            }
            Identifier::Opaque(value) => {
                writer.write_u8(OPAQUE);
                writer.write_u16(self.namespace);
                writer.write_byte_string(Some(value.as_slice()))?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identifier {
            Identifier::Numeric(id) => write!(f, "ns={};i={}", self.namespace, id),
            Identifier::String(id) => write!(f, "ns={};s={}", self.namespace, id),
            Identifier::Guid(id) => write!(f, "ns={};g={}", self.namespace, id),
            Identifier::Opaque(id) => write!(f, "ns={};b=<{} bytes>", self.namespace, id.len()),
        }
    }
}
