//! Publisher identifier variants

use serde::{Deserialize, Serialize};
use std::fmt;

use super::PublisherIdType;
use crate::codec::{Reader, Writer};
use crate::types::Guid;
use crate::{Result, UadpError};

/// Identifier of the publishing application.
///
/// `Unsupported` marks a reserved type code: nothing after the flag bytes is
/// read for such a header, since the identifier's width is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PublisherId {
    Byte(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    String(String),
    Guid(Guid),
    Unsupported(u8),
}

impl Default for PublisherId {
    /// Messages without a publisher id are grouped under an empty string id.
    fn default() -> Self {
        PublisherId::String(String::new())
    }
}

impl From<&str> for PublisherId {
    fn from(value: &str) -> Self {
        PublisherId::String(value.to_string())
    }
}

impl From<String> for PublisherId {
    fn from(value: String) -> Self {
        PublisherId::String(value)
    }
}

impl PublisherId {
    pub fn id_type(&self) -> PublisherIdType {
        match self {
            PublisherId::Byte(_) => PublisherIdType::Byte,
            PublisherId::UInt16(_) => PublisherIdType::UInt16,
            PublisherId::UInt32(_) => PublisherIdType::UInt32,
            PublisherId::UInt64(_) => PublisherIdType::UInt64,
            PublisherId::String(_) => PublisherIdType::String,
            PublisherId::Guid(_) => PublisherIdType::Guid,
            PublisherId::Unsupported(code) => PublisherIdType::Reserved(*code),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, PublisherId::Unsupported(_))
    }

    /// Decode an identifier of the given type. Reserved codes consume nothing.
    pub fn decode(reader: &mut Reader<'_>, id_type: PublisherIdType) -> Result<Self> {
        Ok(match id_type {
            PublisherIdType::Byte => PublisherId::Byte(reader.read_u8()?),
            PublisherIdType::UInt16 => PublisherId::UInt16(reader.read_u16()?),
            PublisherIdType::UInt32 => PublisherId::UInt32(reader.read_u32()?),
            PublisherIdType::UInt64 => PublisherId::UInt64(reader.read_u64()?),
            PublisherIdType::String => {
                PublisherId::String(reader.read_string()?.unwrap_or_default())
            }
            PublisherIdType::Guid => PublisherId::Guid(reader.read_guid()?),
            PublisherIdType::Reserved(code) => PublisherId::Unsupported(code),
        })
    }

    pub fn encode(&self, writer: &mut Writer) -> Result<()> {
        match self {
            PublisherId::Byte(v) => writer.write_u8(*v),
            PublisherId::UInt16(v) => writer.write_u16(*v),
            PublisherId::UInt32(v) => writer.write_u32(*v),
            PublisherId::UInt64(v) => writer.write_u64(*v),
            PublisherId::String(v) => writer.write_string(Some(v.as_str()))?,
            PublisherId::Guid(v) => writer.write_guid(v),
            PublisherId::Unsupported(code) => {
                return Err(UadpError::unsupported_variant("publisher id type", *code as u32));
            }
        }
        Ok(())
    }
}

impl fmt::Display for PublisherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublisherId::Byte(v) => write!(f, "{}", v),
            PublisherId::UInt16(v) => write!(f, "{}", v),
            PublisherId::UInt32(v) => write!(f, "{}", v),
            PublisherId::UInt64(v) => write!(f, "{}", v),
            PublisherId::String(v) => f.write_str(v),
            PublisherId::Guid(v) => write!(f, "{}", v),
            PublisherId::Unsupported(code) => write!(f, "<unsupported publisher id type {}>", code),
        }
    }
}
