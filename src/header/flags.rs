//! Header flag bytes.
//!
//! Pure bit sets use `bitflags`; the enum-valued bit ranges (publisher id type,
//! network message type) are decoded into enums next to them. Unknown codes in
//! those ranges are kept as `Reserved` so that encoding reproduces the byte.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Upper nibble of the first header byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct UadpFlags: u8 {
        /// Publisher id follows the flag bytes
        const PUBLISHER_ID = 0x10;
        /// Group header present
        const GROUP_HEADER = 0x20;
        /// Payload header present
        const PAYLOAD_HEADER = 0x40;
        /// Extended flags 1 byte follows
        const EXTENDED_FLAGS1 = 0x80;
    }
}

bitflags! {
    /// Option bits 3-7 of extended flags 1.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ExtendedFlags1Options: u8 {
        const DATASET_CLASS_ID = 0x08;
        const SECURITY = 0x10;
        const TIMESTAMP = 0x20;
        const PICOSECONDS = 0x40;
        const EXTENDED_FLAGS2 = 0x80;
    }
}

bitflags! {
    /// Option bits 0-1 of extended flags 2.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ExtendedFlags2Options: u8 {
        /// Payload is one chunk of a larger message
        const CHUNK = 0x01;
        const PROMOTED_FIELDS = 0x02;
    }
}

bitflags! {
    /// Presence bits of the group header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct GroupFlags: u8 {
        const WRITER_GROUP_ID = 0x01;
        const GROUP_VERSION = 0x02;
        const NETWORK_MESSAGE_NUMBER = 0x04;
        const SEQUENCE_NUMBER = 0x08;
    }
}

/// Wire type of the publisher identifier (bits 0-2 of extended flags 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum PublisherIdType {
    #[default]
    Byte,
    UInt16,
    UInt32,
    UInt64,
    String,
    Guid,
    Reserved(u8),
}

impl PublisherIdType {
    pub const fn from_code(code: u8) -> Self {
        match code & 0x07 {
            0 => PublisherIdType::Byte,
            1 => PublisherIdType::UInt16,
            2 => PublisherIdType::UInt32,
            3 => PublisherIdType::UInt64,
            4 => PublisherIdType::String,
            5 => PublisherIdType::Guid,
            other => PublisherIdType::Reserved(other),
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            PublisherIdType::Byte => 0,
            PublisherIdType::UInt16 => 1,
            PublisherIdType::UInt32 => 2,
            PublisherIdType::UInt64 => 3,
            PublisherIdType::String => 4,
            PublisherIdType::Guid => 5,
            PublisherIdType::Reserved(code) => code & 0x07,
        }
    }
}

/// Network message type (bits 2-5 of extended flags 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum NetworkMessageType {
    #[default]
    DataSetMessage,
    DiscoveryRequest,
    DiscoveryResponse,
    Reserved(u8),
}

impl NetworkMessageType {
    pub const fn from_code(code: u8) -> Self {
        match code & 0x0F {
            0 => NetworkMessageType::DataSetMessage,
            1 => NetworkMessageType::DiscoveryRequest,
            2 => NetworkMessageType::DiscoveryResponse,
            other => NetworkMessageType::Reserved(other),
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            NetworkMessageType::DataSetMessage => 0,
            NetworkMessageType::DiscoveryRequest => 1,
            NetworkMessageType::DiscoveryResponse => 2,
            NetworkMessageType::Reserved(code) => code & 0x0F,
        }
    }
}

/// Extended flags 1: publisher id type plus option bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ExtendedFlags1 {
    pub publisher_id_type: PublisherIdType,
    pub options: ExtendedFlags1Options,
}

impl ExtendedFlags1 {
    pub const fn from_byte(byte: u8) -> Self {
        Self {
            publisher_id_type: PublisherIdType::from_code(byte & 0x07),
            options: ExtendedFlags1Options::from_bits_retain(byte & 0xF8),
        }
    }

    pub const fn to_byte(self) -> u8 {
        self.publisher_id_type.code() | self.options.bits()
    }
}

/// Extended flags 2: chunk/promoted-field bits plus the network message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ExtendedFlags2 {
    pub options: ExtendedFlags2Options,
    pub message_type: NetworkMessageType,
}

impl ExtendedFlags2 {
    /// Bits 6-7 are reserved and dropped.
    pub const fn from_byte(byte: u8) -> Self {
        Self {
            options: ExtendedFlags2Options::from_bits_retain(byte & 0x03),
            message_type: NetworkMessageType::from_code((byte >> 2) & 0x0F),
        }
    }

    pub const fn to_byte(self) -> u8 {
        self.options.bits() | (self.message_type.code() << 2)
    }
}
