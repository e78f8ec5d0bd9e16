//! DataSet message flag bytes

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Presence bits of DataSetFlags1 (everything except the field encoding).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct DataSetFlags1Options: u8 {
        /// Message content is valid
        const VALID = 0x01;
        const SEQUENCE_NUMBER = 0x08;
        const STATUS = 0x10;
        const MAJOR_VERSION = 0x20;
        const MINOR_VERSION = 0x40;
        /// DataSetFlags2 byte follows
        const FLAGS2 = 0x80;
    }
}

bitflags! {
    /// Presence bits of DataSetFlags2 (everything except the message type).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct DataSetFlags2Options: u8 {
        const TIMESTAMP = 0x10;
        const PICOSECONDS = 0x20;
    }
}

/// How field values are encoded (bits 1-2 of DataSetFlags1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum FieldEncoding {
    /// Self-describing variant per field
    #[default]
    Variant,
    /// Bare value laid out by the field metadata
    RawData,
    /// Variant plus optional status and timestamps
    DataValue,
    Reserved,
}

impl FieldEncoding {
    pub const fn from_code(code: u8) -> Self {
        match code & 0x03 {
            0 => FieldEncoding::Variant,
            1 => FieldEncoding::RawData,
            2 => FieldEncoding::DataValue,
            _ => FieldEncoding::Reserved,
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            FieldEncoding::Variant => 0,
            FieldEncoding::RawData => 1,
            FieldEncoding::DataValue => 2,
            FieldEncoding::Reserved => 3,
        }
    }
}

/// DataSet message type (bits 0-3 of DataSetFlags2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum DataSetMessageType {
    #[default]
    KeyFrame,
    DeltaFrame,
    Event,
    KeepAlive,
    Reserved(u8),
}

impl DataSetMessageType {
    pub const fn from_code(code: u8) -> Self {
        match code & 0x0F {
            0 => DataSetMessageType::KeyFrame,
            1 => DataSetMessageType::DeltaFrame,
            2 => DataSetMessageType::Event,
            3 => DataSetMessageType::KeepAlive,
            other => DataSetMessageType::Reserved(other),
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            DataSetMessageType::KeyFrame => 0,
            DataSetMessageType::DeltaFrame => 1,
            DataSetMessageType::Event => 2,
            DataSetMessageType::KeepAlive => 3,
            DataSetMessageType::Reserved(code) => code & 0x0F,
        }
    }

    /// Key and delta frames need the writer's field metadata to decode.
    pub const fn needs_schema(self) -> bool {
        matches!(self, DataSetMessageType::KeyFrame | DataSetMessageType::DeltaFrame)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DataSetFlags1 {
    pub encoding: FieldEncoding,
    pub options: DataSetFlags1Options,
}

impl DataSetFlags1 {
    pub const fn new(encoding: FieldEncoding, options: DataSetFlags1Options) -> Self {
        Self { encoding, options }
    }

    pub const fn from_byte(byte: u8) -> Self {
        Self {
            encoding: FieldEncoding::from_code((byte >> 1) & 0x03),
            options: DataSetFlags1Options::from_bits_retain(byte & 0xF9),
        }
    }

    pub const fn to_byte(self) -> u8 {
        self.options.bits() | (self.encoding.code() << 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DataSetFlags2 {
    pub message_type: DataSetMessageType,
    pub options: DataSetFlags2Options,
}

impl DataSetFlags2 {
    pub const fn new(message_type: DataSetMessageType) -> Self {
        Self { message_type, options: DataSetFlags2Options::empty() }
    }

    /// Bits 6-7 are reserved and dropped.
    pub const fn from_byte(byte: u8) -> Self {
        Self {
            message_type: DataSetMessageType::from_code(byte & 0x0F),
            options: DataSetFlags2Options::from_bits_retain(byte & 0x30),
        }
    }

    pub const fn to_byte(self) -> u8 {
        self.message_type.code() | self.options.bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags1_round_trips_every_byte() {
        for byte in 0..=u8::MAX {
            assert_eq!(DataSetFlags1::from_byte(byte).to_byte(), byte);
        }
    }

    #[test]
    fn flags1_extracts_encoding() {
        let flags = DataSetFlags1::from_byte(0b0010_1011);
        assert_eq!(flags.encoding, FieldEncoding::RawData);
        assert!(flags.options.contains(DataSetFlags1Options::VALID));
        assert!(flags.options.contains(DataSetFlags1Options::SEQUENCE_NUMBER));
        assert!(flags.options.contains(DataSetFlags1Options::MAJOR_VERSION));
        assert!(!flags.options.contains(DataSetFlags1Options::MINOR_VERSION));
    }

    #[test]
    fn flags2_round_trips_defined_bits() {
        for byte in 0u8..0x40 {
            assert_eq!(DataSetFlags2::from_byte(byte).to_byte(), byte);
        }
        assert_eq!(DataSetFlags2::from_byte(0x13).message_type, DataSetMessageType::KeepAlive);
        assert_eq!(DataSetFlags2::from_byte(0x07).message_type, DataSetMessageType::Reserved(7));
    }

    #[test]
    fn only_key_and_delta_need_schema() {
        assert!(DataSetMessageType::KeyFrame.needs_schema());
        assert!(DataSetMessageType::DeltaFrame.needs_schema());
        assert!(!DataSetMessageType::Event.needs_schema());
        assert!(!DataSetMessageType::KeepAlive.needs_schema());
    }
}
