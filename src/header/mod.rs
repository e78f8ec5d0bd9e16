//! Network message header.
//!
//! The header is a flag-driven envelope: the first byte carries the protocol
//! version and four enable bits, and every later field is read only when the
//! bit that enables it was set. Absent fields are never read from the stream.
//!
//! ## Layout
//!
//! 1. Version (bits 0-3) and [`UadpFlags`] (bits 4-7)
//! 2. [`ExtendedFlags1`] if `EXTENDED_FLAGS1`
//! 3. [`ExtendedFlags2`] if extended flags 1 enables it
//! 4. [`PublisherId`] if `PUBLISHER_ID`
//! 5. DataSetClassId (GUID) if extended flags 1 enables it
//! 6. [`GroupHeader`] if `GROUP_HEADER`
//! 7. Timestamp (i64) and picoseconds (u16) if extended flags 1 enables them
//!
//! ```rust
//! use uadp::codec::{Reader, Writer};
//! use uadp::header::{NetworkMessageHeader, PublisherId};
//!
//! let header = NetworkMessageHeader::new()
//!     .with_publisher_id(PublisherId::from("plc-1"))
//!     .with_payload_header();
//!
//! let mut writer = Writer::new();
//! header.encode(&mut writer)?;
//! let bytes = writer.into_inner();
//!
//! let decoded = NetworkMessageHeader::decode(&mut Reader::new(&bytes))?;
//! assert_eq!(decoded, header);
//! # Ok::<(), uadp::UadpError>(())
//! ```

mod flags;
mod group;
mod publisher_id;

pub use flags::{
    ExtendedFlags1, ExtendedFlags1Options, ExtendedFlags2, ExtendedFlags2Options, GroupFlags,
    NetworkMessageType, PublisherIdType, UadpFlags,
};
pub use group::GroupHeader;
pub use publisher_id::PublisherId;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::codec::{Reader, Writer, require_flagged};
use crate::types::Guid;
use crate::{Result, UadpError};

/// The only protocol version this codec accepts.
pub const UADP_VERSION: u8 = 1;

/// Decoded network message header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMessageHeader {
    pub version: u8,
    pub flags: UadpFlags,
    pub extended_flags1: Option<ExtendedFlags1>,
    pub extended_flags2: Option<ExtendedFlags2>,
    pub publisher_id: Option<PublisherId>,
    pub dataset_class_id: Option<Guid>,
    pub group_header: Option<GroupHeader>,
    pub timestamp: Option<i64>,
    pub picoseconds: Option<u16>,
}

impl Default for NetworkMessageHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkMessageHeader {
    /// Header with version 1 and no optional fields.
    pub fn new() -> Self {
        Self {
            version: UADP_VERSION,
            flags: UadpFlags::empty(),
            extended_flags1: None,
            extended_flags2: None,
            publisher_id: None,
            dataset_class_id: None,
            group_header: None,
            timestamp: None,
            picoseconds: None,
        }
    }

    fn ext1_mut(&mut self) -> &mut ExtendedFlags1 {
        self.flags |= UadpFlags::EXTENDED_FLAGS1;
        self.extended_flags1.get_or_insert_with(ExtendedFlags1::default)
    }

    fn ext2_mut(&mut self) -> &mut ExtendedFlags2 {
        self.ext1_mut().options |= ExtendedFlags1Options::EXTENDED_FLAGS2;
        self.extended_flags2.get_or_insert_with(ExtendedFlags2::default)
    }

    /// Set the publisher id along with its enable bit and type code.
    pub fn with_publisher_id(mut self, publisher_id: PublisherId) -> Self {
        self.flags |= UadpFlags::PUBLISHER_ID;
        let id_type = publisher_id.id_type();
        if id_type != PublisherIdType::Byte || self.extended_flags1.is_some() {
            self.ext1_mut().publisher_id_type = id_type;
        }
        self.publisher_id = Some(publisher_id);
        self
    }

    pub fn with_payload_header(mut self) -> Self {
        self.flags |= UadpFlags::PAYLOAD_HEADER;
        self
    }

    pub fn with_group_header(mut self, group_header: GroupHeader) -> Self {
        self.flags |= UadpFlags::GROUP_HEADER;
        self.group_header = Some(group_header);
        self
    }

    pub fn with_dataset_class_id(mut self, class_id: Guid) -> Self {
        self.ext1_mut().options |= ExtendedFlags1Options::DATASET_CLASS_ID;
        self.dataset_class_id = Some(class_id);
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.ext1_mut().options |= ExtendedFlags1Options::TIMESTAMP;
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_picoseconds(mut self, picoseconds: u16) -> Self {
        self.ext1_mut().options |= ExtendedFlags1Options::PICOSECONDS;
        self.picoseconds = Some(picoseconds);
        self
    }

    pub fn with_message_type(mut self, message_type: NetworkMessageType) -> Self {
        self.ext2_mut().message_type = message_type;
        self
    }

    /// Mark the message as one chunk of a larger payload.
    pub fn with_chunk(mut self) -> Self {
        self.ext2_mut().options |= ExtendedFlags2Options::CHUNK;
        self
    }

    fn ext1(&self) -> Option<ExtendedFlags1> {
        self.extended_flags1.filter(|_| self.flags.contains(UadpFlags::EXTENDED_FLAGS1))
    }

    fn ext1_option(&self, option: ExtendedFlags1Options) -> bool {
        self.ext1().is_some_and(|ext| ext.options.contains(option))
    }

    fn ext2(&self) -> Option<ExtendedFlags2> {
        self.extended_flags2.filter(|_| self.ext1_option(ExtendedFlags1Options::EXTENDED_FLAGS2))
    }

    /// Publisher id type in effect; Byte when extended flags 1 is absent.
    pub fn publisher_id_type(&self) -> PublisherIdType {
        self.ext1().map(|ext| ext.publisher_id_type).unwrap_or_default()
    }

    /// DataSet message when extended flags 2 is absent.
    pub fn message_type(&self) -> NetworkMessageType {
        self.ext2().map(|ext| ext.message_type).unwrap_or_default()
    }

    pub fn is_chunk(&self) -> bool {
        self.ext2().is_some_and(|ext| ext.options.contains(ExtendedFlags2Options::CHUNK))
    }

    pub fn has_payload_header(&self) -> bool {
        self.flags.contains(UadpFlags::PAYLOAD_HEADER)
    }

    pub fn security_enabled(&self) -> bool {
        self.ext1_option(ExtendedFlags1Options::SECURITY)
    }

    pub fn has_promoted_fields(&self) -> bool {
        self.ext2().is_some_and(|ext| ext.options.contains(ExtendedFlags2Options::PROMOTED_FIELDS))
    }

    /// Publisher id used to key caches; the default id when none was sent.
    pub fn publisher_key(&self) -> PublisherId {
        self.publisher_id.clone().unwrap_or_default()
    }

    /// Decode a header, reading only the fields enabled by earlier flags.
    ///
    /// A reserved publisher id type stops decoding right after the flag bytes
    /// and yields a header whose id is [`PublisherId::Unsupported`].
    ///
    /// # Errors
    ///
    /// - [`UadpError::UnsupportedVersion`] for any version other than 1
    /// - [`UadpError::InsufficientData`] when a flagged field is cut short
    pub fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let first = reader.read_u8()?;
        let version = first & 0x0F;
        if version != UADP_VERSION {
            return Err(UadpError::UnsupportedVersion { expected: UADP_VERSION, found: version });
        }

        let mut header = Self::new();
        header.flags = UadpFlags::from_bits_retain(first & 0xF0);

        if header.flags.contains(UadpFlags::EXTENDED_FLAGS1) {
            let ext1 = ExtendedFlags1::from_byte(reader.read_u8()?);
            header.extended_flags1 = Some(ext1);
            if ext1.options.contains(ExtendedFlags1Options::EXTENDED_FLAGS2) {
                header.extended_flags2 = Some(ExtendedFlags2::from_byte(reader.read_u8()?));
            }
        }

        if header.flags.contains(UadpFlags::PUBLISHER_ID) {
            let publisher_id = PublisherId::decode(reader, header.publisher_id_type())?;
            let supported = publisher_id.is_supported();
            header.publisher_id = Some(publisher_id);
            if !supported {
                return Ok(header);
            }
        }

        if header.ext1_option(ExtendedFlags1Options::DATASET_CLASS_ID) {
            header.dataset_class_id = Some(reader.read_guid()?);
        }
        if header.flags.contains(UadpFlags::GROUP_HEADER) {
            header.group_header = Some(GroupHeader::decode(reader)?);
        }
        if header.ext1_option(ExtendedFlags1Options::TIMESTAMP) {
            header.timestamp = Some(reader.read_i64()?);
        }
        if header.ext1_option(ExtendedFlags1Options::PICOSECONDS) {
            header.picoseconds = Some(reader.read_u16()?);
        }

        trace!(
            flags = header.flags.bits(),
            message_type = ?header.message_type(),
            chunk = header.is_chunk(),
            "Decoded network message header ({} bytes)",
            reader.position()
        );
        Ok(header)
    }

    /// Encode the header, writing exactly the fields enabled by the flags.
    ///
    /// Flags are not inferred: a set bit whose field is `None` is an error, and
    /// a populated field whose bit is clear is not written.
    pub fn encode(&self, writer: &mut Writer) -> Result<()> {
        const CONTEXT: &str = "network message header";
        if self.version > 0x0F {
            return Err(UadpError::encode_error(CONTEXT, "version does not fit in 4 bits"));
        }
        writer.write_u8(self.version | (self.flags.bits() & 0xF0));

        if self.flags.contains(UadpFlags::EXTENDED_FLAGS1) {
            let ext1 = require_flagged(self.extended_flags1, CONTEXT, "extended flags 1")?;
            writer.write_u8(ext1.to_byte());
            if ext1.options.contains(ExtendedFlags1Options::EXTENDED_FLAGS2) {
                let ext2 = require_flagged(self.extended_flags2, CONTEXT, "extended flags 2")?;
                writer.write_u8(ext2.to_byte());
            }
        }

        if self.flags.contains(UadpFlags::PUBLISHER_ID) {
            let publisher_id =
                require_flagged(self.publisher_id.as_ref(), CONTEXT, "publisher id")?;
            if publisher_id.id_type() != self.publisher_id_type() {
                return Err(UadpError::encode_error(
                    CONTEXT,
                    format!(
                        "publisher id is {:?} but flags declare {:?}",
                        publisher_id.id_type(),
                        self.publisher_id_type()
                    ),
                ));
            }
            publisher_id.encode(writer)?;
        }

        if self.ext1_option(ExtendedFlags1Options::DATASET_CLASS_ID) {
            let class_id = require_flagged(self.dataset_class_id, CONTEXT, "dataset class id")?;
            writer.write_guid(&class_id);
        }
        if self.flags.contains(UadpFlags::GROUP_HEADER) {
            require_flagged(self.group_header.as_ref(), CONTEXT, "group header")?.encode(writer)?;
        }
        if self.ext1_option(ExtendedFlags1Options::TIMESTAMP) {
            writer.write_i64(require_flagged(self.timestamp, CONTEXT, "timestamp")?);
        }
        if self.ext1_option(ExtendedFlags1Options::PICOSECONDS) {
            writer.write_u16(require_flagged(self.picoseconds, CONTEXT, "picoseconds")?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encode(header: &NetworkMessageHeader) -> Vec<u8> {
        let mut writer = Writer::new();
        header.encode(&mut writer).unwrap();
        writer.into_inner()
    }

    fn arb_publisher_id() -> impl Strategy<Value = PublisherId> {
        prop_oneof![
            any::<u8>().prop_map(PublisherId::Byte),
            any::<u16>().prop_map(PublisherId::UInt16),
            any::<u32>().prop_map(PublisherId::UInt32),
            any::<u64>().prop_map(PublisherId::UInt64),
            "[a-z0-9-]{0,16}".prop_map(PublisherId::String),
            any::<[u8; 16]>().prop_map(|g| PublisherId::Guid(Guid(g))),
        ]
    }

    prop_compose! {
        fn arb_header()(
            publisher in prop::option::of(arb_publisher_id()),
            payload_header in any::<bool>(),
            class_id in prop::option::of(any::<[u8; 16]>()),
            group in prop::option::of(
                (any::<u8>(), any::<u16>(), any::<u32>(), any::<u16>(), any::<u16>())
            ),
            timestamp in prop::option::of(any::<i64>()),
            picoseconds in prop::option::of(any::<u16>()),
            message_type in prop::option::of(0u8..3),
            chunk in any::<bool>(),
        ) -> NetworkMessageHeader {
            let mut header = NetworkMessageHeader::new();
            if let Some(publisher) = publisher {
                header = header.with_publisher_id(publisher);
            }
            if payload_header {
                header = header.with_payload_header();
            }
            if let Some(class_id) = class_id {
                header = header.with_dataset_class_id(Guid(class_id));
            }
            if let Some((bits, id, version, number, sequence)) = group {
                let flags = GroupFlags::from_bits_truncate(bits);
                header = header.with_group_header(GroupHeader {
                    flags,
                    writer_group_id: flags.contains(GroupFlags::WRITER_GROUP_ID).then_some(id),
                    group_version: flags.contains(GroupFlags::GROUP_VERSION).then_some(version),
                    network_message_number: flags
                        .contains(GroupFlags::NETWORK_MESSAGE_NUMBER)
                        .then_some(number),
                    sequence_number: flags
                        .contains(GroupFlags::SEQUENCE_NUMBER)
                        .then_some(sequence),
                });
            }
            if let Some(timestamp) = timestamp {
                header = header.with_timestamp(timestamp);
            }
            if let Some(picoseconds) = picoseconds {
                header = header.with_picoseconds(picoseconds);
            }
            if let Some(code) = message_type {
                header = header.with_message_type(NetworkMessageType::from_code(code));
            }
            if chunk {
                header = header.with_chunk();
            }
            header
        }
    }

    proptest! {
        #[test]
        fn prop_header_round_trips_for_all_flag_combinations(header in arb_header()) {
            let bytes = encode(&header);
            let mut reader = Reader::new(&bytes);
            let decoded = NetworkMessageHeader::decode(&mut reader).unwrap();
            prop_assert_eq!(&decoded, &header);
            prop_assert!(reader.is_empty());
        }

        #[test]
        fn prop_wrong_version_is_rejected_regardless_of_payload(
            version in (0u8..16).prop_filter("not the supported version", |v| *v != UADP_VERSION),
            flags in 0u8..16,
            rest in prop::collection::vec(any::<u8>(), 0..32),
        ) {
            let mut bytes = vec![version | (flags << 4)];
            bytes.extend(rest);
            let err = NetworkMessageHeader::decode(&mut Reader::new(&bytes)).unwrap_err();
            let is_version_error = matches!(err, UadpError::UnsupportedVersion { .. });
            prop_assert!(is_version_error);
        }
    }

    #[test]
    fn minimal_header_is_one_byte() {
        let bytes = encode(&NetworkMessageHeader::new());
        assert_eq!(bytes, vec![0x01]);
    }

    #[test]
    fn string_publisher_layout() {
        let header = NetworkMessageHeader::new().with_publisher_id(PublisherId::from("ab"));
        let bytes = encode(&header);
        // version 1 | PUBLISHER_ID | EXTENDED_FLAGS1, ext1 type String, length 2, "ab"
        assert_eq!(bytes, vec![0x91, 0x04, 0x02, 0x00, 0x00, 0x00, b'a', b'b']);
    }

    #[test]
    fn reserved_publisher_type_stops_after_flags() {
        // ext1 with reserved type 7, then bytes that must not be consumed
        let bytes = [0x91, 0x07, 0xAA, 0xBB];
        let mut reader = Reader::new(&bytes);
        let header = NetworkMessageHeader::decode(&mut reader).unwrap();
        assert_eq!(header.publisher_id, Some(PublisherId::Unsupported(7)));
        assert_eq!(reader.remaining(), 2);

        let mut writer = Writer::new();
        assert!(header.encode(&mut writer).is_err());
    }

    #[test]
    fn flag_without_value_fails_to_encode() {
        let mut header = NetworkMessageHeader::new().with_timestamp(5);
        header.timestamp = None;
        let mut writer = Writer::new();
        let err = header.encode(&mut writer).unwrap_err();
        assert!(matches!(err, UadpError::Encode { .. }));
    }

    #[test]
    fn truncated_publisher_is_a_short_read() {
        let bytes = [0x91, 0x04, 0x05, 0x00];
        let err = NetworkMessageHeader::decode(&mut Reader::new(&bytes)).unwrap_err();
        assert!(err.is_truncation());
    }
}
