//! Common DataSet message prefix

use serde::{Deserialize, Serialize};

use super::PayloadHeader;
use super::flags::{
    DataSetFlags1, DataSetFlags1Options, DataSetFlags2, DataSetFlags2Options, DataSetMessageType,
    FieldEncoding,
};
use crate::codec::{Reader, Writer, require_flagged};
use crate::types::ConfigurationVersion;
use crate::{Result, UadpError};

/// Fields shared by every DataSet message, read before the type-specific body.
///
/// Optional fields are present exactly when their flag bit is set. The flags
/// are authoritative on encode: callers set them, the encoder never infers
/// them from the populated fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataFrame {
    /// Present when the network header enabled the payload header
    pub payload_header: Option<PayloadHeader>,
    /// Writer the message belongs to; from the payload header or chunk envelope
    pub writer_id: u16,
    pub flags1: DataSetFlags1,
    pub flags2: Option<DataSetFlags2>,
    pub sequence_number: Option<u16>,
    pub timestamp: Option<i64>,
    pub picoseconds: Option<u16>,
    pub status: Option<u16>,
    pub configuration_version: Option<ConfigurationVersion>,
}

impl DataFrame {
    /// Valid frame of the given type with the given field encoding.
    pub fn new(writer_id: u16, message_type: DataSetMessageType, encoding: FieldEncoding) -> Self {
        let mut frame = Self {
            writer_id,
            flags1: DataSetFlags1::new(encoding, DataSetFlags1Options::VALID),
            ..Self::default()
        };
        if message_type != DataSetMessageType::KeyFrame {
            frame.flags2_mut().message_type = message_type;
        }
        frame
    }

    fn flags2_mut(&mut self) -> &mut DataSetFlags2 {
        self.flags1.options |= DataSetFlags1Options::FLAGS2;
        self.flags2.get_or_insert_with(DataSetFlags2::default)
    }

    pub fn with_payload_header(mut self) -> Self {
        self.payload_header = Some(PayloadHeader::single(self.writer_id));
        self
    }

    pub fn with_sequence_number(mut self, sequence_number: u16) -> Self {
        self.flags1.options |= DataSetFlags1Options::SEQUENCE_NUMBER;
        self.sequence_number = Some(sequence_number);
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.flags1.options |= DataSetFlags1Options::STATUS;
        self.status = Some(status);
        self
    }

    pub fn with_configuration_version(mut self, version: ConfigurationVersion) -> Self {
        self.flags1.options |=
            DataSetFlags1Options::MAJOR_VERSION | DataSetFlags1Options::MINOR_VERSION;
        self.configuration_version = Some(version);
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.flags2_mut().options |= DataSetFlags2Options::TIMESTAMP;
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_picoseconds(mut self, picoseconds: u16) -> Self {
        self.flags2_mut().options |= DataSetFlags2Options::PICOSECONDS;
        self.picoseconds = Some(picoseconds);
        self
    }

    /// Key frame when DataSetFlags2 is absent.
    pub fn message_type(&self) -> DataSetMessageType {
        if !self.flags1.options.contains(DataSetFlags1Options::FLAGS2) {
            return DataSetMessageType::KeyFrame;
        }
        self.flags2.map(|flags| flags.message_type).unwrap_or_default()
    }

    pub fn field_encoding(&self) -> FieldEncoding {
        self.flags1.encoding
    }

    pub fn is_valid(&self) -> bool {
        self.flags1.options.contains(DataSetFlags1Options::VALID)
    }

    fn flags2_option(&self, option: DataSetFlags2Options) -> bool {
        self.flags1.options.contains(DataSetFlags1Options::FLAGS2)
            && self.flags2.is_some_and(|flags| flags.options.contains(option))
    }

    /// Decode the prefix of a message carried directly in a network message.
    ///
    /// The writer id comes from the payload header when one is present, and
    /// is 0 otherwise.
    pub fn decode(reader: &mut Reader<'_>, has_payload_header: bool) -> Result<Self> {
        let payload_header =
            if has_payload_header { Some(PayloadHeader::decode(reader)?) } else { None };
        let writer_id =
            payload_header.as_ref().and_then(PayloadHeader::first_writer_id).unwrap_or(0);
        let mut frame = Self::decode_chunked(reader, writer_id)?;
        frame.payload_header = payload_header;
        Ok(frame)
    }

    /// Decode the prefix of a reassembled chunk payload.
    ///
    /// The payload header was consumed with the chunk envelope, so the writer
    /// id is supplied by the caller.
    pub fn decode_chunked(reader: &mut Reader<'_>, writer_id: u16) -> Result<Self> {
        let flags1 = DataSetFlags1::from_byte(reader.read_u8()?);
        let mut frame = Self { writer_id, flags1, ..Self::default() };
        let options = flags1.options;

        if options.contains(DataSetFlags1Options::FLAGS2) {
            frame.flags2 = Some(DataSetFlags2::from_byte(reader.read_u8()?));
        }
        if options.contains(DataSetFlags1Options::SEQUENCE_NUMBER) {
            frame.sequence_number = Some(reader.read_u16()?);
        }
        if frame.flags2_option(DataSetFlags2Options::TIMESTAMP) {
            frame.timestamp = Some(reader.read_i64()?);
        }
        if frame.flags2_option(DataSetFlags2Options::PICOSECONDS) {
            frame.picoseconds = Some(reader.read_u16()?);
        }
        if options.contains(DataSetFlags1Options::STATUS) {
            frame.status = Some(reader.read_u16()?);
        }

        let major_present = options.contains(DataSetFlags1Options::MAJOR_VERSION);
        let minor_present = options.contains(DataSetFlags1Options::MINOR_VERSION);
        match (major_present, minor_present) {
            (true, true) => {
                let major = reader.read_u32()?;
                let minor = reader.read_u32()?;
                frame.configuration_version = Some(ConfigurationVersion::new(major, minor));
            }
            (false, false) => {}
            _ => {
                return Err(UadpError::IncompleteConfigurationVersion {
                    major_present,
                    minor_present,
                });
            }
        }
        Ok(frame)
    }

    /// Encode the prefix, including the payload header when one is set.
    pub fn encode(&self, writer: &mut Writer) -> Result<()> {
        if let Some(payload_header) = &self.payload_header {
            payload_header.encode(writer)?;
        }
        self.encode_chunked(writer)
    }

    /// Encode the prefix without the payload header.
    pub fn encode_chunked(&self, writer: &mut Writer) -> Result<()> {
        const CONTEXT: &str = "data set message";
        let options = self.flags1.options;
        writer.write_u8(self.flags1.to_byte());

        if options.contains(DataSetFlags1Options::FLAGS2) {
            writer.write_u8(require_flagged(self.flags2, CONTEXT, "flags2")?.to_byte());
        }
        if options.contains(DataSetFlags1Options::SEQUENCE_NUMBER) {
            writer.write_u16(require_flagged(self.sequence_number, CONTEXT, "sequence number")?);
        }
        if self.flags2_option(DataSetFlags2Options::TIMESTAMP) {
            writer.write_i64(require_flagged(self.timestamp, CONTEXT, "timestamp")?);
        }
        if self.flags2_option(DataSetFlags2Options::PICOSECONDS) {
            writer.write_u16(require_flagged(self.picoseconds, CONTEXT, "picoseconds")?);
        }
        if options.contains(DataSetFlags1Options::STATUS) {
            writer.write_u16(require_flagged(self.status, CONTEXT, "status")?);
        }

        let major_present = options.contains(DataSetFlags1Options::MAJOR_VERSION);
        let minor_present = options.contains(DataSetFlags1Options::MINOR_VERSION);
        if major_present != minor_present {
            return Err(UadpError::IncompleteConfigurationVersion { major_present, minor_present });
        }
        if major_present {
            let version =
                require_flagged(self.configuration_version, CONTEXT, "configuration version")?;
            writer.write_u32(version.major);
            writer.write_u32(version.minor);
        }
        Ok(())
    }
}
