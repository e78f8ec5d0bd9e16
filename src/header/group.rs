//! Writer group header

use serde::{Deserialize, Serialize};

use super::GroupFlags;
use crate::Result;
use crate::codec::{Reader, Writer, require_flagged};

/// Group header; each field is present iff its bit in `flags` is set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupHeader {
    pub flags: GroupFlags,
    pub writer_group_id: Option<u16>,
    pub group_version: Option<u32>,
    pub network_message_number: Option<u16>,
    pub sequence_number: Option<u16>,
}

impl GroupHeader {
    pub fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let flags = GroupFlags::from_bits_retain(reader.read_u8()?);
        let mut header = GroupHeader { flags, ..Default::default() };
        if flags.contains(GroupFlags::WRITER_GROUP_ID) {
            header.writer_group_id = Some(reader.read_u16()?);
        }
        if flags.contains(GroupFlags::GROUP_VERSION) {
            header.group_version = Some(reader.read_u32()?);
        }
        if flags.contains(GroupFlags::NETWORK_MESSAGE_NUMBER) {
            header.network_message_number = Some(reader.read_u16()?);
        }
        if flags.contains(GroupFlags::SEQUENCE_NUMBER) {
            header.sequence_number = Some(reader.read_u16()?);
        }
        Ok(header)
    }

    pub fn encode(&self, writer: &mut Writer) -> Result<()> {
        const CONTEXT: &str = "group header";
        writer.write_u8(self.flags.bits());
        if self.flags.contains(GroupFlags::WRITER_GROUP_ID) {
            writer.write_u16(require_flagged(self.writer_group_id, CONTEXT, "writer group id")?);
        }
        if self.flags.contains(GroupFlags::GROUP_VERSION) {
            writer.write_u32(require_flagged(self.group_version, CONTEXT, "group version")?);
        }
        if self.flags.contains(GroupFlags::NETWORK_MESSAGE_NUMBER) {
            let number =
                require_flagged(self.network_message_number, CONTEXT, "network message number")?;
            writer.write_u16(number);
        }
        if self.flags.contains(GroupFlags::SEQUENCE_NUMBER) {
            writer.write_u16(require_flagged(self.sequence_number, CONTEXT, "sequence number")?);
        }
        Ok(())
    }
}
