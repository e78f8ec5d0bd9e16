//! DataSet payload header

use serde::{Deserialize, Serialize};

use crate::codec::{Reader, Writer};
use crate::{Result, UadpError};

/// Writer ids multiplexed in one network message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PayloadHeader {
    pub writer_ids: Vec<u16>,
}

impl PayloadHeader {
    pub fn single(writer_id: u16) -> Self {
        Self { writer_ids: vec![writer_id] }
    }

    /// The writer the following data set message is attributed to.
    pub fn first_writer_id(&self) -> Option<u16> {
        self.writer_ids.first().copied()
    }

    pub fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let count = reader.read_u8()? as usize;
        let mut writer_ids = Vec::with_capacity(count.min(reader.remaining() / 2));
        for _ in 0..count {
            writer_ids.push(reader.read_u16()?);
        }
        Ok(Self { writer_ids })
    }

    pub fn encode(&self, writer: &mut Writer) -> Result<()> {
        let count = u8::try_from(self.writer_ids.len()).map_err(|_| {
            UadpError::encode_error(
                "payload header",
                format!("{} writer ids exceed the one-byte count", self.writer_ids.len()),
            )
        })?;
        writer.write_u8(count);
        for id in &self.writer_ids {
            writer.write_u16(*id);
        }
        Ok(())
    }
}
