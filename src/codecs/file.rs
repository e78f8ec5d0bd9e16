//! File payload codec

use super::{CodecContext, ValueCodec};
use crate::codec::{Reader, Writer};
use crate::types::{FileValue, Variant};
use crate::{Result, UadpError};

/// Name (string) followed by content (byte string).
#[derive(Debug, Clone, Copy, Default)]
pub struct FileCodec;

impl ValueCodec for FileCodec {
    fn decode(&self, reader: &mut Reader<'_>, _context: &CodecContext<'_>) -> Result<Variant> {
        let name = reader.read_string()?.unwrap_or_default();
        let content = reader.read_byte_string()?.unwrap_or_default();
        Ok(Variant::File(FileValue { name, content }))
    }

    fn encode(
        &self,
        value: &Variant,
        writer: &mut Writer,
        _context: &CodecContext<'_>,
    ) -> Result<()> {
        let Variant::File(file) = value else {
            return Err(UadpError::encode_error(
                "file value",
                format!("expected a file, got {:?}", value.built_in_type()),
            ));
        };
        writer.write_string(Some(file.name.as_str()))?;
        writer.write_byte_string(Some(file.content.as_slice()))
    }
}
