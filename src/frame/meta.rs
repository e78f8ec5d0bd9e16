//! Meta frame: the schema of one writer at one configuration version

use serde::{Deserialize, Serialize};

use crate::codec::{Reader, Writer};
use crate::header::PublisherId;
use crate::schema::{EnumDescription, FieldMetaData, StructureDescription, TypeDescriptions};
use crate::types::{ConfigurationVersion, Guid};
use crate::{Result, UadpError};

/// Discovery response type carrying data set metadata.
pub const DATASET_METADATA_RESPONSE: u8 = 2;

/// Decoded data set metadata.
///
/// The publisher id is not part of the frame on the wire; it is taken from
/// the enclosing network message header. Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetaFrame {
    pub publisher_id: PublisherId,
    pub sequence_number: u16,
    pub writer_id: u16,
    pub name: String,
    pub description: Option<String>,
    /// Ordered fields; delta frames refer to them by position
    pub fields: Vec<FieldMetaData>,
    pub types: TypeDescriptions,
    pub dataset_class_id: Guid,
    pub configuration_version: ConfigurationVersion,
    pub status: u32,
}

impl MetaFrame {
    pub fn field(&self, index: usize) -> Option<&FieldMetaData> {
        self.fields.get(index)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Decode the discovery response body that follows the network header.
    pub fn decode(reader: &mut Reader<'_>, publisher_id: PublisherId) -> Result<Self> {
        let response_type = reader.read_u8()?;
        if response_type != DATASET_METADATA_RESPONSE {
            return Err(UadpError::unsupported_variant(
                "discovery response type",
                response_type as u32,
            ));
        }
        let sequence_number = reader.read_u16()?;
        let writer_id = reader.read_u16()?;
        let name = reader.read_string()?.unwrap_or_default();
        let description = reader.read_string()?;
        let fields = reader.read_array(FieldMetaData::decode)?.unwrap_or_default();

        let mut types = TypeDescriptions::default();
        for structure in reader.read_array(StructureDescription::decode)?.unwrap_or_default() {
            types.add_structure(structure);
        }
        for enumeration in reader.read_array(EnumDescription::decode)?.unwrap_or_default() {
            types.add_enum(enumeration);
        }

        let dataset_class_id = reader.read_guid()?;
        let major = reader.read_u32()?;
        let minor = reader.read_u32()?;
        let status = reader.read_u32()?;

        Ok(Self {
            publisher_id,
            sequence_number,
            writer_id,
            name,
            description,
            fields,
            types,
            dataset_class_id,
            configuration_version: ConfigurationVersion::new(major, minor),
            status,
        })
    }

    pub fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer.write_u8(DATASET_METADATA_RESPONSE);
        writer.write_u16(self.sequence_number);
        writer.write_u16(self.writer_id);
        writer.write_string(Some(self.name.as_str()))?;
        writer.write_string(self.description.as_deref())?;
        writer.write_array(Some(self.fields.as_slice()), |w, field| field.encode(w))?;

        let structures: Vec<_> = self.types.structures.values().collect();
        writer.write_array(Some(structures.as_slice()), |w, s| s.encode(w))?;
        let enums: Vec<_> = self.types.enums.values().collect();
        writer.write_array(Some(enums.as_slice()), |w, e| e.encode(w))?;

        writer.write_guid(&self.dataset_class_id);
        writer.write_u32(self.configuration_version.major);
        writer.write_u32(self.configuration_version.minor);
        writer.write_u32(self.status);
        Ok(())
    }
}
