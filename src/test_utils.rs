//! Message fixtures shared by unit tests and benches.
//!
//! Everything here builds wire bytes through the public encoders, so the
//! fixtures stay in step with the codec.

#![cfg(any(test, feature = "benchmark"))]

use crate::codecs::CodecRegistry;
use crate::decoder::NetworkMessage;
use crate::encoder::MessageEncoder;
use crate::frame::{
    DataFrame, DataSetFrame, DataSetMessageType, DeltaFrame, DeltaItem, FieldEncoding, KeyFrame,
    MetaFrame,
};
use crate::header::{NetworkMessageHeader, NetworkMessageType, PublisherId};
use crate::schema::FieldMetaData;
use crate::types::{BuiltInType, ConfigurationVersion, DataPointValue, Variant};

/// Writer id used by every fixture.
pub const WRITER_ID: u16 = 7;

pub fn publisher() -> PublisherId {
    PublisherId::from("line-3/plc")
}

pub fn version() -> ConfigurationVersion {
    ConfigurationVersion::new(2, 1)
}

/// Four-field schema for [`WRITER_ID`] at `version`.
pub fn sample_meta(version: ConfigurationVersion) -> MetaFrame {
    MetaFrame {
        publisher_id: publisher(),
        sequence_number: 1,
        writer_id: WRITER_ID,
        name: "Press".to_string(),
        fields: vec![
            FieldMetaData::scalar("running", BuiltInType::Boolean),
            FieldMetaData::scalar("pressure", BuiltInType::Double),
            FieldMetaData::scalar("cycles", BuiltInType::UInt32),
            FieldMetaData::scalar("recipe", BuiltInType::String),
        ],
        configuration_version: version,
        ..MetaFrame::default()
    }
}

pub fn sample_values() -> Vec<DataPointValue> {
    vec![
        DataPointValue::new(Variant::Boolean(true)),
        DataPointValue::new(Variant::Double(212.75)),
        DataPointValue::new(Variant::UInt32(48_112)),
        DataPointValue::new(Variant::String(Some("steel-2mm".to_string()))),
    ]
}

pub fn key_frame(encoding: FieldEncoding, sequence_number: u16) -> DataSetFrame {
    DataSetFrame::Key(KeyFrame {
        frame: DataFrame::new(WRITER_ID, DataSetMessageType::KeyFrame, encoding)
            .with_payload_header()
            .with_sequence_number(sequence_number)
            .with_configuration_version(version()),
        values: sample_values(),
    })
}

pub fn delta_frame(sequence_number: u16) -> DataSetFrame {
    DataSetFrame::Delta(DeltaFrame {
        frame: DataFrame::new(WRITER_ID, DataSetMessageType::DeltaFrame, FieldEncoding::RawData)
            .with_payload_header()
            .with_sequence_number(sequence_number)
            .with_configuration_version(version()),
        items: vec![DeltaItem {
            field_index: 2,
            value: DataPointValue::new(Variant::UInt32(48_113)),
        }],
    })
}

pub fn data_header() -> NetworkMessageHeader {
    NetworkMessageHeader::new().with_publisher_id(publisher()).with_payload_header()
}

pub fn meta_header() -> NetworkMessageHeader {
    NetworkMessageHeader::new()
        .with_publisher_id(publisher())
        .with_message_type(NetworkMessageType::DiscoveryResponse)
}

/// Discovery response carrying `meta`.
pub fn meta_message(meta: &MetaFrame) -> Vec<u8> {
    NetworkMessage::meta(meta_header(), meta.clone())
        .encode(None, &CodecRegistry::new())
        .expect("fixture meta frame encodes")
}

/// Data set message carrying `frame`, laid out with `meta`.
pub fn data_message(frame: &DataSetFrame, meta: &MetaFrame) -> Vec<u8> {
    NetworkMessage::data_set(data_header(), frame.clone())
        .encode(Some(meta), &CodecRegistry::new())
        .expect("fixture data set frame encodes")
}

/// `frame` split into chunk messages of at most `max_chunk` payload bytes.
pub fn chunk_messages(
    frame: &DataSetFrame,
    meta: &MetaFrame,
    sequence_number: u16,
    max_chunk: usize,
) -> Vec<Vec<u8>> {
    MessageEncoder::new(publisher())
        .encode_chunked_data_set(frame, Some(meta), sequence_number, max_chunk)
        .expect("fixture frame splits into chunks")
}
