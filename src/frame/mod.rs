//! DataSet message frames, chunk envelopes and meta frames.
//!
//! A DataSet message is a common prefix ([`DataFrame`]) followed by a body
//! chosen by its [`DataSetMessageType`]:
//!
//! - **KeyFrame**: field count (u16) and one value per schema field
//! - **DeltaFrame**: field count (u16) and `(index u16, value)` pairs
//! - **Event**: field count (u16) and self-describing variants
//! - **KeepAlive**: no body
//!
//! Key and delta values are laid out by the writer's [`MetaFrame`]; without
//! it they decode to [`DataSetFrame::Unresolved`], which keeps the prefix.
//!
//! ```rust
//! use uadp::codec::{Reader, Writer};
//! use uadp::codecs::CodecRegistry;
//! use uadp::frame::{
//!     DataFrame, DataSetFrame, DataSetMessageType, FieldEncoding, KeyFrame, MetaFrame,
//! };
//! use uadp::schema::FieldMetaData;
//! use uadp::types::{BuiltInType, ConfigurationVersion, DataPointValue, Variant};
//!
//! let meta = MetaFrame {
//!     fields: vec![FieldMetaData::scalar("temperature", BuiltInType::Double)],
//!     configuration_version: ConfigurationVersion::new(1, 0),
//!     ..MetaFrame::default()
//! };
//! let frame = DataSetFrame::Key(KeyFrame {
//!     frame: DataFrame::new(1, DataSetMessageType::KeyFrame, FieldEncoding::RawData)
//!         .with_payload_header()
//!         .with_configuration_version(ConfigurationVersion::new(1, 0)),
//!     values: vec![DataPointValue::new(Variant::Double(21.5))],
//! });
//!
//! let registry = CodecRegistry::new();
//! let mut writer = Writer::new();
//! frame.encode(&mut writer, Some(&meta), &registry)?;
//! let bytes = writer.into_inner();
//!
//! let mut reader = Reader::new(&bytes);
//! let prefix = DataFrame::decode(&mut reader, true)?;
//! let decoded = DataSetFrame::decode_body(prefix, &mut reader, Some(&meta), &registry)?;
//! assert_eq!(decoded, frame);
//! # Ok::<(), uadp::UadpError>(())
//! ```

mod chunk;
mod data_frame;
mod dataset;
mod flags;
mod meta;
mod payload_header;
mod values;

pub use chunk::ChunkedMessage;
pub use data_frame::DataFrame;
pub use dataset::{DataSetFrame, DeltaFrame, DeltaItem, EventFrame, KeyFrame};
pub use flags::{
    DataSetFlags1, DataSetFlags1Options, DataSetFlags2, DataSetFlags2Options, DataSetMessageType,
    FieldEncoding,
};
pub use meta::{DATASET_METADATA_RESPONSE, MetaFrame};
pub use payload_header::PayloadHeader;
