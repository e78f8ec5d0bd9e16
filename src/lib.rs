//! Binary UADP network message codec.
//!
//! `uadp` decodes and encodes the UADP pub/sub wire format: a flag-driven
//! network message header followed by DataSet messages (key, delta, event and
//! keep-alive frames), discovery responses carrying data set metadata, or
//! chunks of larger messages.
//!
//! # Features
//!
//! - **Stateful decoding**: [`MessageDecoder`] reassembles chunked messages
//!   and caches each writer's schema so key and delta frames can be laid out
//! - **Symmetric encoding**: everything the decoder accepts can be produced
//!   again through [`MessageEncoder`] or [`NetworkMessage::encode`]
//! - **Consumer loop**: [`UadpConnection`] drains a [`MessageSource`] on a
//!   Tokio task and publishes decoded messages as a stream
//! - **Best effort**: once a header is read the result always carries it;
//!   malformed bodies are reported through [`DecodeStatus`]
//!
//! # Example
//!
//! ```rust
//! use uadp::{MessageDecoder, MessageEncoder};
//! use uadp::frame::{
//!     DataFrame, DataSetFrame, DataSetMessageType, FieldEncoding, KeyFrame, MetaFrame,
//! };
//! use uadp::header::PublisherId;
//! use uadp::schema::FieldMetaData;
//! use uadp::types::{BuiltInType, ConfigurationVersion, DataPointValue, Variant};
//!
//! let version = ConfigurationVersion::new(1, 0);
//! let meta = MetaFrame {
//!     publisher_id: PublisherId::from("plc-1"),
//!     writer_id: 5,
//!     fields: vec![FieldMetaData::scalar("temperature", BuiltInType::Float)],
//!     configuration_version: version,
//!     ..MetaFrame::default()
//! };
//! let frame = DataSetFrame::Key(KeyFrame {
//!     frame: DataFrame::new(5, DataSetMessageType::KeyFrame, FieldEncoding::RawData)
//!         .with_payload_header()
//!         .with_configuration_version(version),
//!     values: vec![DataPointValue::new(Variant::Float(36.6))],
//! });
//!
//! let encoder = MessageEncoder::new(PublisherId::from("plc-1"));
//! let mut decoder = MessageDecoder::default();
//! decoder.parse(&encoder.encode_meta(&meta)?)?;
//!
//! let message = decoder.parse(&encoder.encode_data_set(&frame, Some(&meta))?)?;
//! assert_eq!(message.and_then(|m| m.as_data_set().cloned()), Some(frame));
//! # Ok::<(), uadp::UadpError>(())
//! ```

// Core types and error handling
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Wire format
pub mod codec;
pub mod codecs;
pub mod frame;
pub mod header;

// Decode state
pub mod chunk;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod schema;

// Consumer loop
pub mod connection;
pub mod driver;
pub mod source;
pub mod sources;

// Core exports
pub use error::*;

// Main API exports
pub use chunk::{ChunkCompletion, ChunkReassembler};
pub use config::DecoderConfig;
pub use connection::UadpConnection;
pub use decoder::{DecodeObserver, DecodeStatus, MessageBody, MessageDecoder, NetworkMessage};
pub use driver::{DecodedEvent, DriverState};
pub use encoder::MessageEncoder;
pub use schema::LocalSchemaCache;
pub use source::{MessageSource, RawMessage};
