//! Decoder state across messages and the consumer loop end to end

use futures::StreamExt;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use uadp::codec::{Reader, Writer};
use uadp::codecs::CodecRegistry;
use uadp::frame::{
    DataFrame, DataSetFrame, DataSetMessageType, DeltaFrame, DeltaItem, FieldEncoding, KeyFrame,
    MetaFrame,
};
use uadp::header::PublisherId;
use uadp::schema::{FieldMetaData, StructureDescription, StructureField, TypeDescriptions};
use uadp::sources::{ChannelSource, ReplaySource};
use uadp::types::{BuiltInType, ConfigurationVersion, DataPointValue, NodeId, Variant};
use uadp::{
    ChunkCompletion, DecodeStatus, DecoderConfig, DriverState, LocalSchemaCache, MessageDecoder,
    MessageEncoder, RawMessage, UadpConnection, UadpError,
};

const WAIT: Duration = Duration::from_secs(5);
const WRITER: u16 = 4;

fn publisher() -> PublisherId {
    PublisherId::UInt16(1200)
}

fn meta(version: ConfigurationVersion) -> MetaFrame {
    MetaFrame {
        publisher_id: publisher(),
        writer_id: WRITER,
        name: "Boiler".to_string(),
        fields: vec![
            FieldMetaData::scalar("burner_on", BuiltInType::Boolean),
            FieldMetaData::scalar("flow", BuiltInType::Int32),
            FieldMetaData::scalar("temperature", BuiltInType::Double),
        ],
        configuration_version: version,
        ..MetaFrame::default()
    }
}

fn values() -> Vec<DataPointValue> {
    vec![
        DataPointValue::new(Variant::Boolean(true)),
        DataPointValue::new(Variant::Int32(-40)),
        DataPointValue::new(Variant::Double(88.5)),
    ]
}

fn key_frame(version: ConfigurationVersion, sequence_number: u16) -> DataSetFrame {
    DataSetFrame::Key(KeyFrame {
        frame: DataFrame::new(WRITER, DataSetMessageType::KeyFrame, FieldEncoding::Variant)
            .with_payload_header()
            .with_sequence_number(sequence_number)
            .with_configuration_version(version),
        values: values(),
    })
}

#[test]
fn three_field_key_frame_decodes_against_its_schema() -> anyhow::Result<()> {
    let version = ConfigurationVersion::new(1, 0);
    let schema = meta(version);
    let DataSetFrame::Key(key) = key_frame(version, 5) else { unreachable!() };
    let frame = DataSetFrame::Key(KeyFrame {
        frame: DataFrame { payload_header: None, ..key.frame },
        values: key.values,
    });

    let mut writer = Writer::new();
    frame.encode(&mut writer, Some(&schema), &CodecRegistry::new())?;
    let bytes = writer.into_inner();
    // Valid, sequence number, major and minor version; variant encoding; no flags 2
    assert_eq!(bytes[0], 0x69);

    let mut reader = Reader::new(&bytes);
    let prefix = DataFrame::decode(&mut reader, false)?;
    let decoded =
        DataSetFrame::decode_body(prefix, &mut reader, Some(&schema), &CodecRegistry::new())?;
    let DataSetFrame::Key(key) = decoded else { panic!("expected key frame: {decoded:?}") };
    assert_eq!(key.values.len(), 3);
    assert_eq!(key.frame.sequence_number, Some(5));
    assert_eq!(key.frame.configuration_version, Some(version));
    assert_eq!(key.values, values());
    assert_eq!(reader.remaining(), 0);
    Ok(())
}

#[test]
fn eleventh_version_evicts_the_smallest() {
    let mut cache = LocalSchemaCache::new();
    // Stored out of order so eviction cannot depend on insertion order
    let mut versions: Vec<_> = (0..11).map(|minor| ConfigurationVersion::new(2, minor)).collect();
    versions.swap(0, 6);
    versions.swap(3, 10);
    for version in &versions {
        assert!(cache.store(Arc::new(meta(*version))));
    }

    assert_eq!(cache.len(), 10);
    let kept = cache.versions(&publisher(), WRITER);
    assert_eq!(kept.len(), 10);
    assert!(!kept.contains(&ConfigurationVersion::new(2, 0)));
    assert!(!cache.is_known(&publisher(), WRITER, ConfigurationVersion::new(2, 0)));
    assert!(cache.is_known(&publisher(), WRITER, ConfigurationVersion::new(2, 10)));

    // A known version is not stored again
    assert!(!cache.store(Arc::new(meta(ConfigurationVersion::new(2, 5)))));
    assert_eq!(cache.len(), 10);
}

#[test]
fn evicted_schema_no_longer_resolves_frames() -> anyhow::Result<()> {
    let config = DecoderConfig { schema_versions_per_writer: 2, ..DecoderConfig::default() };
    let mut decoder = MessageDecoder::new(config);
    let encoder = MessageEncoder::new(publisher());

    for major in 1..=3 {
        decoder.parse(&encoder.encode_meta(&meta(ConfigurationVersion::new(major, 0)))?)?;
    }
    assert_eq!(decoder.schemas().len(), 2);

    let old = ConfigurationVersion::new(1, 0);
    let message = decoder
        .parse(&encoder.encode_data_set(&key_frame(old, 1), Some(&meta(old)))?)?
        .expect("header decodes");
    assert_eq!(message.status, DecodeStatus::SchemaMissing);

    let current = ConfigurationVersion::new(3, 0);
    let frame = key_frame(current, 2);
    let message = decoder
        .parse(&encoder.encode_data_set(&frame, Some(&meta(current)))?)?
        .expect("header decodes");
    assert_eq!(message.as_data_set(), Some(&frame));
    Ok(())
}

#[test]
fn schemas_are_kept_per_publisher() -> anyhow::Result<()> {
    let mut decoder = MessageDecoder::default();
    let version = ConfigurationVersion::new(1, 0);
    decoder.parse(&MessageEncoder::new(publisher()).encode_meta(&meta(version))?)?;

    let other = MessageEncoder::new(PublisherId::UInt16(1201));
    let message = decoder
        .parse(&other.encode_data_set(&key_frame(version, 1), Some(&meta(version)))?)?
        .expect("header decodes");
    assert_eq!(message.status, DecodeStatus::SchemaMissing);
    assert!(matches!(message.as_data_set(), Some(DataSetFrame::Unresolved(_))));
    Ok(())
}

#[test]
fn delta_index_past_the_schema_is_malformed() -> anyhow::Result<()> {
    let version = ConfigurationVersion::new(1, 0);
    let mut wide = meta(version);
    wide.fields.push(FieldMetaData::scalar("pressure", BuiltInType::Float));
    let frame = DataSetFrame::Delta(DeltaFrame {
        frame: DataFrame::new(WRITER, DataSetMessageType::DeltaFrame, FieldEncoding::Variant)
            .with_payload_header()
            .with_configuration_version(version),
        items: vec![DeltaItem { field_index: 3, value: DataPointValue::new(Variant::Float(2.0)) }],
    });

    let encoder = MessageEncoder::new(publisher());
    let mut decoder = MessageDecoder::default();
    decoder.parse(&encoder.encode_meta(&meta(version))?)?;
    let message = decoder
        .parse(&encoder.encode_data_set(&frame, Some(&wide))?)?
        .expect("header decodes");
    assert!(matches!(message.status, DecodeStatus::Malformed(_)));
    assert_eq!(
        message.as_data_set(),
        Some(&DataSetFrame::Unresolved(frame.data_frame().clone()))
    );
    Ok(())
}

#[test]
fn self_referencing_structure_is_malformed_not_fatal() -> anyhow::Result<()> {
    let version = ConfigurationVersion::new(1, 0);
    let node = NodeId::numeric(1, 9);
    let mut types = TypeDescriptions::default();
    types.add_structure(StructureDescription {
        data_type_id: node.clone(),
        name: "Node".to_string(),
        fields: vec![StructureField::new("next", node.clone())],
    });
    let looping = MetaFrame {
        publisher_id: publisher(),
        writer_id: WRITER,
        fields: vec![FieldMetaData::typed("head", BuiltInType::ExtensionObject, node)],
        types,
        configuration_version: version,
        ..MetaFrame::default()
    };
    // Eight zero bytes of body, laid out as a plain Int64 field
    let plain = MetaFrame {
        fields: vec![FieldMetaData::scalar("head", BuiltInType::Int64)],
        types: TypeDescriptions::default(),
        ..looping.clone()
    };
    let frame = DataSetFrame::Key(KeyFrame {
        frame: DataFrame::new(WRITER, DataSetMessageType::KeyFrame, FieldEncoding::RawData)
            .with_payload_header()
            .with_configuration_version(version),
        values: vec![DataPointValue::new(Variant::Int64(0))],
    });

    let encoder = MessageEncoder::new(publisher());
    let mut decoder = MessageDecoder::default();
    decoder.parse(&encoder.encode_meta(&looping)?)?;
    let message = decoder
        .parse(&encoder.encode_data_set(&frame, Some(&plain))?)?
        .expect("header decodes");
    let DecodeStatus::Malformed(reason) = &message.status else {
        panic!("expected malformed status: {:?}", message.status)
    };
    assert!(reason.contains("structure nesting"));
    assert_eq!(
        message.as_data_set(),
        Some(&DataSetFrame::Unresolved(frame.data_frame().clone()))
    );

    // The decoder keeps working afterwards
    decoder.parse(&encoder.encode_meta(&meta(ConfigurationVersion::new(2, 0)))?)?;
    let next = key_frame(ConfigurationVersion::new(2, 0), 1);
    let message = decoder
        .parse(&encoder.encode_data_set(&next, Some(&meta(ConfigurationVersion::new(2, 0))))?)?
        .expect("header decodes");
    assert_eq!(message.as_data_set(), Some(&next));
    Ok(())
}

#[test]
fn config_loads_from_a_yaml_file() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "schema_versions_per_writer: 3")?;
    writeln!(file, "chunk_completion: coverage")?;
    writeln!(file, "event_buffer: 64")?;

    let config = DecoderConfig::from_path(file.path())?;
    assert_eq!(config.schema_versions_per_writer, 3);
    assert_eq!(config.chunk_completion, ChunkCompletion::Coverage);
    assert_eq!(config.event_buffer, 64);
    assert!(config.clear_chunks_on_read);

    let decoder = MessageDecoder::new(config);
    assert_eq!(decoder.schemas().capacity(), 3);
    assert_eq!(decoder.chunks().completion(), ChunkCompletion::Coverage);
    Ok(())
}

#[test]
fn missing_config_file_names_the_path() {
    let error = DecoderConfig::from_path("/nonexistent/uadp.yaml").unwrap_err();
    assert!(matches!(error, UadpError::Config { .. }));
    assert!(error.to_string().contains("/nonexistent/uadp.yaml"));
}

#[tokio::test]
async fn connection_decodes_a_live_feed() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt::try_init();
    let (sender, source) = ChannelSource::new(32);
    let connection = UadpConnection::start(source, DecoderConfig::default())?;
    let mut events = connection.subscribe_topic("boiler/data");

    let version = ConfigurationVersion::new(1, 0);
    let encoder = MessageEncoder::new(publisher());
    sender.send("boiler/meta", encoder.encode_meta(&meta(version))?).await?;
    for sequence_number in 0..3 {
        let frame = key_frame(version, sequence_number);
        let bytes = encoder.encode_data_set(&frame, Some(&meta(version)))?;
        sender.send("boiler/data", bytes).await?;
    }
    let chunked = key_frame(version, 3);
    let parts = encoder.encode_chunked_data_set(&chunked, Some(&meta(version)), 3, 6)?;
    for part in parts {
        sender.send("boiler/data", part).await?;
    }
    drop(sender);

    let mut sequence_numbers = Vec::new();
    while let Some(event) = timeout(WAIT, events.next()).await? {
        if event.message.is_complete() {
            let frame = event.message.as_data_set().expect("data set body");
            sequence_numbers.push(frame.data_frame().sequence_number);
        }
    }
    assert_eq!(sequence_numbers, vec![Some(0), Some(1), Some(2), Some(3)]);
    assert_eq!(timeout(WAIT, connection.finished()).await?, DriverState::SourceEnded);

    let counters = connection.counters();
    assert_eq!(counters.failures, 0);
    assert_eq!(counters.schema_missing, 0);
    assert!(counters.chunks_pending > 0);
    Ok(())
}

#[tokio::test]
async fn replayed_capture_survives_garbage() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt::try_init();
    let version = ConfigurationVersion::new(1, 0);
    let encoder = MessageEncoder::new(publisher());
    let data = encoder.encode_data_set(&key_frame(version, 8), Some(&meta(version)))?;
    let capture = vec![
        RawMessage::new("cap", vec![0xFF, 0xFF, 0xFF]),
        RawMessage::new("cap", encoder.encode_meta(&meta(version))?),
        RawMessage::new("cap", vec![0x01]),
        RawMessage::new("cap", data),
    ];
    let source = ReplaySource::new(capture).with_interval(Duration::from_millis(1));
    let connection = UadpConnection::start(source, DecoderConfig::default())?;
    let events = connection.subscribe();

    assert_eq!(timeout(WAIT, connection.finished()).await?, DriverState::SourceEnded);
    let statuses: Vec<_> = events.map(|event| event.message.status.clone()).collect().await;
    // The unreadable header yields no event; the bare header is malformed
    assert_eq!(statuses.len(), 3);
    assert_eq!(statuses[0], DecodeStatus::Complete);
    assert!(matches!(statuses[1], DecodeStatus::Malformed(_)));
    assert_eq!(statuses[2], DecodeStatus::Complete);
    assert_eq!(connection.counters().failures, 2);
    Ok(())
}
