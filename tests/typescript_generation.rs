//! TypeScript Generation Tests
//!
//! Validates that the public configuration and status types can be exported
//! to TypeScript when the tauri feature is enabled.

#[cfg(feature = "tauri")]
#[test]
fn test_core_types_implement_specta_type() {
    use specta::Type;

    fn assert_type<T: Type>() {}

    // Configuration and lifecycle
    assert_type::<uadp::DecoderConfig>();
    assert_type::<uadp::ChunkCompletion>();
    assert_type::<uadp::DriverState>();
    assert_type::<uadp::decoder::CounterSnapshot>();

    // Wire enums
    assert_type::<uadp::types::BuiltInType>();
    assert_type::<uadp::types::ConfigurationVersion>();
    assert_type::<uadp::frame::FieldEncoding>();
    assert_type::<uadp::frame::DataSetMessageType>();
    assert_type::<uadp::header::PublisherIdType>();
    assert_type::<uadp::header::NetworkMessageType>();
}

#[cfg(not(feature = "tauri"))]
#[test]
fn test_tauri_feature_disabled() {
    // Types still compile without specta::Type
    let _ = uadp::ChunkCompletion::ByteCount;
}
