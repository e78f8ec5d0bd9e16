//! Self-describing variant encoding

use super::{BuiltInCodec, CodecContext, ValueCodec};
use crate::codec::{Reader, Writer};
use crate::types::{BuiltInType, Variant};
use crate::{Result, UadpError};

const TYPE_MASK: u8 = 0x3F;
const ARRAY_DIMENSIONS: u8 = 0x40;
const ARRAY: u8 = 0x80;

/// Decode a variant: encoding mask, then a scalar or an i32-prefixed array.
///
/// Array dimensions, when flagged, are read and dropped; arrays are kept one
/// dimensional.
pub fn decode_variant(reader: &mut Reader<'_>, context: &CodecContext<'_>) -> Result<Variant> {
    let mask = reader.read_u8()?;
    let type_id = mask & TYPE_MASK;
    let built_in = BuiltInType::from_id(type_id)
        .ok_or_else(|| UadpError::unsupported_variant("variant type", type_id as u32))?;
    if built_in == BuiltInType::Null {
        return Ok(Variant::Empty);
    }

    let codec = BuiltInCodec::new(built_in);
    if mask & ARRAY == 0 {
        return codec.decode(reader, context);
    }

    let items = reader.read_array(|r| codec.decode(r, context))?.unwrap_or_default();
    if mask & ARRAY_DIMENSIONS != 0 {
        reader.read_array(|r| r.read_i32())?;
    }
    Ok(Variant::Array(built_in, items))
}

/// Encode a variant. Enumerations travel as Int32, structures and files as
/// extension objects.
pub fn encode_variant(
    value: &Variant,
    writer: &mut Writer,
    context: &CodecContext<'_>,
) -> Result<()> {
    match value {
        Variant::Empty => writer.write_u8(BuiltInType::Null.id()),
        Variant::Array(element, items) => {
            writer.write_u8(element.id() | ARRAY);
            let codec = BuiltInCodec::new(*element);
            writer.write_array(Some(items.as_slice()), |w, item| codec.encode(item, w, context))?;
        }
        scalar => {
            let built_in = scalar.built_in_type();
            writer.write_u8(built_in.id());
            BuiltInCodec::new(built_in).encode(scalar, writer, context)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::CodecRegistry;
    use crate::schema::TypeDescriptions;
    use crate::types::{EnumValue, NodeId};
    use proptest::prelude::*;

    fn arb_scalar() -> impl Strategy<Value = Variant> {
        prop_oneof![
            any::<bool>().prop_map(Variant::Boolean),
            any::<i8>().prop_map(Variant::SByte),
            any::<u16>().prop_map(Variant::UInt16),
            any::<i32>().prop_map(Variant::Int32),
            any::<u64>().prop_map(Variant::UInt64),
            any::<i64>().prop_map(Variant::DateTime),
            (-1.0e9f64..1.0e9).prop_map(Variant::Double),
            prop::option::of("[a-z ]{0,12}").prop_map(Variant::String),
            prop::option::of(prop::collection::vec(any::<u8>(), 0..8))
                .prop_map(Variant::ByteString),
            (any::<u16>(), any::<u32>())
                .prop_map(|(ns, id)| Variant::NodeId(NodeId::numeric(ns, id))),
        ]
    }

    fn round_trip(value: &Variant) -> Variant {
        let registry = CodecRegistry::new();
        let types = TypeDescriptions::default();
        let context = CodecContext::new(&registry, &types);
        let mut writer = Writer::new();
        encode_variant(value, &mut writer, &context).unwrap();
        let bytes = writer.into_inner();
        let mut reader = Reader::new(&bytes);
        let decoded = decode_variant(&mut reader, &context).unwrap();
        assert!(reader.is_empty());
        decoded
    }

    proptest! {
        #[test]
        fn prop_scalars_round_trip(value in arb_scalar()) {
            prop_assert_eq!(round_trip(&value), value);
        }

        #[test]
        fn prop_int_arrays_round_trip(items in prop::collection::vec(any::<i32>(), 0..16)) {
            let value = Variant::Array(
                BuiltInType::Int32,
                items.into_iter().map(Variant::Int32).collect(),
            );
            prop_assert_eq!(round_trip(&value), value);
        }
    }

    #[test]
    fn empty_variant_is_one_byte() {
        let registry = CodecRegistry::new();
        let types = TypeDescriptions::default();
        let context = CodecContext::new(&registry, &types);
        let mut writer = Writer::new();
        encode_variant(&Variant::Empty, &mut writer, &context).unwrap();
        assert_eq!(writer.as_slice(), &[0x00]);
    }

    #[test]
    fn enumeration_travels_as_int32() {
        let value = Variant::Enumeration(EnumValue { value: 3, name: Some("Running".into()) });
        assert_eq!(round_trip(&value), Variant::Int32(3));
    }

    #[test]
    fn array_dimensions_are_skipped() {
        let registry = CodecRegistry::new();
        let types = TypeDescriptions::default();
        let context = CodecContext::new(&registry, &types);
        // Byte array [1, 2] with dimensions [2]
        let bytes = [0xC3, 2, 0, 0, 0, 1, 2, 1, 0, 0, 0, 2, 0, 0, 0];
        let mut reader = Reader::new(&bytes);
        let value = decode_variant(&mut reader, &context).unwrap();
        let expected = Variant::Array(BuiltInType::Byte, vec![Variant::Byte(1), Variant::Byte(2)]);
        assert_eq!(value, expected);
        assert!(reader.is_empty());
    }

    #[test]
    fn unknown_type_id_is_unsupported() {
        let registry = CodecRegistry::new();
        let types = TypeDescriptions::default();
        let context = CodecContext::new(&registry, &types);
        let err = decode_variant(&mut Reader::new(&[0x10]), &context).unwrap_err();
        assert!(matches!(err, UadpError::UnsupportedVariant { code: 16, .. }));
    }
}
