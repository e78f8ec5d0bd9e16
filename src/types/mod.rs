//! Core value types shared by the codec layers.
//!
//! - [`BuiltInType`] enumerates the wire ids of scalar types
//! - [`NodeId`] identifies data types, including structure and enum types
//! - [`Variant`] holds one decoded value of any type
//! - [`DataPointValue`] wraps a value with optional status and timestamps
//! - [`ConfigurationVersion`] keys schema revisions
//!
//! ```rust
//! use uadp::types::{BuiltInType, NodeId, Variant};
//!
//! let value = Variant::Double(21.5);
//! assert_eq!(value.built_in_type(), BuiltInType::Double);
//! assert_eq!(BuiltInType::from_node_id(&NodeId::numeric(0, 11)), Some(BuiltInType::Double));
//! ```

mod built_in;
mod data_point;
mod guid;
mod node_id;
mod variant;
mod version;

pub use built_in::BuiltInType;
pub use data_point::DataPointValue;
pub use guid::Guid;
pub use node_id::{Identifier, NodeId};
pub use variant::{EnumValue, ExtensionObject, FileValue, NamedValue, StructureValue, Variant};
pub use version::ConfigurationVersion;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Reader, Writer};
    use proptest::prelude::*;

    fn arb_node_id() -> impl Strategy<Value = NodeId> {
        prop_oneof![
            (any::<u16>(), any::<u32>()).prop_map(|(ns, id)| NodeId::numeric(ns, id)),
            (any::<u16>(), "[a-zA-Z0-9.]{0,12}").prop_map(|(ns, s)| NodeId::string(ns, s)),
            (any::<u16>(), any::<[u8; 16]>()).prop_map(|(ns, g)| NodeId {
                namespace: ns,
                identifier: Identifier::Guid(Guid(g))
            }),
        ]
    }

    proptest! {
        #[test]
        fn prop_node_id_compact_forms_decode_back(node_id in arb_node_id()) {
            let mut writer = Writer::new();
            node_id.encode(&mut writer).unwrap();
            let bytes = writer.into_inner();
            let mut reader = Reader::new(&bytes);
            prop_assert_eq!(NodeId::decode(&mut reader).unwrap(), node_id);
            prop_assert!(reader.is_empty());
        }

        #[test]
        fn prop_configuration_version_orders_major_first(
            a in any::<(u32, u32)>(),
            b in any::<(u32, u32)>(),
        ) {
            let va = ConfigurationVersion::new(a.0, a.1);
            let vb = ConfigurationVersion::new(b.0, b.1);
            prop_assert_eq!(va.cmp(&vb), a.cmp(&b));
        }
    }

    #[test]
    fn node_id_picks_smallest_encoding() {
        let cases = [
            (NodeId::numeric(0, 11), 2usize),
            (NodeId::numeric(2, 1000), 4),
            (NodeId::numeric(300, 70_000), 7),
        ];
        for (node_id, expected_len) in cases {
            let mut writer = Writer::new();
            node_id.encode(&mut writer).unwrap();
            assert_eq!(writer.len(), expected_len, "{node_id}");
        }
    }

    #[test]
    fn built_in_ids_are_stable() {
        for id in 0u8..=30 {
            if let Some(ty) = BuiltInType::from_id(id) {
                assert_eq!(ty.id(), id);
                assert_eq!(BuiltInType::from_node_id(&ty.node_id()), Some(ty));
            }
        }
        assert_eq!(BuiltInType::from_id(16), None);
        assert_eq!(BuiltInType::Double.fixed_size(), Some(8));
        assert_eq!(BuiltInType::String.fixed_size(), None);
    }

    #[test]
    fn guid_display_uses_mixed_endian_form() {
        let guid = Guid([
            0x78, 0x56, 0x34, 0x12, 0xbc, 0x9a, 0xf0, 0xde, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06,
            0x07, 0x08,
        ]);
        assert_eq!(guid.to_string(), "12345678-9abc-def0-0102-030405060708");
    }

    #[test]
    fn data_point_quality_defaults_to_good() {
        let value = DataPointValue::new(Variant::Int32(4));
        assert!(value.is_good());
        assert!(!value.clone().with_status(0x8000_0000).is_good());
    }
}
