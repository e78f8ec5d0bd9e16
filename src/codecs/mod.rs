//! Value codecs
//!
//! Field values are decoded through a codec looked up by the field's data
//! type id. Resolution order:
//!
//! 1. The well-known file data type ([`FILE_DATA_TYPE`]) uses [`FileCodec`]
//! 2. Codecs registered on the [`CodecRegistry`] for that data type
//! 3. Structure descriptions of the meta frame ([`StructureCodec`])
//! 4. Enumeration descriptions of the meta frame ([`EnumCodec`])
//! 5. Built-in types ([`BuiltInCodec`]), from a namespace-0 data type id or the
//!    field's declared built-in type
//!
//! Custom codecs implement [`ValueCodec`]:
//!
//! ```rust
//! use std::sync::Arc;
//! use uadp::codec::{Reader, Writer};
//! use uadp::codecs::{CodecContext, CodecRegistry, ValueCodec};
//! use uadp::types::{NodeId, Variant};
//!
//! struct Celsius;
//!
//! impl ValueCodec for Celsius {
//!     fn decode(&self, reader: &mut Reader<'_>, _: &CodecContext<'_>) -> uadp::Result<Variant> {
//!         Ok(Variant::Double(reader.read_i16()? as f64 / 10.0))
//!     }
//!
//!     fn encode(
//!         &self,
//!         value: &Variant,
//!         writer: &mut Writer,
//!         _: &CodecContext<'_>,
//!     ) -> uadp::Result<()> {
//!         let tenths = value.as_f64().unwrap_or_default() * 10.0;
//!         writer.write_i16(tenths.round() as i16);
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = CodecRegistry::new();
//! registry.register(NodeId::numeric(2, 5001), Arc::new(Celsius));
//! assert!(registry.contains(&NodeId::numeric(2, 5001)));
//! ```

mod builtin;
mod data_value;
mod file;
mod structure;
mod variant;

pub use builtin::BuiltInCodec;
pub use data_value::{DataValueMask, decode_data_value, encode_data_value};
pub use file::FileCodec;
pub use structure::{EnumCodec, StructureCodec};
pub use variant::{decode_variant, encode_variant};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::codec::{Reader, Writer};
use crate::schema::TypeDescriptions;
use crate::types::{BuiltInType, EnumValue, Identifier, NodeId, Variant};
use crate::{Result, UadpError};

/// Data type id of file payloads (`ns=0;i=11575`).
pub const FILE_DATA_TYPE: NodeId = NodeId::numeric(0, 11575);

/// Deepest chain of nested structure members and extension object bodies.
pub const MAX_NESTING: u8 = 32;

/// Decodes and encodes the body of one scalar value.
pub trait ValueCodec: Send + Sync {
    fn decode(&self, reader: &mut Reader<'_>, context: &CodecContext<'_>) -> Result<Variant>;

    fn encode(&self, value: &Variant, writer: &mut Writer, context: &CodecContext<'_>)
    -> Result<()>;
}

/// Custom codecs keyed by data type id.
#[derive(Clone, Default)]
pub struct CodecRegistry {
    custom: HashMap<NodeId, Arc<dyn ValueCodec>>,
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry").field("custom", &self.custom.keys()).finish()
    }
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a codec, replacing any previous one for the same data type.
    pub fn register(&mut self, data_type: NodeId, codec: Arc<dyn ValueCodec>) {
        self.custom.insert(data_type, codec);
    }

    pub fn contains(&self, data_type: &NodeId) -> bool {
        self.custom.contains_key(data_type)
    }

    pub fn get(&self, data_type: &NodeId) -> Option<&Arc<dyn ValueCodec>> {
        self.custom.get(data_type)
    }
}

/// Codec chosen for one data type.
pub enum CodecRef<'a> {
    File(FileCodec),
    Custom(&'a dyn ValueCodec),
    Structure(StructureCodec<'a>),
    Enumeration(EnumCodec<'a>),
    BuiltIn(BuiltInCodec),
}

impl CodecRef<'_> {
    pub fn as_codec(&self) -> &dyn ValueCodec {
        match self {
            CodecRef::File(codec) => codec,
            CodecRef::Custom(codec) => *codec,
            CodecRef::Structure(codec) => codec,
            CodecRef::Enumeration(codec) => codec,
            CodecRef::BuiltIn(codec) => codec,
        }
    }

    /// Built-in type the values travel as inside a variant.
    pub fn wire_type(&self) -> BuiltInType {
        match self {
            CodecRef::BuiltIn(codec) => codec.built_in_type(),
            CodecRef::Enumeration(_) => BuiltInType::Int32,
            CodecRef::File(_) | CodecRef::Custom(_) | CodecRef::Structure(_) => {
                BuiltInType::ExtensionObject
            }
        }
    }
}

/// Everything a codec needs to resolve nested types.
#[derive(Debug, Clone, Copy)]
pub struct CodecContext<'a> {
    pub registry: &'a CodecRegistry,
    pub types: &'a TypeDescriptions,
    depth: u8,
}

impl<'a> CodecContext<'a> {
    pub fn new(registry: &'a CodecRegistry, types: &'a TypeDescriptions) -> Self {
        Self { registry, types, depth: 0 }
    }

    /// Levels of nesting entered so far.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Context one level deeper, for decoding a value of `data_type`.
    ///
    /// Self-referencing structure descriptions would otherwise recurse without
    /// consuming input.
    pub fn nested(&self, data_type: &NodeId) -> Result<Self> {
        if self.depth >= MAX_NESTING {
            return Err(UadpError::parse_error(
                "structure nesting",
                format!("{} exceeds {} nested levels", data_type, MAX_NESTING),
            ));
        }
        Ok(Self { depth: self.depth + 1, ..*self })
    }

    /// Codec for an extension object body, `None` when the type is unknown.
    pub fn resolve_extension(&self, type_id: &NodeId) -> Option<CodecRef<'a>> {
        if *type_id == FILE_DATA_TYPE {
            return Some(CodecRef::File(FileCodec));
        }
        if let Some(codec) = self.registry.get(type_id) {
            return Some(CodecRef::Custom(codec.as_ref()));
        }
        self.types.structure(type_id).map(|d| CodecRef::Structure(StructureCodec::new(d)))
    }

    /// Codec for a field or structure member of the given data type.
    pub fn resolve(
        &self,
        data_type: &NodeId,
        built_in: Option<BuiltInType>,
    ) -> Result<CodecRef<'a>> {
        if let Some(codec) = self.resolve_extension(data_type) {
            return Ok(codec);
        }
        if let Some(description) = self.types.enumeration(data_type) {
            return Ok(CodecRef::Enumeration(EnumCodec::new(description)));
        }
        BuiltInType::from_node_id(data_type)
            .or(built_in)
            .filter(|ty| *ty != BuiltInType::Null)
            .map(|ty| CodecRef::BuiltIn(BuiltInCodec::new(ty)))
            .ok_or_else(|| {
                let code = match data_type.identifier {
                    Identifier::Numeric(id) => id,
                    _ => 0,
                };
                UadpError::unsupported_variant(format!("data type {}", data_type), code)
            })
    }

    /// Decode a scalar, or an i32-prefixed array when `value_rank >= 1`.
    pub fn decode_value(
        &self,
        reader: &mut Reader<'_>,
        data_type: &NodeId,
        built_in: Option<BuiltInType>,
        value_rank: i32,
    ) -> Result<Variant> {
        let context = self.nested(data_type)?;
        let codec = context.resolve(data_type, built_in)?;
        if value_rank >= 1 {
            let items =
                reader.read_array(|r| codec.as_codec().decode(r, &context))?.unwrap_or_default();
            Ok(Variant::Array(codec.wire_type(), items))
        } else {
            codec.as_codec().decode(reader, &context)
        }
    }

    pub fn encode_value(
        &self,
        value: &Variant,
        writer: &mut Writer,
        data_type: &NodeId,
        built_in: Option<BuiltInType>,
        value_rank: i32,
    ) -> Result<()> {
        let context = self.nested(data_type)?;
        let codec = context.resolve(data_type, built_in)?;
        if value_rank < 1 {
            return codec.as_codec().encode(value, writer, &context);
        }
        let Variant::Array(_, items) = value else {
            return Err(UadpError::encode_error(
                format!("field of type {}", data_type),
                "array field needs an array value",
            ));
        };
        writer.write_array(Some(items.as_slice()), |w, item| {
            codec.as_codec().encode(item, w, &context)
        })
    }

    /// Attach enumeration names to Int32 values of an enumerated data type.
    pub fn promote_enum(&self, data_type: &NodeId, value: Variant) -> Variant {
        let Some(description) = self.types.enumeration(data_type) else {
            return value;
        };
        let promote = |value: i32| {
            Variant::Enumeration(EnumValue {
                value,
                name: description.name_of(value as i64).map(str::to_string),
            })
        };
        match value {
            Variant::Int32(v) => promote(v),
            Variant::Array(BuiltInType::Int32, items) => Variant::Array(
                BuiltInType::Int32,
                items
                    .into_iter()
                    .map(|item| match item {
                        Variant::Int32(v) => promote(v),
                        other => other,
                    })
                    .collect(),
            ),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EnumDescription, EnumField, StructureDescription, StructureField};
    use crate::types::{FileValue, StructureValue};

    struct Tenths;

    impl ValueCodec for Tenths {
        fn decode(&self, reader: &mut Reader<'_>, _: &CodecContext<'_>) -> Result<Variant> {
            Ok(Variant::Double(reader.read_i16()? as f64 / 10.0))
        }

        fn encode(&self, value: &Variant, writer: &mut Writer, _: &CodecContext<'_>) -> Result<()> {
            writer.write_i16((value.as_f64().unwrap_or_default() * 10.0).round() as i16);
            Ok(())
        }
    }

    fn types() -> TypeDescriptions {
        let mut types = TypeDescriptions::default();
        types.add_structure(StructureDescription {
            data_type_id: NodeId::numeric(1, 3001),
            name: "Point".into(),
            fields: vec![
                StructureField::new("x", BuiltInType::Double.node_id()),
                StructureField::new("label", BuiltInType::String.node_id()).optional(),
            ],
        });
        types.add_enum(EnumDescription {
            data_type_id: NodeId::numeric(1, 4001),
            name: "Mode".into(),
            fields: vec![
                EnumField { value: 0, name: "Off".into() },
                EnumField { value: 1, name: "On".into() },
            ],
        });
        types
    }

    #[test]
    fn resolution_order() {
        let mut registry = CodecRegistry::new();
        registry.register(NodeId::numeric(1, 3001), Arc::new(Tenths));
        let types = types();
        let context = CodecContext::new(&registry, &types);

        assert!(matches!(context.resolve(&FILE_DATA_TYPE, None), Ok(CodecRef::File(_))));
        // Registered codecs take precedence over structure descriptions
        assert!(matches!(
            context.resolve(&NodeId::numeric(1, 3001), None),
            Ok(CodecRef::Custom(_))
        ));
        assert!(matches!(
            context.resolve(&NodeId::numeric(1, 4001), None),
            Ok(CodecRef::Enumeration(_))
        ));
        assert!(matches!(
            context.resolve(&NodeId::numeric(0, 11), None),
            Ok(CodecRef::BuiltIn(_))
        ));
        assert!(matches!(
            context.resolve(&NodeId::numeric(5, 1), Some(BuiltInType::UInt16)),
            Ok(CodecRef::BuiltIn(_))
        ));
        assert!(context.resolve(&NodeId::numeric(5, 1), None).is_err());
    }

    #[test]
    fn structure_with_absent_optional_member() -> anyhow::Result<()> {
        let registry = CodecRegistry::new();
        let types = types();
        let context = CodecContext::new(&registry, &types);
        let point_type = NodeId::numeric(1, 3001);
        let value = Variant::Structure(StructureValue {
            type_id: point_type.clone(),
            fields: vec![
                crate::types::NamedValue { name: "x".into(), value: Some(Variant::Double(1.5)) },
                crate::types::NamedValue { name: "label".into(), value: None },
            ],
        });

        let mut writer = Writer::new();
        context.encode_value(&value, &mut writer, &point_type, None, -1)?;
        let bytes = writer.into_inner();
        // optional mask (u32) + double
        assert_eq!(bytes.len(), 12);

        let decoded = context.decode_value(&mut Reader::new(&bytes), &point_type, None, -1)?;
        assert_eq!(decoded, value);
        Ok(())
    }

    #[test]
    fn enum_values_carry_names() -> anyhow::Result<()> {
        let registry = CodecRegistry::new();
        let types = types();
        let context = CodecContext::new(&registry, &types);
        let mode = NodeId::numeric(1, 4001);

        let decoded = context.decode_value(&mut Reader::new(&[1, 0, 0, 0]), &mode, None, -1)?;
        assert_eq!(decoded, Variant::Enumeration(EnumValue { value: 1, name: Some("On".into()) }));

        let promoted = context.promote_enum(&mode, Variant::Int32(0));
        let expected = Variant::Enumeration(EnumValue { value: 0, name: Some("Off".into()) });
        assert_eq!(promoted, expected);
        Ok(())
    }

    #[test]
    fn file_arrays_and_custom_codecs() -> anyhow::Result<()> {
        let mut registry = CodecRegistry::new();
        registry.register(NodeId::numeric(2, 7), Arc::new(Tenths));
        let types = TypeDescriptions::default();
        let context = CodecContext::new(&registry, &types);

        let files = Variant::Array(
            BuiltInType::ExtensionObject,
            vec![Variant::File(FileValue { name: "a.txt".into(), content: b"hi".to_vec() })],
        );
        let mut writer = Writer::new();
        context.encode_value(&files, &mut writer, &FILE_DATA_TYPE, None, 1)?;
        let bytes = writer.into_inner();
        let decoded = context.decode_value(&mut Reader::new(&bytes), &FILE_DATA_TYPE, None, 1)?;
        assert_eq!(decoded, files);

        let custom = NodeId::numeric(2, 7);
        let decoded = context.decode_value(&mut Reader::new(&[0xEB, 0x00]), &custom, None, -1)?;
        assert_eq!(decoded, Variant::Double(23.5));
        Ok(())
    }

    fn linked_list_types() -> TypeDescriptions {
        let mut types = TypeDescriptions::default();
        types.add_structure(StructureDescription {
            data_type_id: NodeId::numeric(1, 9),
            name: "Node".into(),
            fields: vec![StructureField::new("next", NodeId::numeric(1, 9))],
        });
        types
    }

    #[test]
    fn self_referencing_structure_stops_at_the_nesting_limit() {
        let registry = CodecRegistry::new();
        let types = linked_list_types();
        let context = CodecContext::new(&registry, &types);
        let node = NodeId::numeric(1, 9);

        let err = context.decode_value(&mut Reader::new(&[0; 8]), &node, None, -1).unwrap_err();
        assert!(matches!(err, UadpError::Parse { .. }));
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("structure nesting"));
    }

    #[test]
    fn nested_extension_objects_stop_at_the_nesting_limit() {
        let registry = CodecRegistry::new();
        let mut types = TypeDescriptions::default();
        let wrapper = NodeId::numeric(1, 10);
        types.add_structure(StructureDescription {
            data_type_id: wrapper.clone(),
            name: "Wrapper".into(),
            fields: vec![StructureField::new("inner", BuiltInType::ExtensionObject.node_id())],
        });
        let context = CodecContext::new(&registry, &types);

        // Each level is an extension object whose body is the next level
        let mut body: Vec<u8> = Vec::new();
        for _ in 0..40 {
            let mut writer = Writer::new();
            wrapper.encode(&mut writer).unwrap();
            writer.write_u8(1);
            writer.write_byte_string(Some(body.as_slice())).unwrap();
            body = writer.into_inner();
        }
        let err =
            context.decode_value(&mut Reader::new(&body), &wrapper, None, -1).unwrap_err();
        assert!(err.to_string().contains("structure nesting"));
    }

    #[test]
    fn nesting_depth_is_scoped_to_each_value() -> anyhow::Result<()> {
        let registry = CodecRegistry::new();
        let types = types();
        let context = CodecContext::new(&registry, &types);
        assert_eq!(context.depth(), 0);
        assert_eq!(context.nested(&NodeId::numeric(1, 3001))?.depth(), 1);

        let mut deepest = context;
        for _ in 0..MAX_NESTING {
            deepest = deepest.nested(&NodeId::numeric(1, 3001))?;
        }
        assert!(deepest.nested(&NodeId::numeric(1, 3001)).is_err());

        // Sibling values start from the caller's depth again
        let double = BuiltInType::Double.node_id();
        for _ in 0..(MAX_NESTING as usize + 4) {
            context.decode_value(&mut Reader::new(&[0; 8]), &double, None, -1)?;
        }
        Ok(())
    }

    #[test]
    fn scalar_for_array_field_fails_to_encode() {
        let registry = CodecRegistry::new();
        let types = TypeDescriptions::default();
        let context = CodecContext::new(&registry, &types);
        let data_type = BuiltInType::Int32.node_id();
        let err = context
            .encode_value(&Variant::Int32(1), &mut Writer::new(), &data_type, None, 1)
            .unwrap_err();
        assert!(matches!(err, UadpError::Encode { .. }));
    }
}
