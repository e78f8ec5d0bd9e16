//! Schema model and cache.
//!
//! A writer's schema is its [`MetaFrame`](crate::frame::MetaFrame): the ordered
//! [`FieldMetaData`] list plus the structure and enumeration descriptions
//! ([`TypeDescriptions`]) its field types refer to. Key and delta frames can
//! only be decoded once the matching schema version is in the
//! [`LocalSchemaCache`].
//!
//! # Cache semantics
//!
//! - Keyed by publisher, writer id and configuration version
//! - First write wins; re-storing a known version is a no-op
//! - At most `capacity` versions per writer (10 by default); the smallest
//!   version is evicted to make room

mod cache;
mod description;
mod field;

pub use cache::{DEFAULT_VERSIONS_PER_WRITER, LocalSchemaCache, SchemaKey};
pub use description::{
    EnumDescription, EnumField, StructureDescription, StructureField, TypeDescriptions,
};
pub use field::{FieldMetaData, KeyValue};
