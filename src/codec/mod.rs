//! Primitive little-endian codec over byte buffers.
//!
//! [`Reader`] is a forward-only cursor: every read either yields a value or an
//! [`UadpError::InsufficientData`](crate::UadpError::InsufficientData) that the
//! caller treats as "abandon this message". [`Writer`] produces the identical
//! layout, so anything written can be read back field for field.
//!
//! Length-prefixed values (strings, byte strings, arrays) use a signed 32-bit
//! count. A negative count encodes a null value and decodes to `None`.

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

/// Length prefix value used for null strings, byte strings and arrays.
pub const NULL_LENGTH: i32 = -1;

/// Unwrap a field whose presence bit is set, failing the encode when it is missing.
///
/// Encoders never infer flags from data: a set bit with no value is a caller bug.
pub(crate) fn require_flagged<T>(value: Option<T>, context: &str, field: &str) -> crate::Result<T> {
    value.ok_or_else(|| {
        crate::UadpError::encode_error(context, format!("{} flagged but missing", field))
    })
}
