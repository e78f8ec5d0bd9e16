//! Per-field value layout by field encoding

use crate::codec::{Reader, Writer};
use crate::codecs::{
    CodecContext, decode_data_value, decode_variant, encode_data_value, encode_variant,
};
use crate::schema::FieldMetaData;
use crate::types::DataPointValue;
use crate::{Result, UadpError};

use super::FieldEncoding;

fn reserved() -> UadpError {
    UadpError::unsupported_variant("field encoding", FieldEncoding::Reserved.code() as u32)
}

/// Decode one field value laid out according to `field`.
pub(crate) fn decode_field(
    reader: &mut Reader<'_>,
    encoding: FieldEncoding,
    field: &FieldMetaData,
    context: &CodecContext<'_>,
) -> Result<DataPointValue> {
    match encoding {
        FieldEncoding::Variant => {
            let value = decode_variant(reader, context)?;
            Ok(DataPointValue::new(context.promote_enum(&field.data_type, value)))
        }
        FieldEncoding::RawData => {
            let value = context.decode_value(
                reader,
                &field.data_type,
                field.built_in(),
                field.value_rank,
            )?;
            Ok(DataPointValue::new(value))
        }
        FieldEncoding::DataValue => {
            let mut value = decode_data_value(reader, context)?;
            value.value = value.value.map(|v| context.promote_enum(&field.data_type, v));
            Ok(value)
        }
        FieldEncoding::Reserved => Err(reserved()),
    }
}

/// Encode one field value. Variant and raw encodings carry only the value.
pub(crate) fn encode_field(
    value: &DataPointValue,
    writer: &mut Writer,
    encoding: FieldEncoding,
    field: &FieldMetaData,
    context: &CodecContext<'_>,
) -> Result<()> {
    let required = || {
        value.value.as_ref().ok_or_else(|| {
            UadpError::encode_error(format!("field {}", field.name), "value is absent")
        })
    };
    match encoding {
        FieldEncoding::Variant => encode_variant(required()?, writer, context),
        FieldEncoding::RawData => context.encode_value(
            required()?,
            writer,
            &field.data_type,
            field.built_in(),
            field.value_rank,
        ),
        FieldEncoding::DataValue => encode_data_value(value, writer, context),
        FieldEncoding::Reserved => Err(reserved()),
    }
}
