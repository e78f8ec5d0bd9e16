//! Growable little-endian byte writer

use super::NULL_LENGTH;
use crate::types::Guid;
use crate::{Result, UadpError};

/// Little-endian writer mirroring [`Reader`](super::Reader).
#[derive(Debug, Default, Clone)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.push(value as u8);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i16(&mut self, value: i16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_guid(&mut self, value: &Guid) {
        self.write_bytes(&value.0);
    }

    fn write_length(&mut self, length: usize, context: &str) -> Result<()> {
        let length = i32::try_from(length).map_err(|_| {
            UadpError::encode_error(context, format!("length {} exceeds i32 range", length))
        })?;
        self.write_i32(length);
        Ok(())
    }

    pub fn write_byte_string(&mut self, value: Option<&[u8]>) -> Result<()> {
        match value {
            Some(bytes) => {
                self.write_length(bytes.len(), "byte string")?;
                self.write_bytes(bytes);
            }
            None => self.write_i32(NULL_LENGTH),
        }
        Ok(())
    }

    pub fn write_string(&mut self, value: Option<&str>) -> Result<()> {
        self.write_byte_string(value.map(str::as_bytes))
    }

    /// Write a length-prefixed array, encoding each element with `write`.
    pub fn write_array<T>(
        &mut self,
        items: Option<&[T]>,
        mut write: impl FnMut(&mut Self, &T) -> Result<()>,
    ) -> Result<()> {
        let Some(items) = items else {
            self.write_i32(NULL_LENGTH);
            return Ok(());
        };
        self.write_length(items.len(), "array")?;
        for item in items {
            write(self, item)?;
        }
        Ok(())
    }
}
