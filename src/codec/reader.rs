//! Forward-only byte cursor

use crate::types::Guid;
use crate::{Result, UadpError};

/// Upper bound on memory reserved before an array's elements are decoded.
const MAX_PREALLOCATION_BYTES: usize = 64 * 1024;

/// Forward-only little-endian reader over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take `len` bytes, failing without consuming anything on a short read.
    pub fn take(&mut self, len: usize, context: &str) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(UadpError::insufficient_data(context, len, remaining));
        }
        let start = self.position;
        self.position += len;
        Ok(&self.data[start..start + len])
    }

    /// Consume and return everything left.
    pub fn rest(&mut self) -> &'a [u8] {
        let start = self.position;
        self.position = self.data.len();
        &self.data[start..]
    }

    fn take_array<const N: usize>(&mut self, context: &str) -> Result<[u8; N]> {
        let bytes = self.take(N, context)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take_array::<1>("u8")?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take_array("u16")?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.take_array("i16")?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take_array("u32")?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take_array("i32")?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take_array("u64")?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take_array("i64")?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take_array("f32")?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take_array("f64")?))
    }

    pub fn read_guid(&mut self) -> Result<Guid> {
        Ok(Guid(self.take_array("guid")?))
    }

    /// Read a signed 32-bit length prefix; negative values mean null.
    fn read_length(&mut self, context: &str) -> Result<Option<usize>> {
        let length = self.read_i32()?;
        if length < 0 {
            return Ok(None);
        }
        let length = length as usize;
        if length > self.remaining() {
            return Err(UadpError::insufficient_data(context, length, self.remaining()));
        }
        Ok(Some(length))
    }

    pub fn read_byte_string(&mut self) -> Result<Option<Vec<u8>>> {
        match self.read_length("byte string")? {
            Some(length) => Ok(Some(self.take(length, "byte string")?.to_vec())),
            None => Ok(None),
        }
    }

    pub fn read_string(&mut self) -> Result<Option<String>> {
        let Some(length) = self.read_length("string")? else {
            return Ok(None);
        };
        let bytes = self.take(length, "string")?;
        String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|e| UadpError::parse_error("string", format!("invalid UTF-8: {}", e)))
    }

    /// Read a length-prefixed array, decoding each element with `read`.
    ///
    /// Every element occupies at least one byte, so a count larger than the
    /// remaining input is rejected before anything is allocated. The up-front
    /// reservation is bounded; the vector grows as elements decode.
    pub fn read_array<T>(
        &mut self,
        mut read: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Option<Vec<T>>> {
        let Some(count) = self.read_length("array")? else {
            return Ok(None);
        };
        let mut items = Vec::with_capacity(preallocation::<T>(count));
        for _ in 0..count {
            items.push(read(self)?);
        }
        Ok(Some(items))
    }
}

/// Elements to reserve for an array of `count` elements of `T`.
pub(crate) fn preallocation<T>(count: usize) -> usize {
    count.min(MAX_PREALLOCATION_BYTES / size_of::<T>().max(1))
}
