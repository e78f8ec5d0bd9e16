//! 128-bit identifier

use serde::{Deserialize, Serialize};
use std::fmt;

/// 16-byte GUID kept in wire order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn is_nil(&self) -> bool {
        self.0 == [0u8; 16]
    }
}

impl fmt::Display for Guid {
    /// Formats the standard mixed-endian textual form
    /// (`data1-data2-data3-data4[0..2]-data4[2..8]`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        let data1 = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
        let data2 = u16::from_le_bytes([b[4], b[5]]);
        let data3 = u16::from_le_bytes([b[6], b[7]]);
        write!(f, "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-", data1, data2, data3, b[8], b[9])?;
        for byte in &b[10..] {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}
