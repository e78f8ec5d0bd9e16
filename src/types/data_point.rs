//! Field value with optional quality and timing information

use serde::{Deserialize, Serialize};

use super::Variant;

/// One field value of a data set message.
///
/// With variant and raw field encoding only `value` is carried; the data-value
/// field encoding adds status and timestamps, each present independently.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataPointValue {
    pub value: Option<Variant>,
    pub status: Option<u32>,
    pub source_timestamp: Option<i64>,
    pub source_picoseconds: Option<u16>,
    pub server_timestamp: Option<i64>,
    pub server_picoseconds: Option<u16>,
}

impl DataPointValue {
    pub fn new(value: Variant) -> Self {
        Self { value: Some(value), ..Self::default() }
    }

    pub fn with_status(mut self, status: u32) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_source_timestamp(mut self, timestamp: i64) -> Self {
        self.source_timestamp = Some(timestamp);
        self
    }

    /// Good status codes have both severity bits clear; absence counts as good.
    pub fn is_good(&self) -> bool {
        self.status.is_none_or(|code| code & 0xC000_0000 == 0)
    }
}
