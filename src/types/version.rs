//! Schema configuration version

use serde::{Deserialize, Serialize};
use std::fmt;

/// `{major, minor}` pair identifying one schema revision of a writer.
///
/// Ordering compares `major` first, then `minor`; the schema cache evicts the
/// smallest version under this ordering.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct ConfigurationVersion {
    pub major: u32,
    pub minor: u32,
}

impl ConfigurationVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for ConfigurationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
