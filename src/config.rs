//! Decoder configuration.
//!
//! Every field has a default, so an empty YAML document is a valid
//! configuration:
//!
//! ```yaml
//! schema_versions_per_writer: 10
//! clear_chunks_on_read: true
//! chunk_completion: coverage
//! event_buffer: 1024
//! max_consecutive_source_errors: 10
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::chunk::ChunkCompletion;
use crate::schema::DEFAULT_VERSIONS_PER_WRITER;
use crate::{Result, UadpError};

/// Settings for [`MessageDecoder`](crate::decoder::MessageDecoder) and the
/// consumer loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct DecoderConfig {
    /// Schema versions kept per publisher and writer
    pub schema_versions_per_writer: usize,
    /// Drop a chunk group once its payload has been reassembled
    pub clear_chunks_on_read: bool,
    pub chunk_completion: ChunkCompletion,
    /// Capacity of the decoded event channel
    pub event_buffer: usize,
    /// Source errors in a row before the consumer loop gives up
    pub max_consecutive_source_errors: u32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            schema_versions_per_writer: DEFAULT_VERSIONS_PER_WRITER,
            clear_chunks_on_read: true,
            chunk_completion: ChunkCompletion::ByteCount,
            event_buffer: 1024,
            max_consecutive_source_errors: 10,
        }
    }
}

impl DecoderConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|source| UadpError::Config { path: path.to_path_buf(), source })?;
        let config = Self::from_yaml_str(&yaml)?;
        debug!(path = %path.display(), ?config, "Loaded decoder configuration");
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Reject capacities that would make the decoder unusable.
    pub fn validate(&self) -> Result<()> {
        if self.schema_versions_per_writer == 0 {
            return Err(UadpError::ConfigFormat {
                details: "schema_versions_per_writer must be at least 1".to_string(),
            });
        }
        if self.event_buffer == 0 {
            return Err(UadpError::ConfigFormat {
                details: "event_buffer must be at least 1".to_string(),
            });
        }
        if self.max_consecutive_source_errors == 0 {
            return Err(UadpError::ConfigFormat {
                details: "max_consecutive_source_errors must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(DecoderConfig::from_yaml_str("").unwrap(), DecoderConfig::default());
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = DecoderConfig::from_yaml_str("chunk_completion: coverage\n").unwrap();
        assert_eq!(config.chunk_completion, ChunkCompletion::Coverage);
        assert_eq!(config.schema_versions_per_writer, 10);
        assert!(config.clear_chunks_on_read);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = DecoderConfig::from_yaml_str("event_buffer: 0\n").unwrap_err();
        assert!(matches!(err, UadpError::ConfigFormat { .. }));
        let err = DecoderConfig::from_yaml_str("schema_versions_per_writer: 0\n").unwrap_err();
        assert!(matches!(err, UadpError::ConfigFormat { .. }));
    }

    #[test]
    fn unknown_completion_mode_is_a_format_error() {
        let err = DecoderConfig::from_yaml_str("chunk_completion: eventually\n").unwrap_err();
        assert!(matches!(err, UadpError::ConfigFormat { .. }));
    }

    #[test]
    fn yaml_round_trip() {
        let config = DecoderConfig {
            schema_versions_per_writer: 3,
            chunk_completion: ChunkCompletion::Coverage,
            ..DecoderConfig::default()
        };
        let yaml = config.to_yaml_string().unwrap();
        assert_eq!(DecoderConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn loads_from_file() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "clear_chunks_on_read: false")?;
        writeln!(file, "max_consecutive_source_errors: 3")?;
        let config = DecoderConfig::from_path(file.path())?;
        assert!(!config.clear_chunks_on_read);
        assert_eq!(config.max_consecutive_source_errors, 3);
        Ok(())
    }

    #[test]
    fn missing_file_reports_path() {
        let err = DecoderConfig::from_path("/nonexistent/uadp.yaml").unwrap_err();
        assert!(matches!(err, UadpError::Config { .. }));
        assert!(err.to_string().contains("uadp.yaml"));
    }
}
