//! Error types for UADP decoding and encoding.
//!
//! Every failure in the crate is a [`UadpError`]. Errors fall into three groups
//! that callers treat differently:
//!
//! - **Malformed input**: short reads, unknown enum codes, invalid UTF-8. The
//!   current message is abandoned, the pipeline keeps running.
//! - **Protocol inconsistency**: chunks of one sequence disagreeing on the total
//!   size, a configuration version with only one half present. These are fatal
//!   for the message and surface as explicit errors ([`UadpError::is_fatal`]).
//! - **Environment**: configuration files that cannot be read or parsed, and a
//!   message source that has closed.
//!
//! ```rust
//! use uadp::UadpError;
//!
//! let error = UadpError::insufficient_data("sequence number", 2, 1);
//! assert!(error.is_truncation());
//! assert!(!error.is_fatal());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::header::PublisherId;

/// Result type alias for UADP operations.
pub type Result<T, E = UadpError> = std::result::Result<T, E>;

/// Main error type for UADP operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum UadpError {
    #[error("Insufficient data for {context}: need {needed} bytes, {remaining} remaining")]
    InsufficientData { context: String, needed: usize, remaining: usize },

    #[error("Unsupported protocol version: expected {expected}, found {found}")]
    UnsupportedVersion { expected: u8, found: u8 },

    #[error("Unsupported {kind} code {code}")]
    UnsupportedVariant { kind: String, code: u32 },

    #[error(
        "Chunk total size mismatch for {publisher}/{writer_id}/{sequence_number}: stored {stored}, incoming {incoming}"
    )]
    ChunkSizeMismatch {
        publisher: PublisherId,
        writer_id: u16,
        sequence_number: u16,
        stored: u32,
        incoming: u32,
    },

    #[error("Chunk at offset {offset} with {length} bytes exceeds declared total size {total_size}")]
    ChunkOutOfBounds { offset: u32, length: usize, total_size: u32 },

    #[error(
        "Configuration version incomplete: major present={major_present}, minor present={minor_present}"
    )]
    IncompleteConfigurationVersion { major_present: bool, minor_present: bool },

    #[error("Field count mismatch: schema declares {expected}, message carries {found}")]
    FieldCountMismatch { expected: usize, found: usize },

    #[error("Field index {index} out of range for schema with {field_count} fields")]
    FieldIndexOutOfRange { index: u16, field_count: usize },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Encode error in {context}: {details}")]
    Encode { context: String, details: String },

    #[error("Configuration file error: {path}")]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration format error: {details}")]
    ConfigFormat { details: String },

    #[error("Message source closed")]
    SourceClosed,
}

impl UadpError {
    /// Returns whether this error is a protocol inconsistency that must be
    /// reported to the caller rather than folded into a best-effort result.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            UadpError::ChunkSizeMismatch { .. }
                | UadpError::ChunkOutOfBounds { .. }
                | UadpError::IncompleteConfigurationVersion { .. }
        )
    }

    /// Returns whether this error was caused by the input ending early.
    pub fn is_truncation(&self) -> bool {
        matches!(self, UadpError::InsufficientData { .. })
    }

    /// Returns whether retrying the surrounding operation can succeed.
    ///
    /// Nothing in the decode path retries on its own; this only classifies
    /// errors for callers that own retransmission.
    pub fn is_retryable(&self) -> bool {
        match self {
            UadpError::InsufficientData { .. } => true,
            UadpError::ChunkSizeMismatch { .. } => true,
            UadpError::SourceClosed => false,
            UadpError::UnsupportedVersion { .. } => false,
            UadpError::UnsupportedVariant { .. } => false,
            UadpError::ChunkOutOfBounds { .. } => false,
            UadpError::IncompleteConfigurationVersion { .. } => false,
            UadpError::FieldCountMismatch { .. } => false,
            UadpError::FieldIndexOutOfRange { .. } => false,
            UadpError::Parse { .. } => false,
            UadpError::Encode { .. } => false,
            UadpError::Config { .. } => false,
            UadpError::ConfigFormat { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            UadpError::InsufficientData { .. } => vec![
                "Check the transport delivers whole payloads",
                "Verify the publisher's flag bits match the fields it writes",
            ],
            UadpError::UnsupportedVersion { .. } => {
                vec!["Configure the publisher for UADP version 1", "Check the topic carries UADP"]
            }
            UadpError::UnsupportedVariant { .. } => vec![
                "Check the publisher configuration for reserved codes",
                "Disable unsupported features such as security on the writer group",
            ],
            UadpError::ChunkSizeMismatch { .. } => vec![
                "Request retransmission of the chunked message",
                "Check for sequence number reuse on the writer",
            ],
            UadpError::ChunkOutOfBounds { .. } => {
                vec!["Check the publisher's chunk offset calculation"]
            }
            UadpError::IncompleteConfigurationVersion { .. } => {
                vec!["Enable both major and minor version flags on the writer"]
            }
            UadpError::FieldCountMismatch { .. } | UadpError::FieldIndexOutOfRange { .. } => vec![
                "Request fresh metadata for the writer",
                "Check the configuration version in the data set message",
            ],
            UadpError::Parse { .. } => {
                vec!["Verify source data integrity", "Check data format compatibility"]
            }
            UadpError::Encode { .. } => vec![
                "Set the flag bits consistently with the populated fields",
                "Check values match the declared field types",
            ],
            UadpError::Config { .. } => {
                vec!["Check the configuration file exists and is readable"]
            }
            UadpError::ConfigFormat { .. } => {
                vec!["Check the configuration keys and value ranges"]
            }
            UadpError::SourceClosed => vec!["Reconnect the transport and restart the decoder"],
        }
    }

    /// Helper constructor for short reads.
    pub fn insufficient_data(context: impl Into<String>, needed: usize, remaining: usize) -> Self {
        UadpError::InsufficientData { context: context.into(), needed, remaining }
    }

    /// Helper constructor for unknown or unimplemented enum codes.
    pub fn unsupported_variant(kind: impl Into<String>, code: u32) -> Self {
        UadpError::UnsupportedVariant { kind: kind.into(), code }
    }

    /// Helper constructor for parse errors.
    pub fn parse_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        UadpError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for encode errors.
    pub fn encode_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        UadpError::Encode { context: context.into(), details: details.into() }
    }
}

impl From<serde_yaml_ng::Error> for UadpError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        UadpError::ConfigFormat { details: err.to_string() }
    }
}
