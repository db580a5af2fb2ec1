//! Metadata error types
//!
//! Error codes:
//! - IDX_META_DECODE (ERROR severity)
//! - IDX_META_CORRUPTION (FATAL severity)
//! - IDX_META_CONFIGURATION (ERROR severity)
//! - IDX_META_UNKNOWN_FIELD (ERROR severity)
//! - IDX_META_IO (ERROR severity)
//!
//! No failure in this crate is retried. Every error is a deterministic
//! function of the input bytes and the caller's configuration.

use std::fmt;
use std::io;

use thiserror::Error;

/// Severity levels for metadata errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, caller decides what to do next
    Error,
    /// The blob or stream is unusable and must be discarded
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Stable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed binary or document structure
    Decode,
    /// Checksum, codec or frame version validation failure
    Corruption,
    /// Caller omitted something the input requires
    Configuration,
    /// Strict document decode met an unrecognized key
    UnknownField,
    /// Underlying stream failure
    Io,
}

impl ErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::Decode => "IDX_META_DECODE",
            ErrorCode::Corruption => "IDX_META_CORRUPTION",
            ErrorCode::Configuration => "IDX_META_CONFIGURATION",
            ErrorCode::UnknownField => "IDX_META_UNKNOWN_FIELD",
            ErrorCode::Io => "IDX_META_IO",
        }
    }

    /// Returns the severity level for this code
    pub fn severity(&self) -> Severity {
        match self {
            ErrorCode::Corruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Malformed binary or document input
    #[error("[ERROR] IDX_META_DECODE: {0}")]
    Decode(String),

    /// Frame or stream integrity failure
    #[error("[FATAL] IDX_META_CORRUPTION: {message}")]
    CorruptMetadata {
        message: String,
        #[source]
        source: Option<Box<MetadataError>>,
    },

    /// Missing decoder, unknown compressor, invalid settings
    #[error("[ERROR] IDX_META_CONFIGURATION: {0}")]
    Configuration(String),

    /// Unrecognized top-level document key
    #[error("[ERROR] IDX_META_UNKNOWN_FIELD: unexpected field [{0}]")]
    UnknownField(String),

    /// Stream read failure
    #[error("[ERROR] IDX_META_IO: {message}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
    },
}

impl MetadataError {
    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        MetadataError::Decode(message.into())
    }

    /// Create a corruption error
    pub fn corrupt(message: impl Into<String>) -> Self {
        MetadataError::CorruptMetadata {
            message: message.into(),
            source: None,
        }
    }

    /// Create a corruption error wrapping the lower-level cause
    pub fn corrupt_caused_by(message: impl Into<String>, cause: MetadataError) -> Self {
        MetadataError::CorruptMetadata {
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        MetadataError::Configuration(message.into())
    }

    /// Create an unknown-field error
    pub fn unknown_field(field: impl Into<String>) -> Self {
        MetadataError::UnknownField(field.into())
    }

    /// Create an I/O error
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        MetadataError::Io {
            message: message.into(),
            source,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            MetadataError::Decode(_) => ErrorCode::Decode,
            MetadataError::CorruptMetadata { .. } => ErrorCode::Corruption,
            MetadataError::Configuration(_) => ErrorCode::Configuration,
            MetadataError::UnknownField(_) => ErrorCode::UnknownField,
            MetadataError::Io { .. } => ErrorCode::Io,
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code().severity()
    }

    /// Returns whether the input must be discarded
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl From<serde_json::Error> for MetadataError {
    fn from(err: serde_json::Error) -> Self {
        MetadataError::decode(format!("malformed document: {}", err))
    }
}

/// Result type for metadata operations
pub type MetadataResult<T> = Result<T, MetadataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(ErrorCode::Decode.code(), "IDX_META_DECODE");
        assert_eq!(ErrorCode::Corruption.code(), "IDX_META_CORRUPTION");
        assert_eq!(ErrorCode::Configuration.code(), "IDX_META_CONFIGURATION");
        assert_eq!(ErrorCode::UnknownField.code(), "IDX_META_UNKNOWN_FIELD");
        assert_eq!(ErrorCode::Io.code(), "IDX_META_IO");
    }

    #[test]
    fn test_only_corruption_is_fatal() {
        assert!(MetadataError::corrupt("bad footer").is_fatal());
        assert!(!MetadataError::decode("bad token").is_fatal());
        assert!(!MetadataError::configuration("no reader").is_fatal());
        assert!(!MetadataError::unknown_field("bogus").is_fatal());
    }

    #[test]
    fn test_display_contains_code_and_message() {
        let err = MetadataError::corrupt("checksum mismatch");
        let display = err.to_string();
        assert!(display.contains("FATAL"));
        assert!(display.contains("IDX_META_CORRUPTION"));
        assert!(display.contains("checksum mismatch"));

        let err = MetadataError::unknown_field("bogus");
        assert!(err.to_string().contains("[bogus]"));
    }

    #[test]
    fn test_corruption_keeps_cause() {
        use std::error::Error;

        let err = MetadataError::corrupt_caused_by(
            "validation failed",
            MetadataError::decode("truncated header"),
        );
        let cause = err.source().expect("cause must be kept");
        assert!(cause.to_string().contains("truncated header"));
    }
}
