//! CLI-specific error types
//!
//! All CLI errors end the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::errors::MetadataError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (blob file, stdout)
    IoError,
    /// Blob failed validation or decoding
    MetadataError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "IDXMETA_CLI_CONFIG_ERROR",
            Self::IoError => "IDXMETA_CLI_IO_ERROR",
            Self::MetadataError => "IDXMETA_CLI_METADATA_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<MetadataError> for CliError {
    fn from(e: MetadataError) -> Self {
        match e {
            MetadataError::Configuration(_) => Self::config_error(e.to_string()),
            MetadataError::Io { .. } => Self::io_error(e.to_string()),
            other => Self::new(CliErrorCode::MetadataError, other.to_string()),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_error_mapping() {
        let err: CliError = MetadataError::configuration("bad").into();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);

        let err: CliError = MetadataError::corrupt("flipped").into();
        assert_eq!(err.code_str(), "IDXMETA_CLI_METADATA_ERROR");
        assert!(err.message().contains("flipped"));
    }
}
