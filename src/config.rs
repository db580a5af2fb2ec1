//! Codec configuration
//!
//! Loaded from a JSON file. Every field is optional:
//!
//! ```json
//! {
//!   "wire_version": "3.3.0",
//!   "compressor": "DEFLATE",
//!   "codec_name": "index-metadata",
//!   "min_codec_version": 1,
//!   "max_codec_version": 2,
//!   "context_mode": "API",
//!   "flat_settings": false,
//!   "binary": false
//! }
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::compress::{Compressor, CompressorRegistry, DEFAULT_COMPRESSOR};
use crate::document::{ContextMode, DocumentParams};
use crate::errors::{MetadataError, MetadataResult};
use crate::index::DocumentExtensions;
use crate::remote::{RemoteMetadataReader, INDEX_METADATA_CODEC, MAX_CODEC_VERSION, MIN_CODEC_VERSION};
use crate::version::WireVersion;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Peer version used for binary encoding
    #[serde(default)]
    pub wire_version: WireVersion,

    /// Registry name of the compressor for blob content
    #[serde(default = "default_compressor")]
    pub compressor: String,

    /// Codec name expected in remote frame headers
    #[serde(default = "default_codec_name")]
    pub codec_name: String,

    #[serde(default = "default_min_codec_version")]
    pub min_codec_version: i32,

    #[serde(default = "default_max_codec_version")]
    pub max_codec_version: i32,

    /// Document shape
    #[serde(default)]
    pub context_mode: ContextMode,

    #[serde(default)]
    pub flat_settings: bool,

    /// Emit mapping sources as base64 compressed bytes
    #[serde(default)]
    pub binary: bool,
}

fn default_compressor() -> String {
    DEFAULT_COMPRESSOR.to_string()
}
fn default_codec_name() -> String {
    INDEX_METADATA_CODEC.to_string()
}
fn default_min_codec_version() -> i32 {
    MIN_CODEC_VERSION
}
fn default_max_codec_version() -> i32 {
    MAX_CODEC_VERSION
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            wire_version: WireVersion::default(),
            compressor: default_compressor(),
            codec_name: default_codec_name(),
            min_codec_version: default_min_codec_version(),
            max_codec_version: default_max_codec_version(),
            context_mode: ContextMode::default(),
            flat_settings: false,
            binary: false,
        }
    }
}

impl CodecConfig {
    /// Load and validate configuration from a JSON file.
    pub fn load(path: &Path) -> MetadataResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MetadataError::configuration(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> MetadataResult<Self> {
        let config: CodecConfig = serde_json::from_str(content)
            .map_err(|e| MetadataError::configuration(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MetadataResult<()> {
        if !CompressorRegistry::global().contains(&self.compressor) {
            return Err(MetadataError::configuration(format!(
                "Unknown compressor: '{}'",
                self.compressor
            )));
        }

        if self.codec_name.is_empty() {
            return Err(MetadataError::configuration("codec_name must not be empty"));
        }

        if self.min_codec_version > self.max_codec_version {
            return Err(MetadataError::configuration(format!(
                "min_codec_version {} is greater than max_codec_version {}",
                self.min_codec_version, self.max_codec_version
            )));
        }

        Ok(())
    }

    pub fn compressor(&self) -> MetadataResult<Arc<dyn Compressor>> {
        CompressorRegistry::global().get(&self.compressor)
    }

    pub fn document_params(&self) -> DocumentParams {
        DocumentParams::with_mode(self.context_mode)
            .flat_settings(self.flat_settings)
            .binary(self.binary)
    }

    pub fn remote_reader(&self, extensions: DocumentExtensions) -> MetadataResult<RemoteMetadataReader> {
        Ok(RemoteMetadataReader::with_compressor(self.compressor()?)
            .codec(&self.codec_name, self.min_codec_version, self.max_codec_version)
            .extensions(extensions))
    }
}
