//! Read-only loader for remotely stored index metadata blobs

use std::borrow::Cow;
use std::io::Read;
use std::sync::Arc;

use tracing::{debug, info};

use crate::compress::Compressor;
use crate::errors::{MetadataError, MetadataResult};
use crate::index::{DocumentExtensions, IndexMetadata};

use super::checksum::ChecksumValidator;

/// Codec name written into the frame header of index metadata blobs.
pub const INDEX_METADATA_CODEC: &str = "index-metadata";
pub const MIN_CODEC_VERSION: i32 = 1;
pub const MAX_CODEC_VERSION: i32 = 2;

/// Turns a checksum-framed blob back into an [`IndexMetadata`] record.
///
/// The whole stream is buffered, the frame is validated, the content is
/// decompressed when a compressor is configured and recognises it, and the
/// result is decoded as a metadata document. There is no write path.
#[derive(Debug, Clone)]
pub struct RemoteMetadataReader {
    compressor: Option<Arc<dyn Compressor>>,
    extensions: DocumentExtensions,
    validator: ChecksumValidator,
    codec: String,
    min_version: i32,
    max_version: i32,
}

impl Default for RemoteMetadataReader {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteMetadataReader {
    /// Reader without decompression.
    pub fn new() -> Self {
        Self {
            compressor: None,
            extensions: DocumentExtensions::none(),
            validator: ChecksumValidator::new(),
            codec: INDEX_METADATA_CODEC.to_string(),
            min_version: MIN_CODEC_VERSION,
            max_version: MAX_CODEC_VERSION,
        }
    }

    pub fn with_compressor(compressor: Arc<dyn Compressor>) -> Self {
        Self {
            compressor: Some(compressor),
            ..Self::new()
        }
    }

    /// Hooks used to decode custom data and rollover entries.
    pub fn extensions(mut self, extensions: DocumentExtensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// Overrides the expected codec name and accepted version range.
    pub fn codec(mut self, name: impl Into<String>, min_version: i32, max_version: i32) -> Self {
        self.codec = name.into();
        self.min_version = min_version;
        self.max_version = max_version;
        self
    }

    pub fn codec_name(&self) -> &str {
        &self.codec
    }

    pub fn version_range(&self) -> (i32, i32) {
        (self.min_version, self.max_version)
    }

    pub fn deserialize<R: Read>(&self, mut source: R) -> MetadataResult<IndexMetadata> {
        let mut data = Vec::new();
        source
            .read_to_end(&mut data)
            .map_err(|e| MetadataError::io("failed to read remote metadata blob", e))?;
        debug!(len = data.len(), codec = %self.codec, "read remote metadata blob");
        self.deserialize_bytes(&data)
    }

    pub fn deserialize_bytes(&self, data: &[u8]) -> MetadataResult<IndexMetadata> {
        let content = self.content(data)?;
        let metadata = IndexMetadata::from_json_slice(&content, &self.extensions)?;
        info!(index = metadata.index(), version = metadata.version(), "decoded remote index metadata");
        Ok(metadata)
    }

    /// Validated, decompressed document bytes.
    pub fn content<'a>(&self, data: &'a [u8]) -> MetadataResult<Cow<'a, [u8]>> {
        let content = self
            .validator
            .validate_and_slice(data, &self.codec, self.min_version, self.max_version)?;

        match &self.compressor {
            Some(compressor) if compressor.is_compressed(content) => {
                debug!(compressor = compressor.name(), len = content.len(), "decompressing blob content");
                Ok(Cow::Owned(compressor.decompress(content)?))
            }
            _ => Ok(Cow::Borrowed(content)),
        }
    }
}
