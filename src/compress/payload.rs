//! Immutable compressed payload with a checksum of its uncompressed content

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::errors::{MetadataError, MetadataResult};
use crate::stream::{StreamInput, StreamOutput};

use super::{Compressor, CompressorRegistry};

/// Compressed bytes plus the CRC-32 of the uncompressed bytes.
///
/// The checksum always describes the uncompressed content, including when
/// the payload was built from bytes that were already compressed.
#[derive(Clone)]
pub struct CompressedPayload {
    bytes: Arc<[u8]>,
    checksum: i32,
}

fn crc32(data: &[u8]) -> i32 {
    crc32fast::hash(data) as i32
}

impl CompressedPayload {
    /// Wraps bytes read from the wire as-is.
    pub fn from_parts(compressed: Vec<u8>, checksum: i32) -> Self {
        Self {
            bytes: compressed.into(),
            checksum,
        }
    }

    /// Compresses `raw` with the default compressor.
    pub fn compress(raw: &[u8]) -> MetadataResult<Self> {
        Self::compress_with(raw, CompressorRegistry::global().default_compressor().as_ref())
    }

    pub fn compress_with(raw: &[u8], compressor: &dyn Compressor) -> MetadataResult<Self> {
        let compressed = compressor.compress(raw)?;
        Ok(Self {
            bytes: compressed.into(),
            checksum: crc32(raw),
        })
    }

    /// Keeps already-compressed input verbatim and compresses anything else.
    pub fn from_auto_detected(bytes: &[u8]) -> MetadataResult<Self> {
        Self::from_auto_detected_in(bytes, &CompressorRegistry::global())
    }

    /// Like [`from_auto_detected`](Self::from_auto_detected), recognising the
    /// codecs of `registry` and compressing with its default.
    pub fn from_auto_detected_in(bytes: &[u8], registry: &CompressorRegistry) -> MetadataResult<Self> {
        match registry.detect(bytes) {
            Some(compressor) => {
                trace!(codec = compressor.name(), len = bytes.len(), "payload already compressed");
                let raw = compressor.decompress(bytes)?;
                Ok(Self {
                    bytes: bytes.into(),
                    checksum: crc32(&raw),
                })
            }
            None => Self::compress_with(bytes, registry.default_compressor().as_ref()),
        }
    }

    /// Serializes `value` as JSON and compresses it.
    pub fn from_json(value: &Value) -> MetadataResult<Self> {
        Self::compress(&serde_json::to_vec(value)?)
    }

    pub fn compressed_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn checksum(&self) -> i32 {
        self.checksum
    }

    /// Decompresses with whichever globally registered codec matches the
    /// header.
    pub fn decompress(&self) -> MetadataResult<Vec<u8>> {
        self.decompress_in(&CompressorRegistry::global())
    }

    /// Decompresses with whichever codec of `registry` matches the header.
    pub fn decompress_in(&self, registry: &CompressorRegistry) -> MetadataResult<Vec<u8>> {
        let compressor = registry
            .detect(&self.bytes)
            .ok_or_else(|| MetadataError::decode("compressed payload has no recognized compression header"))?;
        compressor.decompress(&self.bytes)
    }

    pub fn decompress_with(&self, compressor: &dyn Compressor) -> MetadataResult<Vec<u8>> {
        compressor.decompress(&self.bytes)
    }

    /// Uncompressed content as UTF-8 text.
    pub fn uncompressed_string(&self) -> MetadataResult<String> {
        String::from_utf8(self.decompress()?)
            .map_err(|e| MetadataError::decode(format!("payload is not valid UTF-8: {}", e)))
    }

    /// Uncompressed content parsed as a JSON document.
    pub fn to_json(&self) -> MetadataResult<Value> {
        Ok(serde_json::from_slice(&self.decompress()?)?)
    }

    pub fn write_to(&self, out: &mut StreamOutput) {
        out.write_int(self.checksum);
        out.write_byte_array(&self.bytes);
    }

    pub fn read_from(input: &mut StreamInput<'_>) -> MetadataResult<Self> {
        let checksum = input.read_int()?;
        let bytes = input.read_byte_array()?;
        Ok(Self::from_parts(bytes, checksum))
    }
}

impl PartialEq for CompressedPayload {
    fn eq(&self, other: &Self) -> bool {
        if self.checksum != other.checksum {
            return false;
        }
        if self.bytes == other.bytes {
            return true;
        }
        // same content may come out of different codecs or levels
        let registry = CompressorRegistry::global();
        match (self.decompress_in(&registry), other.decompress_in(&registry)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CompressedPayload {}

impl Hash for CompressedPayload {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.checksum.hash(state);
    }
}

impl fmt::Debug for CompressedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressedPayload")
            .field("checksum", &self.checksum)
            .field("compressed_len", &self.bytes.len())
            .finish()
    }
}

impl fmt::Display for CompressedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decompress() {
            Ok(raw) => write!(f, "{}", String::from_utf8_lossy(&raw)),
            Err(_) => write!(f, "<{} compressed bytes>", self.bytes.len()),
        }
    }
}
