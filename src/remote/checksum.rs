//! Checksum frame validation
//!
//! Blobs are framed as:
//!
//! ```text
//! header:  int CODEC_MAGIC | vint length + UTF-8 codec name | int version
//! content
//! footer:  int FOOTER_MAGIC | int algorithm id (0) | long CRC-32
//! ```
//!
//! All integers are big-endian. The footer checksum covers every byte in
//! front of the checksum field itself. The whole buffer is checked before
//! the header is interpreted.

use std::ops::Range;

use crc32fast::Hasher;
use tracing::warn;

use crate::errors::{MetadataError, MetadataResult};
use crate::stream::StreamInput;
use crate::version::WireVersion;

pub const CODEC_MAGIC: u32 = 0x3fd7_6c17;
pub const FOOTER_MAGIC: u32 = !CODEC_MAGIC;
pub const FOOTER_LENGTH: usize = 16;

const CHECKSUM_LENGTH: usize = 8;
const EMPTY_INPUT: &str = "Empty or null data provided for checksum validation";

/// Validates checksum frames and locates their content.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChecksumValidator;

impl ChecksumValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validates the frame and returns the content as a view into `data`.
    ///
    /// # Errors
    ///
    /// `CorruptMetadata` on empty input, checksum mismatch, codec name
    /// mismatch, version outside `[min_version, max_version]` or a header
    /// that overlaps the footer.
    pub fn validate_and_slice<'a>(
        &self,
        data: &'a [u8],
        codec: &str,
        min_version: i32,
        max_version: i32,
    ) -> MetadataResult<&'a [u8]> {
        let bounds = self.content_bounds(data, codec, min_version, max_version)?;
        Ok(&data[bounds])
    }

    /// Same checks as [`validate_and_slice`](Self::validate_and_slice),
    /// returning the content range instead of a slice.
    pub fn content_bounds(
        &self,
        data: &[u8],
        codec: &str,
        min_version: i32,
        max_version: i32,
    ) -> MetadataResult<Range<usize>> {
        if data.is_empty() {
            return Err(MetadataError::corrupt(EMPTY_INPUT));
        }

        let checked = verify_footer(data)
            .and_then(|_| check_header(data, codec, min_version, max_version));
        let start = match checked {
            Ok(start) => start,
            Err(cause) => {
                warn!(codec, len = data.len(), error = %cause, "checksum frame rejected");
                return Err(MetadataError::corrupt_caused_by(
                    format!(
                        "Metadata checksum validation failed: {} (resource=ChecksumValidator(codec=\"{}\"))",
                        frame_reason(&cause),
                        codec
                    ),
                    cause,
                ));
            }
        };

        let end = data.len() - FOOTER_LENGTH;
        if start > end {
            let size = end as i64 - start as i64;
            warn!(codec, size, "checksum frame content overlaps footer");
            return Err(MetadataError::corrupt(format!("Invalid content size: {}", size)));
        }
        Ok(start..end)
    }
}

fn frame_reason(cause: &MetadataError) -> String {
    match cause {
        MetadataError::Decode(message) => message.clone(),
        other => other.to_string(),
    }
}

fn frame_input(data: &[u8]) -> StreamInput<'_> {
    StreamInput::new(data, WireVersion::CURRENT)
}

/// Checks footer magic, algorithm id and the whole-buffer CRC-32.
fn verify_footer(data: &[u8]) -> MetadataResult<()> {
    if data.len() < FOOTER_LENGTH {
        return Err(MetadataError::decode(format!(
            "misplaced codec footer (file truncated?): length={} but footerLength=={}",
            data.len(),
            FOOTER_LENGTH
        )));
    }

    let mut footer = frame_input(&data[data.len() - FOOTER_LENGTH..]);
    let magic = footer.read_int()? as u32;
    if magic != FOOTER_MAGIC {
        return Err(MetadataError::decode(format!(
            "codec footer mismatch (file truncated?): actual footer={} vs expected footer={}",
            magic, FOOTER_MAGIC
        )));
    }

    let algorithm = footer.read_int()? as u32;
    if algorithm != 0 {
        return Err(MetadataError::decode(format!(
            "codec footer mismatch: unknown algorithmID: {}",
            algorithm
        )));
    }

    let stored = footer.read_long()? as u64;
    if stored & 0xFFFF_FFFF_0000_0000 != 0 {
        return Err(MetadataError::decode(format!(
            "Illegal CRC-32 checksum: {}",
            stored
        )));
    }

    let mut hasher = Hasher::new();
    hasher.update(&data[..data.len() - CHECKSUM_LENGTH]);
    let actual = u64::from(hasher.finalize());
    if actual != stored {
        return Err(MetadataError::decode(format!(
            "checksum failed (hardware problem?) : expected={:x} actual={:x}",
            stored, actual
        )));
    }
    Ok(())
}

/// Checks the header and returns the offset just past it.
fn check_header(data: &[u8], codec: &str, min_version: i32, max_version: i32) -> MetadataResult<usize> {
    let mut header = frame_input(data);
    let magic = header.read_int()? as u32;
    if magic != CODEC_MAGIC {
        return Err(MetadataError::decode(format!(
            "codec header mismatch: actual header={} vs expected header={}",
            magic, CODEC_MAGIC
        )));
    }

    let name_len = header.read_len()?;
    let name = header.read_bytes(name_len)?;
    let actual = std::str::from_utf8(name)
        .map_err(|e| MetadataError::decode(format!("codec name is not UTF-8: {}", e)))?;
    if actual != codec {
        return Err(MetadataError::decode(format!(
            "codec mismatch: actual codec={} vs expected codec={}",
            actual, codec
        )));
    }

    let version = header.read_int()?;
    if version < min_version || version > max_version {
        let age = if version < min_version { "too old" } else { "too new" };
        return Err(MetadataError::decode(format!(
            "Format version is not supported ({}): {} (needs to be between {} and {})",
            age, version, min_version, max_version
        )));
    }
    Ok(header.position())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    // ========================================================================
    // Helpers
    // ========================================================================

    fn frame(codec: &str, version: i32, content: &[u8]) -> Vec<u8> {
        let mut header = CODEC_MAGIC.to_be_bytes().to_vec();
        header.push(codec.len() as u8);
        header.extend_from_slice(codec.as_bytes());
        header.extend_from_slice(&version.to_be_bytes());
        with_footer(header, content)
    }

    /// Appends `content` and a valid footer to arbitrary header bytes.
    fn with_footer(header: Vec<u8>, content: &[u8]) -> Vec<u8> {
        let mut out = header;
        out.extend_from_slice(content);
        out.extend_from_slice(&FOOTER_MAGIC.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        let mut hasher = Hasher::new();
        hasher.update(&out);
        out.extend_from_slice(&u64::from(hasher.finalize()).to_be_bytes());
        out
    }

    // ========================================================================
    // Tests
    // ========================================================================

    #[test]
    fn test_valid_frame_slices_content() {
        let data = frame("index-metadata", 1, b"payload");
        let content = ChecksumValidator::new()
            .validate_and_slice(&data, "index-metadata", 1, 2)
            .unwrap();
        assert_eq!(content, b"payload");

        let bounds = ChecksumValidator::new()
            .content_bounds(&data, "index-metadata", 1, 2)
            .unwrap();
        assert_eq!(bounds, 4 + 1 + 14 + 4..data.len() - FOOTER_LENGTH);
    }

    #[test]
    fn test_slice_is_zero_copy() {
        let data = frame("c", 1, b"abc");
        let content = ChecksumValidator::new().validate_and_slice(&data, "c", 1, 1).unwrap();
        let start = content.as_ptr() as usize - data.as_ptr() as usize;
        assert_eq!(start, 4 + 1 + 1 + 4);
    }

    #[test]
    fn test_empty_content_allowed() {
        let data = frame("c", 2, b"");
        let content = ChecksumValidator::new().validate_and_slice(&data, "c", 1, 2).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = ChecksumValidator::new().validate_and_slice(&[], "c", 1, 2).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Corruption);
        assert!(err.to_string().contains("Empty or null data"));
    }

    #[test]
    fn test_every_flipped_byte_detected() {
        let data = frame("index-metadata", 1, b"{\"idx\":{}}");
        for i in 0..data.len() {
            let mut corrupted = data.clone();
            corrupted[i] ^= 0xff;
            let err = ChecksumValidator::new()
                .validate_and_slice(&corrupted, "index-metadata", 1, 2)
                .unwrap_err();
            assert!(err.is_fatal(), "byte {} not detected", i);
        }
    }

    #[test]
    fn test_codec_mismatch() {
        let data = frame("other", 1, b"x");
        let err = ChecksumValidator::new().validate_and_slice(&data, "index-metadata", 1, 2).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Corruption);
        assert!(err.to_string().contains("codec mismatch"));
    }

    #[test]
    fn test_version_out_of_range() {
        let v = ChecksumValidator::new();
        assert!(v.validate_and_slice(&frame("c", 0, b"x"), "c", 1, 2).is_err());
        assert!(v.validate_and_slice(&frame("c", 3, b"x"), "c", 1, 2).is_err());
        assert!(v.validate_and_slice(&frame("c", 2, b"x"), "c", 1, 2).is_ok());
    }

    #[test]
    fn test_truncated_input() {
        let data = frame("c", 1, b"x");
        let err = ChecksumValidator::new().validate_and_slice(&data[..10], "c", 1, 2).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_header_overlapping_footer_is_negative_size() {
        // Header [magic, len 1, "c"] directly followed by the footer, so the
        // version is read out of the footer magic.
        let mut framed = CODEC_MAGIC.to_be_bytes().to_vec();
        framed.extend_from_slice(&[1, b'c']);
        framed.extend_from_slice(&FOOTER_MAGIC.to_be_bytes());
        framed.extend_from_slice(&0u32.to_be_bytes());
        let mut hasher = Hasher::new();
        hasher.update(&framed);
        framed.extend_from_slice(&u64::from(hasher.finalize()).to_be_bytes());

        let err = ChecksumValidator::new()
            .validate_and_slice(&framed, "c", i32::MIN, i32::MAX)
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("Invalid content size: -4"));
    }

    #[test]
    fn test_multi_byte_codec_name_length() {
        let codec = "x".repeat(200);
        let mut header = CODEC_MAGIC.to_be_bytes().to_vec();
        // 200 as a two-byte vint
        header.extend_from_slice(&[0xc8, 0x01]);
        header.extend_from_slice(codec.as_bytes());
        header.extend_from_slice(&1i32.to_be_bytes());
        let data = with_footer(header, b"body");

        let content = ChecksumValidator::new().validate_and_slice(&data, &codec, 1, 1).unwrap();
        assert_eq!(content, b"body");
    }

    #[test]
    fn test_malformed_name_length_is_corruption() {
        let mut header = CODEC_MAGIC.to_be_bytes().to_vec();
        header.extend_from_slice(&[0xff, 0xff, 0xff, 0xff, 0xff]);
        let data = with_footer(header, b"");

        let err = ChecksumValidator::new().validate_and_slice(&data, "c", 1, 1).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Corruption);
        assert!(err.to_string().contains("invalid vint"));

        let mut header = CODEC_MAGIC.to_be_bytes().to_vec();
        header.push(0x7f);
        header.push(b'c');
        let data = with_footer(header, b"");
        let err = ChecksumValidator::new().validate_and_slice(&data, "c", 1, 1).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Corruption);
    }
}
