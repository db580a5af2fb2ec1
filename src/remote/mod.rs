//! Remote blob integrity and loading
//!
//! Remote metadata blobs are wrapped in a checksum frame. The validator
//! checks the frame and exposes the content; the reader composes that with
//! decompression and document decoding.

mod checksum;
mod reader;

pub use checksum::{ChecksumValidator, CODEC_MAGIC, FOOTER_LENGTH, FOOTER_MAGIC};
pub use reader::{RemoteMetadataReader, INDEX_METADATA_CODEC, MAX_CODEC_VERSION, MIN_CODEC_VERSION};
