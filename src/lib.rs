//! idxmeta - index metadata codec
//!
//! Encodes and decodes the per-index metadata record of a distributed
//! search engine:
//!
//! - [`stream`]: binary primitives shared by every wire codec
//! - [`compress`]: header-framed compression and [`CompressedPayload`]
//! - [`settings`]: flat/structured settings normalization
//! - [`index`]: the aggregate record, its sub-entities and both codecs
//! - [`remote`]: checksum-framed blob validation and the read-only loader
//!
//! Binary encodings are resolved against a negotiated [`WireVersion`];
//! document encodings follow a [`ContextMode`].

pub mod cli;
pub mod compress;
pub mod config;
pub mod document;
pub mod errors;
pub mod index;
pub mod remote;
pub mod settings;
pub mod stream;
pub mod version;

pub use compress::{CompressedPayload, Compressor, CompressorRegistry, DeflateCompressor};
pub use config::CodecConfig;
pub use document::{ContextMode, DocumentParams};
pub use errors::{ErrorCode, MetadataError, MetadataResult, Severity};
pub use index::{
    AliasEntry, ContextEntry, DocumentExtensions, IndexMetadata, IndexMetadataBuilder, IndexState,
    MappingEntry, OpaqueValue, WireExtensions,
};
pub use remote::{ChecksumValidator, RemoteMetadataReader};
pub use settings::{SettingValue, SettingsView};
pub use version::WireVersion;
