//! Payload compression
//!
//! A compressor frames its output with a fixed-width magic header so that
//! any byte buffer can be classified as compressed or raw without outside
//! bookkeeping. Compressors are looked up by name in a registry; the
//! process-wide registry starts out with the deflate codec and accepts
//! further codecs through [`CompressorRegistry::register_global`].

mod deflate;
mod payload;

pub use deflate::DeflateCompressor;
pub use payload::CompressedPayload;

use std::collections::BTreeMap;
use std::fmt;
use std::io::{Read, Write};
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use tracing::{debug, info};

use crate::errors::{MetadataError, MetadataResult};

/// Name of the compressor used when the caller does not pick one.
pub const DEFAULT_COMPRESSOR: &str = "DEFLATE";

static GLOBAL_REGISTRY: Lazy<RwLock<CompressorRegistry>> =
    Lazy::new(|| RwLock::new(CompressorRegistry::default()));

/// A named, stateless compression codec.
///
/// Implementations hold no per-call state and may be invoked from any
/// number of threads at once.
pub trait Compressor: Send + Sync + fmt::Debug {
    /// Registry name
    fn name(&self) -> &'static str;

    /// Width of the magic header in front of every compressed buffer
    fn header_length(&self) -> usize;

    /// Whether `bytes` starts with this codec's header
    fn is_compressed(&self, bytes: &[u8]) -> bool;

    fn compress(&self, raw: &[u8]) -> MetadataResult<Vec<u8>>;

    /// Fails with a decode error if the header is missing.
    fn decompress(&self, compressed: &[u8]) -> MetadataResult<Vec<u8>>;

    /// Streaming encoder writing header plus compressed data into `sink`.
    fn output_stream<'a>(
        &self,
        sink: &'a mut dyn Write,
    ) -> MetadataResult<Box<dyn StreamEncoder + 'a>>;

    /// Streaming decoder; consumes and checks the header before returning.
    fn input_stream<'a>(&self, source: &'a mut dyn Read) -> MetadataResult<Box<dyn Read + 'a>>;
}

/// Write side of a streaming compressor.
///
/// Dropping the encoder without calling `finish` leaves the sink holding a
/// truncated stream.
pub trait StreamEncoder: Write {
    fn finish(self: Box<Self>) -> MetadataResult<()>;
}

/// Name to compressor lookup.
#[derive(Debug, Clone)]
pub struct CompressorRegistry {
    compressors: BTreeMap<String, Arc<dyn Compressor>>,
    default_name: String,
}

impl CompressorRegistry {
    /// Registry holding only `compressor`, which becomes the default.
    pub fn new(default_name: impl Into<String>, compressor: Arc<dyn Compressor>) -> Self {
        let default_name = default_name.into();
        let mut compressors = BTreeMap::new();
        compressors.insert(default_name.clone(), compressor);
        Self {
            compressors,
            default_name,
        }
    }

    /// Snapshot of the process-wide registry.
    ///
    /// Entries are shared handles, so the copy is cheap; codecs registered
    /// afterwards are not visible through it.
    pub fn global() -> CompressorRegistry {
        GLOBAL_REGISTRY
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Adds `compressor` to the process-wide registry under `name`.
    pub fn register_global(name: impl Into<String>, compressor: Arc<dyn Compressor>) {
        let name = name.into();
        info!(name = %name, codec = compressor.name(), "registering global compressor");
        GLOBAL_REGISTRY
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(name, compressor);
    }

    pub fn register(&mut self, name: impl Into<String>, compressor: Arc<dyn Compressor>) {
        let name = name.into();
        debug!(name = %name, codec = compressor.name(), "registering compressor");
        self.compressors.insert(name, compressor);
    }

    pub fn get(&self, name: &str) -> MetadataResult<Arc<dyn Compressor>> {
        self.compressors.get(name).cloned().ok_or_else(|| {
            MetadataError::configuration(format!(
                "unknown compressor [{}], registered: [{}]",
                name,
                self.names().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.compressors.contains_key(name)
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    pub fn default_compressor(&self) -> Arc<dyn Compressor> {
        match self.compressors.get(&self.default_name) {
            Some(compressor) => Arc::clone(compressor),
            // the default entry is inserted at construction and never removed
            None => Arc::new(DeflateCompressor),
        }
    }

    /// First registered compressor whose header matches `bytes`.
    pub fn detect(&self, bytes: &[u8]) -> Option<Arc<dyn Compressor>> {
        self.compressors
            .values()
            .find(|c| c.is_compressed(bytes))
            .cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.compressors.keys().map(String::as_str)
    }
}

impl Default for CompressorRegistry {
    fn default() -> Self {
        let deflate: Arc<dyn Compressor> = Arc::new(DeflateCompressor);
        let mut registry = CompressorRegistry::new(DEFAULT_COMPRESSOR, Arc::clone(&deflate));
        registry.register(DeflateCompressor::NAME, deflate);
        registry
    }
}
