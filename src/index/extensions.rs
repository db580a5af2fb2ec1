//! Caller-owned extension slots
//!
//! Custom data and rollover records belong to other subsystems. This layer
//! only frames, skips, or hands them to caller-supplied functions, and
//! stores whatever those functions produce as an [`OpaqueValue`].

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::errors::MetadataResult;
use crate::stream::{StreamInput, StreamOutput};

/// Type-erased, shareable extension value.
#[derive(Clone)]
pub struct OpaqueValue(Arc<dyn Any + Send + Sync>);

impl OpaqueValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OpaqueValue(..)")
    }
}

/// Extension entries keyed by name.
pub type ExtensionMap = BTreeMap<String, OpaqueValue>;

/// Reads one entry body off the wire.
pub type WireEntryReader =
    dyn Fn(&mut StreamInput<'_>) -> MetadataResult<OpaqueValue> + Send + Sync;

/// Writes one entry body; counts, keys and length prefixes are handled by
/// the record codec.
pub type WireEntryWriter =
    dyn Fn(&OpaqueValue, &mut StreamOutput) -> MetadataResult<()> + Send + Sync;

/// Derives a rollover entry's key from its decoded value.
pub type KeyExtractor = dyn Fn(&OpaqueValue) -> String + Send + Sync;

/// Parses one entry from its document subtree.
pub type DocumentEntryParser = dyn Fn(&str, &Value) -> MetadataResult<OpaqueValue> + Send + Sync;

/// Renders one entry as a document subtree.
pub type DocumentEntryWriter = dyn Fn(&str, &OpaqueValue) -> MetadataResult<Value> + Send + Sync;

#[derive(Clone)]
pub(crate) struct RolloverReader {
    pub(crate) read: Arc<WireEntryReader>,
    pub(crate) key: Arc<KeyExtractor>,
}

/// Binary codec hooks for the extension slots.
///
/// A slot without a reader is decoded in skip mode and comes back absent.
/// A slot without a writer is encoded as an empty slot.
#[derive(Clone, Default)]
pub struct WireExtensions {
    pub(crate) custom_data_reader: Option<Arc<WireEntryReader>>,
    pub(crate) custom_data_writer: Option<Arc<WireEntryWriter>>,
    pub(crate) rollover_reader: Option<RolloverReader>,
    pub(crate) rollover_writer: Option<Arc<WireEntryWriter>>,
}

impl WireExtensions {
    /// No hooks: skip on read, empty on write.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_custom_data_reader<F>(mut self, reader: F) -> Self
    where
        F: Fn(&mut StreamInput<'_>) -> MetadataResult<OpaqueValue> + Send + Sync + 'static,
    {
        self.custom_data_reader = Some(Arc::new(reader));
        self
    }

    pub fn with_custom_data_writer<F>(mut self, writer: F) -> Self
    where
        F: Fn(&OpaqueValue, &mut StreamOutput) -> MetadataResult<()> + Send + Sync + 'static,
    {
        self.custom_data_writer = Some(Arc::new(writer));
        self
    }

    pub fn with_rollover_reader<F, K>(mut self, reader: F, key: K) -> Self
    where
        F: Fn(&mut StreamInput<'_>) -> MetadataResult<OpaqueValue> + Send + Sync + 'static,
        K: Fn(&OpaqueValue) -> String + Send + Sync + 'static,
    {
        self.rollover_reader = Some(RolloverReader {
            read: Arc::new(reader),
            key: Arc::new(key),
        });
        self
    }

    pub fn with_rollover_writer<F>(mut self, writer: F) -> Self
    where
        F: Fn(&OpaqueValue, &mut StreamOutput) -> MetadataResult<()> + Send + Sync + 'static,
    {
        self.rollover_writer = Some(Arc::new(writer));
        self
    }
}

impl fmt::Debug for WireExtensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireExtensions")
            .field("custom_data_reader", &self.custom_data_reader.is_some())
            .field("custom_data_writer", &self.custom_data_writer.is_some())
            .field("rollover_reader", &self.rollover_reader.is_some())
            .field("rollover_writer", &self.rollover_writer.is_some())
            .finish()
    }
}

/// Document codec hooks for the extension slots.
///
/// Without a parser the corresponding subtree is skipped whole; without a
/// writer the slot is left out of the document.
#[derive(Clone, Default)]
pub struct DocumentExtensions {
    pub(crate) custom_data_parser: Option<Arc<DocumentEntryParser>>,
    pub(crate) custom_data_writer: Option<Arc<DocumentEntryWriter>>,
    pub(crate) rollover_parser: Option<Arc<DocumentEntryParser>>,
    pub(crate) rollover_writer: Option<Arc<DocumentEntryWriter>>,
}

impl DocumentExtensions {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_custom_data_parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(&str, &Value) -> MetadataResult<OpaqueValue> + Send + Sync + 'static,
    {
        self.custom_data_parser = Some(Arc::new(parser));
        self
    }

    pub fn with_custom_data_writer<F>(mut self, writer: F) -> Self
    where
        F: Fn(&str, &OpaqueValue) -> MetadataResult<Value> + Send + Sync + 'static,
    {
        self.custom_data_writer = Some(Arc::new(writer));
        self
    }

    pub fn with_rollover_parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(&str, &Value) -> MetadataResult<OpaqueValue> + Send + Sync + 'static,
    {
        self.rollover_parser = Some(Arc::new(parser));
        self
    }

    pub fn with_rollover_writer<F>(mut self, writer: F) -> Self
    where
        F: Fn(&str, &OpaqueValue) -> MetadataResult<Value> + Send + Sync + 'static,
    {
        self.rollover_writer = Some(Arc::new(writer));
        self
    }
}

impl fmt::Debug for DocumentExtensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentExtensions")
            .field("custom_data_parser", &self.custom_data_parser.is_some())
            .field("custom_data_writer", &self.custom_data_writer.is_some())
            .field("rollover_parser", &self.rollover_parser.is_some())
            .field("rollover_writer", &self.rollover_writer.is_some())
            .finish()
    }
}
