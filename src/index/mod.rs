//! Per-index metadata record
//!
//! The aggregate [`IndexMetadata`] record plus its sub-entities (mappings,
//! aliases, context) and two codecs:
//!
//! - binary, version-gated via [`WireVersion`](crate::version::WireVersion),
//!   with length-prefixed skippable extension slots from 3.2.0 on
//! - document, a JSON tree whose shape follows the
//!   [`ContextMode`](crate::document::ContextMode)
//!
//! # Invariants
//!
//! - At most one mapping per record
//! - Alias names are unique; the map is keyed by name
//! - An extension slot decoded without a hook comes back absent, never empty

mod alias;
mod context;
mod document;
mod extensions;
mod mapping;
mod record;
mod wire;

pub use alias::{AliasBuilder, AliasEntry};
pub use context::ContextEntry;
pub use extensions::{
    DocumentEntryParser, DocumentEntryWriter, DocumentExtensions, ExtensionMap, KeyExtractor,
    OpaqueValue, WireEntryReader, WireEntryWriter, WireExtensions,
};
pub use mapping::MappingEntry;
pub use record::{IndexMetadata, IndexMetadataBuilder, IndexState};
