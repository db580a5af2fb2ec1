//! The aggregate index metadata record and its builder

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::errors::{MetadataError, MetadataResult};
use crate::settings::SettingsView;

use super::alias::AliasEntry;
use super::context::ContextEntry;
use super::extensions::{ExtensionMap, OpaqueValue};
use super::mapping::MappingEntry;

/// Open/closed state, one byte on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexState {
    #[default]
    Open,
    Close,
}

impl IndexState {
    pub fn as_byte(&self) -> u8 {
        match self {
            IndexState::Open => 0,
            IndexState::Close => 1,
        }
    }

    pub fn from_byte(byte: u8) -> MetadataResult<Self> {
        match byte {
            0 => Ok(IndexState::Open),
            1 => Ok(IndexState::Close),
            other => Err(MetadataError::decode(format!("unknown index state [{}]", other))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexState::Open => "open",
            IndexState::Close => "close",
        }
    }

    /// `open` in any case is open; every other value is close.
    pub fn from_document_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("open") {
            IndexState::Open
        } else {
            IndexState::Close
        }
    }
}

impl fmt::Display for IndexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything known about one index.
///
/// Built once through [`IndexMetadataBuilder`] and immutable afterwards.
/// `custom_data` and `rollover_infos` are `None` when they were not decoded
/// (no hook supplied), which is different from decoded-but-empty. Equality
/// ignores both extension slots.
#[derive(Debug, Clone)]
pub struct IndexMetadata {
    pub(crate) index: String,
    pub(crate) version: u64,
    pub(crate) mapping_version: u64,
    pub(crate) settings_version: u64,
    pub(crate) aliases_version: u64,
    pub(crate) routing_num_shards: i32,
    pub(crate) state: IndexState,
    pub(crate) settings: SettingsView,
    pub(crate) primary_terms: Vec<u64>,
    pub(crate) mappings: BTreeMap<String, MappingEntry>,
    pub(crate) aliases: BTreeMap<String, AliasEntry>,
    pub(crate) in_sync_allocation_ids: BTreeMap<i32, BTreeSet<String>>,
    pub(crate) is_system: bool,
    pub(crate) context: Option<ContextEntry>,
    pub(crate) ingestion_paused: Option<bool>,
    pub(crate) custom_data: Option<ExtensionMap>,
    pub(crate) rollover_infos: Option<ExtensionMap>,
}

impl IndexMetadata {
    pub fn builder(index: impl Into<String>) -> IndexMetadataBuilder {
        IndexMetadataBuilder::new(index)
    }

    /// Builder seeded with this record, for copy-on-write updates.
    pub fn to_builder(&self) -> IndexMetadataBuilder {
        IndexMetadataBuilder::from_metadata(self)
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn mapping_version(&self) -> u64 {
        self.mapping_version
    }

    pub fn settings_version(&self) -> u64 {
        self.settings_version
    }

    pub fn aliases_version(&self) -> u64 {
        self.aliases_version
    }

    pub fn routing_num_shards(&self) -> i32 {
        self.routing_num_shards
    }

    pub fn state(&self) -> IndexState {
        self.state
    }

    pub fn settings(&self) -> &SettingsView {
        &self.settings
    }

    /// Primary term per shard, indexed by shard id.
    pub fn primary_terms(&self) -> &[u64] {
        &self.primary_terms
    }

    pub fn primary_term(&self, shard: usize) -> Option<u64> {
        self.primary_terms.get(shard).copied()
    }

    pub fn mappings(&self) -> &BTreeMap<String, MappingEntry> {
        &self.mappings
    }

    /// The single mapping, if any.
    pub fn mapping(&self) -> Option<&MappingEntry> {
        self.mappings.values().next()
    }

    pub fn aliases(&self) -> &BTreeMap<String, AliasEntry> {
        &self.aliases
    }

    pub fn in_sync_allocation_ids(&self) -> &BTreeMap<i32, BTreeSet<String>> {
        &self.in_sync_allocation_ids
    }

    pub fn is_system(&self) -> bool {
        self.is_system
    }

    pub fn context(&self) -> Option<&ContextEntry> {
        self.context.as_ref()
    }

    pub fn ingestion_paused(&self) -> Option<bool> {
        self.ingestion_paused
    }

    pub fn custom_data(&self) -> Option<&ExtensionMap> {
        self.custom_data.as_ref()
    }

    pub fn rollover_infos(&self) -> Option<&ExtensionMap> {
        self.rollover_infos.as_ref()
    }
}

impl PartialEq for IndexMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
            && self.version == other.version
            && self.mapping_version == other.mapping_version
            && self.settings_version == other.settings_version
            && self.aliases_version == other.aliases_version
            && self.routing_num_shards == other.routing_num_shards
            && self.state == other.state
            && self.settings == other.settings
            && self.primary_terms == other.primary_terms
            && self.mappings == other.mappings
            && self.aliases == other.aliases
            && self.in_sync_allocation_ids == other.in_sync_allocation_ids
            && self.is_system == other.is_system
            && self.context == other.context
            && self.ingestion_paused == other.ingestion_paused
    }
}

impl Eq for IndexMetadata {}

/// Mutable construction of an [`IndexMetadata`].
///
/// Version counters start at 1 and the state at open. When no routing shard
/// count is set, the number of primary terms is used.
#[derive(Debug, Clone)]
pub struct IndexMetadataBuilder {
    index: String,
    version: u64,
    mapping_version: u64,
    settings_version: u64,
    aliases_version: u64,
    routing_num_shards: Option<i32>,
    state: IndexState,
    settings: SettingsView,
    primary_terms: Vec<u64>,
    mappings: BTreeMap<String, MappingEntry>,
    aliases: BTreeMap<String, AliasEntry>,
    in_sync_allocation_ids: BTreeMap<i32, BTreeSet<String>>,
    is_system: bool,
    context: Option<ContextEntry>,
    ingestion_paused: Option<bool>,
    custom_data: Option<ExtensionMap>,
    rollover_infos: Option<ExtensionMap>,
}

impl IndexMetadataBuilder {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            version: 1,
            mapping_version: 1,
            settings_version: 1,
            aliases_version: 1,
            routing_num_shards: None,
            state: IndexState::Open,
            settings: SettingsView::empty(),
            primary_terms: Vec::new(),
            mappings: BTreeMap::new(),
            aliases: BTreeMap::new(),
            in_sync_allocation_ids: BTreeMap::new(),
            is_system: false,
            context: None,
            ingestion_paused: None,
            custom_data: None,
            rollover_infos: None,
        }
    }

    pub fn from_metadata(metadata: &IndexMetadata) -> Self {
        Self {
            index: metadata.index.clone(),
            version: metadata.version,
            mapping_version: metadata.mapping_version,
            settings_version: metadata.settings_version,
            aliases_version: metadata.aliases_version,
            routing_num_shards: Some(metadata.routing_num_shards),
            state: metadata.state,
            settings: metadata.settings.clone(),
            primary_terms: metadata.primary_terms.clone(),
            mappings: metadata.mappings.clone(),
            aliases: metadata.aliases.clone(),
            in_sync_allocation_ids: metadata.in_sync_allocation_ids.clone(),
            is_system: metadata.is_system,
            context: metadata.context.clone(),
            ingestion_paused: metadata.ingestion_paused,
            custom_data: metadata.custom_data.clone(),
            rollover_infos: metadata.rollover_infos.clone(),
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index
    }

    pub fn version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn mapping_version(mut self, version: u64) -> Self {
        self.mapping_version = version;
        self
    }

    pub fn settings_version(mut self, version: u64) -> Self {
        self.settings_version = version;
        self
    }

    pub fn aliases_version(mut self, version: u64) -> Self {
        self.aliases_version = version;
        self
    }

    pub fn routing_num_shards(mut self, shards: i32) -> Self {
        self.routing_num_shards = Some(shards);
        self
    }

    pub fn state(mut self, state: IndexState) -> Self {
        self.state = state;
        self
    }

    pub fn settings(mut self, settings: SettingsView) -> Self {
        self.settings = settings;
        self
    }

    pub fn primary_terms(mut self, terms: Vec<u64>) -> Self {
        self.primary_terms = terms;
        self
    }

    /// Replaces any existing mapping; an index holds at most one.
    pub fn put_mapping(mut self, mapping: MappingEntry) -> Self {
        self.mappings.clear();
        self.mappings.insert(mapping.type_name().to_string(), mapping);
        self
    }

    pub fn clear_mappings(mut self) -> Self {
        self.mappings.clear();
        self
    }

    pub fn put_alias(mut self, alias: AliasEntry) -> Self {
        self.aliases.insert(alias.name().to_string(), alias);
        self
    }

    pub fn remove_alias(mut self, name: &str) -> Self {
        self.aliases.remove(name);
        self
    }

    pub fn remove_all_aliases(mut self) -> Self {
        self.aliases.clear();
        self
    }

    pub fn put_in_sync_allocation_ids<I, S>(mut self, shard: i32, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.in_sync_allocation_ids
            .insert(shard, ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn system(mut self, is_system: bool) -> Self {
        self.is_system = is_system;
        self
    }

    pub fn context(mut self, context: Option<ContextEntry>) -> Self {
        self.context = context;
        self
    }

    pub fn ingestion_paused(mut self, paused: Option<bool>) -> Self {
        self.ingestion_paused = paused;
        self
    }

    pub fn put_custom_data(mut self, key: impl Into<String>, value: OpaqueValue) -> Self {
        self.custom_data
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value);
        self
    }

    pub fn put_rollover_info(mut self, key: impl Into<String>, value: OpaqueValue) -> Self {
        self.rollover_infos
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value);
        self
    }

    /// Marks custom data as decoded, even if no entry follows.
    pub(crate) fn custom_data_decoded(mut self) -> Self {
        self.custom_data.get_or_insert_with(BTreeMap::new);
        self
    }

    pub(crate) fn rollover_infos_decoded(mut self) -> Self {
        self.rollover_infos.get_or_insert_with(BTreeMap::new);
        self
    }

    pub fn build(self) -> IndexMetadata {
        let routing_num_shards = self
            .routing_num_shards
            .unwrap_or_else(|| i32::try_from(self.primary_terms.len()).unwrap_or(i32::MAX));
        IndexMetadata {
            index: self.index,
            version: self.version,
            mapping_version: self.mapping_version,
            settings_version: self.settings_version,
            aliases_version: self.aliases_version,
            routing_num_shards,
            state: self.state,
            settings: self.settings,
            primary_terms: self.primary_terms,
            mappings: self.mappings,
            aliases: self.aliases,
            in_sync_allocation_ids: self.in_sync_allocation_ids,
            is_system: self.is_system,
            context: self.context,
            ingestion_paused: self.ingestion_paused,
            custom_data: self.custom_data,
            rollover_infos: self.rollover_infos,
        }
    }
}
