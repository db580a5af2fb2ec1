//! Document codec for the aggregate record
//!
//! The document is `{"<index>": {...}}`. Its shape depends on the context
//! mode: API responses list alias names and key primary terms by shard id,
//! while persisted shapes carry full alias entries, a primary-term array and
//! flat settings.

use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::document::DocumentParams;
use crate::errors::{MetadataError, MetadataResult};
use crate::settings::SettingsView;

use super::alias::AliasEntry;
use super::context::ContextEntry;
use super::extensions::DocumentExtensions;
use super::mapping::MappingEntry;
use super::record::{IndexMetadata, IndexMetadataBuilder, IndexState};

const KEY_VERSION: &str = "version";
const KEY_MAPPING_VERSION: &str = "mapping_version";
const KEY_SETTINGS_VERSION: &str = "settings_version";
const KEY_ALIASES_VERSION: &str = "aliases_version";
const KEY_ROUTING_NUM_SHARDS: &str = "routing_num_shards";
const KEY_STATE: &str = "state";
const KEY_SETTINGS: &str = "settings";
const KEY_MAPPINGS: &str = "mappings";
const KEY_ALIASES: &str = "aliases";
const KEY_PRIMARY_TERMS: &str = "primary_terms";
const KEY_IN_SYNC_ALLOCATIONS: &str = "in_sync_allocations";
const KEY_ROLLOVER_INFOS: &str = "rollover_info";
const KEY_SYSTEM: &str = "system";
const KEY_CONTEXT: &str = "context";
const KEY_INGESTION_STATUS: &str = "ingestion_status";
const KEY_INGESTION_PAUSED: &str = "is_paused";

/// Keys only ever holding an object.
const OBJECT_KEYS: [&str; 5] = [
    KEY_SETTINGS,
    KEY_IN_SYNC_ALLOCATIONS,
    KEY_ROLLOVER_INFOS,
    KEY_CONTEXT,
    KEY_INGESTION_STATUS,
];

/// Keys holding an object or an array depending on the context mode.
const CONTAINER_KEYS: [&str; 3] = [KEY_MAPPINGS, KEY_ALIASES, KEY_PRIMARY_TERMS];

const SCALAR_KEYS: [&str; 7] = [
    KEY_VERSION,
    KEY_MAPPING_VERSION,
    KEY_SETTINGS_VERSION,
    KEY_ALIASES_VERSION,
    KEY_ROUTING_NUM_SHARDS,
    KEY_STATE,
    KEY_SYSTEM,
];

fn is_one_of(keys: &[&str], key: &str) -> bool {
    keys.iter().any(|k| *k == key)
}

fn is_reserved_key(key: &str) -> bool {
    is_one_of(&OBJECT_KEYS, key) || is_one_of(&CONTAINER_KEYS, key) || is_one_of(&SCALAR_KEYS, key)
}

impl IndexMetadata {
    pub fn to_document(
        &self,
        params: &DocumentParams,
        extensions: &DocumentExtensions,
    ) -> MetadataResult<Value> {
        let api = params.context_mode.is_api();
        let mut body = Map::new();

        body.insert(KEY_VERSION.into(), Value::from(self.version));
        body.insert(KEY_MAPPING_VERSION.into(), Value::from(self.mapping_version));
        body.insert(KEY_SETTINGS_VERSION.into(), Value::from(self.settings_version));
        body.insert(KEY_ALIASES_VERSION.into(), Value::from(self.aliases_version));
        body.insert(KEY_ROUTING_NUM_SHARDS.into(), Value::from(self.routing_num_shards));
        body.insert(KEY_STATE.into(), Value::from(self.state.as_str()));

        let settings = if params.settings_flat() {
            self.settings.to_flat_value()
        } else {
            self.settings.flatten()
        };
        body.insert(KEY_SETTINGS.into(), settings);

        if api {
            let mut mappings = Map::new();
            for mapping in self.mappings.values() {
                mappings.insert(mapping.type_name().to_string(), mapping.content()?);
            }
            body.insert(KEY_MAPPINGS.into(), Value::Object(mappings));
        } else {
            let mappings = self
                .mappings
                .values()
                .map(|m| m.to_document_element(params))
                .collect::<MetadataResult<Vec<_>>>()?;
            body.insert(KEY_MAPPINGS.into(), Value::Array(mappings));
        }

        if let (Some(writer), Some(entries)) = (&extensions.custom_data_writer, &self.custom_data) {
            for (key, value) in entries {
                if is_reserved_key(key) {
                    warn!(index = %self.index, key = %key, "custom data key collides with a built-in field");
                    return Err(MetadataError::configuration(format!(
                        "custom data key [{}] of index [{}] collides with a built-in field",
                        key, self.index
                    )));
                }
                body.insert(key.clone(), writer(key, value)?);
            }
        }

        if api {
            let names = self.aliases.keys().cloned().map(Value::String).collect();
            body.insert(KEY_ALIASES.into(), Value::Array(names));

            let terms: Map<String, Value> = self
                .primary_terms
                .iter()
                .enumerate()
                .map(|(shard, term)| (shard.to_string(), Value::from(*term)))
                .collect();
            body.insert(KEY_PRIMARY_TERMS.into(), Value::Object(terms));
        } else {
            let mut aliases = Map::new();
            for (name, alias) in &self.aliases {
                aliases.insert(name.clone(), alias.to_document()?);
            }
            body.insert(KEY_ALIASES.into(), Value::Object(aliases));

            let terms = self.primary_terms.iter().map(|t| Value::from(*t)).collect();
            body.insert(KEY_PRIMARY_TERMS.into(), Value::Array(terms));
        }

        let in_sync: Map<String, Value> = self
            .in_sync_allocation_ids
            .iter()
            .map(|(shard, ids)| {
                let ids = ids.iter().cloned().map(Value::String).collect();
                (shard.to_string(), Value::Array(ids))
            })
            .collect();
        body.insert(KEY_IN_SYNC_ALLOCATIONS.into(), Value::Object(in_sync));

        if let Some(writer) = &extensions.rollover_writer {
            let mut rollover = Map::new();
            for (key, value) in self.rollover_infos.iter().flatten() {
                rollover.insert(key.clone(), writer(key, value)?);
            }
            body.insert(KEY_ROLLOVER_INFOS.into(), Value::Object(rollover));
        }

        body.insert(KEY_SYSTEM.into(), Value::Bool(self.is_system));

        if let Some(context) = &self.context {
            body.insert(KEY_CONTEXT.into(), context.to_document());
        }

        if let Some(paused) = self.ingestion_paused {
            let mut status = Map::new();
            status.insert(KEY_INGESTION_PAUSED.into(), Value::Bool(paused));
            body.insert(KEY_INGESTION_STATUS.into(), Value::Object(status));
        }

        let mut outer = Map::new();
        outer.insert(self.index.clone(), Value::Object(body));
        Ok(Value::Object(outer))
    }

    /// Serialized JSON form of [`IndexMetadata::to_document`].
    pub fn to_json_bytes(
        &self,
        params: &DocumentParams,
        extensions: &DocumentExtensions,
    ) -> MetadataResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.to_document(params, extensions)?)?)
    }

    pub fn from_json_slice(bytes: &[u8], extensions: &DocumentExtensions) -> MetadataResult<Self> {
        let document: Value = serde_json::from_slice(bytes)?;
        Self::from_document(&document, extensions)
    }

    /// Decodes `{"<index>": {...}}`.
    ///
    /// Object-valued keys outside the known set are custom data, parsed by
    /// the caller's hook or skipped whole. Any other unknown key is an
    /// [`UnknownField`](MetadataError::UnknownField) error.
    pub fn from_document(document: &Value, extensions: &DocumentExtensions) -> MetadataResult<Self> {
        let (index, body) = document
            .as_object()
            .and_then(|outer| outer.iter().next())
            .ok_or_else(|| {
                MetadataError::decode("expected an object holding the index name as its first field")
            })?;

        let fields = body.as_object().ok_or_else(|| {
            MetadataError::decode(format!(
                "expected an object for index [{}] but found [{}]",
                index, body
            ))
        })?;

        let mut builder = IndexMetadataBuilder::new(index.clone());
        if extensions.custom_data_parser.is_some() {
            builder = builder.custom_data_decoded();
        }
        if extensions.rollover_parser.is_some() {
            builder = builder.rollover_infos_decoded();
        }

        for (key, value) in fields {
            builder = match value {
                Value::Object(object) => parse_object_field(builder, key, object, extensions)?,
                Value::Array(items) => parse_array_field(builder, key, items)?,
                scalar => parse_scalar_field(builder, key, scalar)?,
            };
        }

        Ok(builder.build())
    }
}

fn parse_object_field(
    builder: IndexMetadataBuilder,
    key: &str,
    object: &Map<String, Value>,
    extensions: &DocumentExtensions,
) -> MetadataResult<IndexMetadataBuilder> {
    let mut builder = builder;
    match key {
        KEY_SETTINGS => {
            builder = builder.settings(SettingsView::unflatten(&Value::Object(object.clone()))?);
        }
        KEY_MAPPINGS => {
            for (type_name, content) in object {
                builder = builder.put_mapping(MappingEntry::from_content(type_name, content)?);
            }
        }
        KEY_ALIASES => {
            for (name, alias) in object {
                builder = builder.put_alias(AliasEntry::from_document(name, alias)?);
            }
        }
        KEY_IN_SYNC_ALLOCATIONS => {
            for (shard, ids) in object {
                let Value::Array(ids) = ids else {
                    continue;
                };
                let shard: i32 = shard.parse().map_err(|_| {
                    MetadataError::decode(format!("invalid shard id [{}] in {}", shard, KEY_IN_SYNC_ALLOCATIONS))
                })?;
                let ids = ids.iter().filter_map(Value::as_str).map(str::to_string);
                builder = builder.put_in_sync_allocation_ids(shard, ids.collect::<Vec<_>>());
            }
        }
        KEY_PRIMARY_TERMS => {
            builder = builder.primary_terms(primary_terms_from_object(object)?);
        }
        KEY_ROLLOVER_INFOS => match &extensions.rollover_parser {
            Some(parser) => {
                for (rollover_key, info) in object {
                    builder = builder.put_rollover_info(rollover_key.clone(), parser(rollover_key, info)?);
                }
            }
            None => trace!("skipping rollover_info without a parser"),
        },
        KEY_CONTEXT => {
            builder = builder.context(Some(ContextEntry::from_document(&Value::Object(object.clone()))?));
        }
        KEY_INGESTION_STATUS => {
            if let Some(paused) = object.get(KEY_INGESTION_PAUSED).and_then(Value::as_bool) {
                builder = builder.ingestion_paused(Some(paused));
            }
        }
        custom => match &extensions.custom_data_parser {
            Some(parser) => {
                let value = parser(custom, &Value::Object(object.clone()))?;
                builder = builder.put_custom_data(custom, value);
            }
            None => trace!(key = custom, "skipping custom data without a parser"),
        },
    }
    Ok(builder)
}

fn parse_array_field(
    builder: IndexMetadataBuilder,
    key: &str,
    items: &[Value],
) -> MetadataResult<IndexMetadataBuilder> {
    let mut builder = builder;
    match key {
        KEY_MAPPINGS => {
            for element in items {
                if let Some(mapping) = MappingEntry::from_document_element(element)? {
                    builder = builder.put_mapping(mapping);
                }
            }
        }
        KEY_ALIASES => {
            for name in items.iter().filter_map(Value::as_str) {
                builder = builder.put_alias(AliasEntry::named(name));
            }
        }
        KEY_PRIMARY_TERMS => {
            if !items.is_empty() {
                let terms = items
                    .iter()
                    .enumerate()
                    .map(|(shard, term)| primary_term(&shard.to_string(), term))
                    .collect::<MetadataResult<Vec<_>>>()?;
                builder = builder.primary_terms(terms);
            }
        }
        expected if is_one_of(&OBJECT_KEYS, expected) => {
            return Err(wrong_shape(expected, "an object", "an array"))
        }
        expected if is_one_of(&SCALAR_KEYS, expected) => {
            return Err(wrong_shape(expected, "a single value", "an array"))
        }
        unknown => return Err(MetadataError::unknown_field(unknown)),
    }
    Ok(builder)
}

fn parse_scalar_field(
    builder: IndexMetadataBuilder,
    key: &str,
    value: &Value,
) -> MetadataResult<IndexMetadataBuilder> {
    Ok(match key {
        KEY_VERSION => builder.version(counter(key, value)?),
        KEY_MAPPING_VERSION => builder.mapping_version(counter(key, value)?),
        KEY_SETTINGS_VERSION => builder.settings_version(counter(key, value)?),
        KEY_ALIASES_VERSION => builder.aliases_version(counter(key, value)?),
        KEY_ROUTING_NUM_SHARDS => {
            let shards = integer(key, value)?;
            let shards = i32::try_from(shards).map_err(|_| {
                MetadataError::decode(format!("[{}] out of range: {}", key, shards))
            })?;
            builder.routing_num_shards(shards)
        }
        KEY_STATE => match value {
            Value::String(s) => builder.state(IndexState::from_document_str(s)),
            other => builder.state(IndexState::from_document_str(&other.to_string())),
        },
        KEY_SYSTEM => builder.system(boolean(key, value)?),
        KEY_CONTEXT | KEY_INGESTION_STATUS if value.is_null() => builder,
        expected if is_one_of(&OBJECT_KEYS, expected) => {
            return Err(wrong_shape(expected, "an object", &value.to_string()))
        }
        expected if is_one_of(&CONTAINER_KEYS, expected) => {
            return Err(wrong_shape(expected, "an object or an array", &value.to_string()))
        }
        unknown => return Err(MetadataError::unknown_field(unknown)),
    })
}

fn wrong_shape(key: &str, expected: &str, found: &str) -> MetadataError {
    MetadataError::decode(format!("[{}] expected {} but found [{}]", key, expected, found))
}

/// Dense primary-term array from `{"<shard>": term}`; gaps are rejected.
fn primary_terms_from_object(object: &Map<String, Value>) -> MetadataResult<Vec<u64>> {
    let mut indexed = Vec::with_capacity(object.len());
    for (shard, term) in object {
        let shard_id: usize = shard.parse().map_err(|_| {
            MetadataError::decode(format!("invalid shard id [{}] in {}", shard, KEY_PRIMARY_TERMS))
        })?;
        indexed.push((shard_id, primary_term(shard, term)?));
    }

    let Some(max) = indexed.iter().map(|(shard, _)| *shard).max() else {
        return Ok(Vec::new());
    };
    if max >= indexed.len() {
        return Err(MetadataError::decode(format!(
            "{} has gaps: {} entries for shards up to {}",
            KEY_PRIMARY_TERMS,
            indexed.len(),
            max
        )));
    }

    let mut terms: Vec<Option<u64>> = vec![None; max + 1];
    for (shard, term) in indexed {
        terms[shard] = Some(term);
    }
    terms
        .into_iter()
        .enumerate()
        .map(|(shard, term)| {
            term.ok_or_else(|| {
                MetadataError::decode(format!("{} is missing shard [{}]", KEY_PRIMARY_TERMS, shard))
            })
        })
        .collect()
}

fn primary_term(shard: &str, value: &Value) -> MetadataResult<u64> {
    value.as_u64().ok_or_else(|| {
        MetadataError::decode(format!(
            "invalid primary term [{}] for shard [{}]",
            value, shard
        ))
    })
}

fn integer(key: &str, value: &Value) -> MetadataResult<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| MetadataError::decode(format!("[{}] expected a number but found [{}]", key, value)))
}

fn counter(key: &str, value: &Value) -> MetadataResult<u64> {
    let n = integer(key, value)?;
    u64::try_from(n).map_err(|_| MetadataError::decode(format!("[{}] must not be negative: {}", key, n)))
}

fn boolean(key: &str, value: &Value) -> MetadataResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s == "true" => Ok(true),
        Value::String(s) if s == "false" => Ok(false),
        other => Err(MetadataError::decode(format!(
            "[{}] expected a boolean but found [{}]",
            key, other
        ))),
    }
}
