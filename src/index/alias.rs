//! Index alias entries

use std::collections::BTreeSet;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{Map, Value};

use crate::compress::CompressedPayload;
use crate::errors::{MetadataError, MetadataResult};
use crate::stream::{StreamInput, StreamOutput};

const FILTER_FIELD: &str = "filter";
const ROUTING_FIELD: &str = "routing";
const INDEX_ROUTING_FIELD: &str = "index_routing";
const SEARCH_ROUTING_FIELD: &str = "search_routing";
const IS_WRITE_INDEX_FIELD: &str = "is_write_index";
const IS_HIDDEN_FIELD: &str = "is_hidden";

/// An alias pointing at the index, with optional filter and routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    name: String,
    filter: Option<CompressedPayload>,
    index_routing: Option<String>,
    search_routing: Option<String>,
    search_routing_values: BTreeSet<String>,
    write_index: Option<bool>,
    is_hidden: Option<bool>,
}

impl AliasEntry {
    pub fn builder(name: impl Into<String>) -> AliasBuilder {
        AliasBuilder::new(name)
    }

    /// Alias with a name only.
    pub fn named(name: impl Into<String>) -> Self {
        AliasBuilder::new(name).build()
    }

    /// Same alias definition under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        AliasBuilder::from_entry(self).with_name(name).build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filter(&self) -> Option<&CompressedPayload> {
        self.filter.as_ref()
    }

    pub fn index_routing(&self) -> Option<&str> {
        self.index_routing.as_deref()
    }

    pub fn search_routing(&self) -> Option<&str> {
        self.search_routing.as_deref()
    }

    /// Comma-separated search routing split into individual values.
    pub fn search_routing_values(&self) -> &BTreeSet<String> {
        &self.search_routing_values
    }

    pub fn write_index(&self) -> Option<bool> {
        self.write_index
    }

    pub fn is_hidden(&self) -> Option<bool> {
        self.is_hidden
    }

    pub fn filtering_required(&self) -> bool {
        self.filter.is_some()
    }

    /// Decodes the body of `"<name>": {...}`.
    ///
    /// Unrecognized fields are skipped. The filter may be an object, or base64
    /// text holding compressed or raw filter bytes.
    pub fn from_document(name: &str, body: &Value) -> MetadataResult<Self> {
        let fields = body.as_object().ok_or_else(|| {
            MetadataError::decode(format!(
                "expected an object for alias [{}] but found [{}]",
                name, body
            ))
        })?;

        let mut builder = AliasBuilder::new(name);
        for (field, value) in fields {
            match (field.as_str(), value) {
                (FILTER_FIELD, Value::Object(filter)) => {
                    builder = builder.filter(filter_from_object(filter)?);
                }
                (FILTER_FIELD, Value::String(encoded)) => {
                    builder = builder.filter(filter_from_base64(name, encoded)?);
                }
                (ROUTING_FIELD, Value::String(routing)) => {
                    builder = builder.routing(routing.clone());
                }
                (INDEX_ROUTING_FIELD | "indexRouting", Value::String(routing)) => {
                    builder = builder.index_routing(routing.clone());
                }
                (SEARCH_ROUTING_FIELD | "searchRouting", Value::String(routing)) => {
                    builder = builder.search_routing(routing.clone());
                }
                (IS_WRITE_INDEX_FIELD, Value::Bool(write_index)) => {
                    builder = builder.write_index(Some(*write_index));
                }
                (IS_HIDDEN_FIELD, Value::Bool(hidden)) => {
                    builder = builder.is_hidden(Some(*hidden));
                }
                _ => {}
            }
        }
        Ok(builder.build())
    }

    /// Document body written under the alias name.
    pub fn to_document(&self) -> MetadataResult<Value> {
        let mut body = Map::new();
        if let Some(filter) = &self.filter {
            body.insert(FILTER_FIELD.to_string(), filter.to_json()?);
        }
        if let Some(routing) = &self.index_routing {
            body.insert(INDEX_ROUTING_FIELD.to_string(), Value::String(routing.clone()));
        }
        if let Some(routing) = &self.search_routing {
            body.insert(SEARCH_ROUTING_FIELD.to_string(), Value::String(routing.clone()));
        }
        if let Some(write_index) = self.write_index {
            body.insert(IS_WRITE_INDEX_FIELD.to_string(), Value::Bool(write_index));
        }
        if let Some(hidden) = self.is_hidden {
            body.insert(IS_HIDDEN_FIELD.to_string(), Value::Bool(hidden));
        }
        Ok(Value::Object(body))
    }

    pub fn write_to(&self, out: &mut StreamOutput) {
        out.write_string(&self.name);
        match &self.filter {
            Some(filter) => {
                out.write_bool(true);
                filter.write_to(out);
            }
            None => out.write_bool(false),
        }
        out.write_optional_string(self.index_routing.as_deref());
        out.write_optional_string(self.search_routing.as_deref());
        out.write_optional_bool(self.write_index);
        out.write_optional_bool(self.is_hidden);
    }

    pub fn read_from(input: &mut StreamInput<'_>) -> MetadataResult<Self> {
        let name = input.read_string()?;
        let filter = if input.read_bool()? {
            Some(CompressedPayload::read_from(input)?)
        } else {
            None
        };
        let index_routing = input.read_optional_string()?;
        let search_routing = input.read_optional_string()?;
        let write_index = input.read_optional_bool()?;
        let is_hidden = input.read_optional_bool()?;

        let mut builder = AliasBuilder::new(name)
            .write_index(write_index)
            .is_hidden(is_hidden);
        builder.filter = filter;
        builder.index_routing = index_routing;
        builder.search_routing = search_routing;
        Ok(builder.build())
    }
}

/// An empty filter object means no filter.
fn filter_from_object(filter: &Map<String, Value>) -> MetadataResult<Option<CompressedPayload>> {
    if filter.is_empty() {
        return Ok(None);
    }
    CompressedPayload::from_json(&Value::Object(filter.clone())).map(Some)
}

fn filter_from_base64(alias: &str, encoded: &str) -> MetadataResult<Option<CompressedPayload>> {
    let bytes = BASE64.decode(encoded).map_err(|e| {
        MetadataError::decode(format!("invalid base64 filter for alias [{}]: {}", alias, e))
    })?;
    if bytes.is_empty() {
        return Ok(None);
    }
    CompressedPayload::from_auto_detected(&bytes).map(Some)
}

/// Splits on commas keeping whitespace, dropping trailing empty tokens.
fn split_search_routing(routing: Option<&str>) -> BTreeSet<String> {
    let Some(routing) = routing.filter(|r| !r.is_empty()) else {
        return BTreeSet::new();
    };
    let mut tokens: Vec<&str> = routing.split(',').collect();
    while tokens.last().is_some_and(|t| t.is_empty()) {
        tokens.pop();
    }
    tokens.into_iter().map(str::to_string).collect()
}

/// Mutable construction of an [`AliasEntry`].
#[derive(Debug, Clone)]
pub struct AliasBuilder {
    name: String,
    filter: Option<CompressedPayload>,
    index_routing: Option<String>,
    search_routing: Option<String>,
    write_index: Option<bool>,
    is_hidden: Option<bool>,
}

impl AliasBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filter: None,
            index_routing: None,
            search_routing: None,
            write_index: None,
            is_hidden: None,
        }
    }

    pub fn from_entry(entry: &AliasEntry) -> Self {
        Self {
            name: entry.name.clone(),
            filter: entry.filter.clone(),
            index_routing: entry.index_routing.clone(),
            search_routing: entry.search_routing.clone(),
            write_index: entry.write_index,
            is_hidden: entry.is_hidden,
        }
    }

    fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn filter(mut self, filter: Option<CompressedPayload>) -> Self {
        self.filter = filter;
        self
    }

    pub fn index_routing(mut self, routing: impl Into<String>) -> Self {
        self.index_routing = Some(routing.into());
        self
    }

    pub fn search_routing(mut self, routing: impl Into<String>) -> Self {
        self.search_routing = Some(routing.into());
        self
    }

    /// Sets index and search routing to the same value.
    pub fn routing(mut self, routing: impl Into<String>) -> Self {
        let routing = routing.into();
        self.index_routing = Some(routing.clone());
        self.search_routing = Some(routing);
        self
    }

    pub fn write_index(mut self, write_index: Option<bool>) -> Self {
        self.write_index = write_index;
        self
    }

    pub fn is_hidden(mut self, is_hidden: Option<bool>) -> Self {
        self.is_hidden = is_hidden;
        self
    }

    pub fn build(self) -> AliasEntry {
        let search_routing_values = split_search_routing(self.search_routing.as_deref());
        AliasEntry {
            name: self.name,
            filter: self.filter,
            index_routing: self.index_routing,
            search_routing: self.search_routing,
            search_routing_values,
            write_index: self.write_index,
            is_hidden: self.is_hidden,
        }
    }
}
