//! Normalized index settings
//!
//! Settings are a sorted map from dotted key to a string, a list, or an
//! explicit null. Lists keep their elements untouched; any other value
//! handed to `normalize` is stringified.
//! `flatten` and `unflatten` convert between this dotted form and the nested
//! tree used in structured documents.

mod structured;

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::errors::{MetadataError, MetadataResult};
use crate::stream::{StreamInput, StreamOutput};

/// A single normalized setting value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Null,
    String(String),
    /// Elements in their original order and types
    List(Vec<Value>),
}

impl SettingValue {
    /// Normalizes an arbitrary value: lists and null are kept as they are,
    /// everything else becomes its string form.
    pub fn normalize(value: Value) -> Self {
        match value {
            Value::Null => SettingValue::Null,
            Value::Array(items) => SettingValue::List(items),
            Value::String(s) => SettingValue::String(s),
            other => SettingValue::String(other.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            SettingValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            SettingValue::Null => Value::Null,
            SettingValue::String(s) => Value::String(s.clone()),
            SettingValue::List(items) => Value::Array(items.clone()),
        }
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::String(s.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        SettingValue::String(s)
    }
}

/// Text of a scalar document value; containers and null have none.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Immutable, sorted settings map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsView {
    entries: BTreeMap<String, SettingValue>,
}

impl SettingsView {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn normalize<I, K>(raw: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let entries = raw
            .into_iter()
            .map(|(k, v)| (k.into(), SettingValue::normalize(v)))
            .collect();
        Self { entries }
    }

    /// Builds from already-normalized values.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, SettingValue)>,
        K: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.entries.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(SettingValue::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Dotted keys as a single-level document object.
    pub fn to_flat_value(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_value()))
            .collect();
        Value::Object(map)
    }

    /// Nested document tree, see [`structured::flatten`].
    pub fn flatten(&self) -> Value {
        structured::flatten(&self.entries)
    }

    /// Walks a nested document back into dotted keys.
    pub fn unflatten(document: &Value) -> MetadataResult<Self> {
        match document {
            Value::Object(map) => Ok(Self {
                entries: structured::unflatten(map),
            }),
            other => Err(MetadataError::decode(format!(
                "settings must be an object, found [{}]",
                other
            ))),
        }
    }

    pub fn write_to(&self, out: &mut StreamOutput) {
        out.write_len(self.entries.len());
        for (key, value) in &self.entries {
            out.write_string(key);
            out.write_generic_value(&value.to_value());
        }
    }

    pub fn read_from(input: &mut StreamInput<'_>) -> MetadataResult<Self> {
        let count = input.read_len()?;
        let mut entries = BTreeMap::new();
        for _ in 0..count {
            let key = input.read_string()?;
            let value = input.read_generic_value()?;
            entries.insert(key, SettingValue::normalize(value));
        }
        Ok(Self { entries })
    }
}
