//! Index context reference

use serde_json::{Map, Value};

use crate::errors::{MetadataError, MetadataResult};
use crate::stream::{StreamInput, StreamOutput};

const NAME_FIELD: &str = "name";
const VERSION_FIELD: &str = "version";
const PARAMS_FIELD: &str = "params";

/// Named, versioned context applied to an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    name: String,
    version: String,
    params: Option<Map<String, Value>>,
}

impl ContextEntry {
    /// Version used when none is given.
    pub const LATEST_VERSION: &'static str = "_latest";

    pub fn new(
        name: impl Into<String>,
        version: Option<String>,
        params: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.unwrap_or_else(|| Self::LATEST_VERSION.to_string()),
            params,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn params(&self) -> Option<&Map<String, Value>> {
        self.params.as_ref()
    }

    /// Strict decode: `name` is required and unknown fields are rejected.
    pub fn from_document(document: &Value) -> MetadataResult<Self> {
        let fields = document.as_object().ok_or_else(|| {
            MetadataError::decode(format!("expected an object for context but found [{}]", document))
        })?;

        let mut name = None;
        let mut version = None;
        let mut params = None;
        for (field, value) in fields {
            match (field.as_str(), value) {
                (NAME_FIELD, Value::String(s)) => name = Some(s.clone()),
                (VERSION_FIELD, Value::String(s)) => version = Some(s.clone()),
                (VERSION_FIELD | PARAMS_FIELD, Value::Null) => {}
                (PARAMS_FIELD, Value::Object(map)) => params = Some(map.clone()),
                (NAME_FIELD | VERSION_FIELD | PARAMS_FIELD, other) => {
                    return Err(MetadataError::decode(format!(
                        "[context] failed to parse field [{}]: unexpected value [{}]",
                        field, other
                    )))
                }
                (unknown, _) => {
                    return Err(MetadataError::decode(format!(
                        "[context] unknown field [{}]",
                        unknown
                    )))
                }
            }
        }

        let name = name.ok_or_else(|| {
            MetadataError::decode("[context] failed to parse: required field [name] is missing")
        })?;
        Ok(Self::new(name, version, params))
    }

    pub fn to_document(&self) -> Value {
        let mut body = Map::new();
        body.insert(NAME_FIELD.to_string(), Value::String(self.name.clone()));
        body.insert(VERSION_FIELD.to_string(), Value::String(self.version.clone()));
        if let Some(params) = &self.params {
            body.insert(PARAMS_FIELD.to_string(), Value::Object(params.clone()));
        }
        Value::Object(body)
    }

    pub fn write_to(&self, out: &mut StreamOutput) {
        out.write_string(&self.name);
        out.write_optional_string(Some(&self.version));
        out.write_map(self.params.as_ref());
    }

    pub fn read_from(input: &mut StreamInput<'_>) -> MetadataResult<Self> {
        let name = input.read_string()?;
        let version = input.read_optional_string()?;
        let params = input.read_map()?;
        Ok(Self::new(name, version, params))
    }
}
