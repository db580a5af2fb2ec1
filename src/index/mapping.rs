//! Field-mapping definition for one mapping type

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{Map, Value};

use crate::compress::CompressedPayload;
use crate::document::DocumentParams;
use crate::errors::{MetadataError, MetadataResult};
use crate::stream::{StreamInput, StreamOutput};

const ROUTING_FIELD: &str = "_routing";
const REQUIRED_FIELD: &str = "required";

/// A mapping type and its compressed source.
///
/// The source is stored wrapped in its type name: `{"<type>": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MappingEntry {
    type_name: String,
    source: CompressedPayload,
    routing_required: bool,
}

impl MappingEntry {
    pub fn new(type_name: impl Into<String>, source: CompressedPayload, routing_required: bool) -> Self {
        Self {
            type_name: type_name.into(),
            source,
            routing_required,
        }
    }

    /// Builds an entry from the bare mapping body of `type_name`.
    ///
    /// `routing_required` is taken from `_routing.required`, which may be a
    /// boolean or a boolean-valued string.
    pub fn from_content(type_name: &str, content: &Value) -> MetadataResult<Self> {
        let body = content.as_object().ok_or_else(|| {
            MetadataError::decode(format!(
                "expected an object for mapping [{}] but found [{}]",
                type_name, content
            ))
        })?;

        let routing_required = routing_required(body);

        let mut wrapped = Map::new();
        wrapped.insert(type_name.to_string(), content.clone());
        let source = CompressedPayload::from_json(&Value::Object(wrapped))?;

        Ok(Self::new(type_name, source, routing_required))
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn source(&self) -> &CompressedPayload {
        &self.source
    }

    pub fn routing_required(&self) -> bool {
        self.routing_required
    }

    /// The full wrapped source as a document object.
    pub fn source_map(&self) -> MetadataResult<Map<String, Value>> {
        match self.source.to_json()? {
            Value::Object(map) => Ok(map),
            other => Err(MetadataError::decode(format!(
                "mapping source for [{}] is not an object: [{}]",
                self.type_name, other
            ))),
        }
    }

    /// The mapping body with the type wrapper removed when present.
    pub fn content(&self) -> MetadataResult<Value> {
        let mut source = self.source_map()?;
        if source.len() == 1 {
            if let Some(inner) = source.remove(&self.type_name) {
                return Ok(inner);
            }
        }
        Ok(Value::Object(source))
    }

    /// Non-API document element: the wrapped source, or its compressed
    /// bytes as base64 text when `binary` is set.
    pub fn to_document_element(&self, params: &DocumentParams) -> MetadataResult<Value> {
        if params.binary {
            Ok(Value::String(BASE64.encode(self.source.compressed_bytes())))
        } else {
            Ok(Value::Object(self.source_map()?))
        }
    }

    /// Decodes one element of a non-API `mappings` array.
    ///
    /// Strings carry base64 source bytes, compressed or not. Objects must
    /// hold exactly one type; anything else is ignored.
    pub fn from_document_element(element: &Value) -> MetadataResult<Option<Self>> {
        match element {
            Value::String(encoded) => {
                let bytes = BASE64.decode(encoded).map_err(|e| {
                    MetadataError::decode(format!("invalid base64 mapping source: {}", e))
                })?;
                let payload = CompressedPayload::from_auto_detected(&bytes)?;
                let source = payload.to_json()?;
                match source.as_object().and_then(|m| m.iter().next()) {
                    Some((type_name, content)) => Self::from_content(type_name, content).map(Some),
                    None => Err(MetadataError::decode(
                        "binary mapping source does not name a mapping type",
                    )),
                }
            }
            Value::Object(map) if map.len() == 1 => match map.iter().next() {
                Some((type_name, content)) => Self::from_content(type_name, content).map(Some),
                None => Ok(None),
            },
            _ => Ok(None),
        }
    }

    pub fn write_to(&self, out: &mut StreamOutput) {
        out.write_string(&self.type_name);
        self.source.write_to(out);
        out.write_bool(self.routing_required);
    }

    pub fn read_from(input: &mut StreamInput<'_>) -> MetadataResult<Self> {
        let type_name = input.read_string()?;
        let source = CompressedPayload::read_from(input)?;
        let routing_required = input.read_bool()?;
        Ok(Self::new(type_name, source, routing_required))
    }
}

fn routing_required(body: &Map<String, Value>) -> bool {
    match body
        .get(ROUTING_FIELD)
        .and_then(Value::as_object)
        .and_then(|routing| routing.get(REQUIRED_FIELD))
    {
        Some(Value::Bool(required)) => *required,
        Some(Value::String(required)) => required.eq_ignore_ascii_case("true"),
        _ => false,
    }
}
