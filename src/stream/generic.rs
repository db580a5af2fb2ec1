//! Self-describing generic values
//!
//! Generic values travel as a type tag followed by the payload. On this side
//! they are held as `serde_json::Value`, the same tree the document codec
//! uses.

use serde_json::{Map, Number, Value};

use crate::errors::{MetadataError, MetadataResult};

use super::value_type;
use super::{StreamInput, StreamOutput};

/// Nesting bound for generic values read off the wire.
const MAX_DEPTH: usize = 128;

impl StreamOutput {
    /// Integers that fit 32 bits go out as `int`, other integers as `long`,
    /// everything else numeric as `double`. Objects keep their key order.
    pub fn write_generic_value(&mut self, value: &Value) {
        match value {
            Value::Null => self.write_byte(value_type::NULL as u8),
            Value::String(s) => {
                self.write_byte(value_type::STRING as u8);
                self.write_string(s);
            }
            Value::Bool(b) => {
                self.write_byte(value_type::BOOLEAN as u8);
                self.write_bool(*b);
            }
            Value::Number(n) => self.write_number(n),
            Value::Array(items) => {
                self.write_byte(value_type::LIST as u8);
                self.write_len(items.len());
                for item in items {
                    self.write_generic_value(item);
                }
            }
            Value::Object(map) => {
                self.write_byte(value_type::ORDERED_MAP as u8);
                self.write_object(map);
            }
        }
    }

    fn write_number(&mut self, n: &Number) {
        if let Some(i) = n.as_i64() {
            if let Ok(small) = i32::try_from(i) {
                self.write_byte(value_type::INT as u8);
                self.write_int(small);
            } else {
                self.write_byte(value_type::LONG as u8);
                self.write_long(i);
            }
        } else if let Some(u) = n.as_u64() {
            // above i64::MAX; only representable as double
            self.write_byte(value_type::DOUBLE as u8);
            self.write_double(u as f64);
        } else {
            self.write_byte(value_type::DOUBLE as u8);
            self.write_double(n.as_f64().unwrap_or_default());
        }
    }

    fn write_object(&mut self, map: &Map<String, Value>) {
        self.write_len(map.len());
        for (key, value) in map {
            self.write_string(key);
            self.write_generic_value(value);
        }
    }

    /// Optional string-keyed map; absent is written as the null tag.
    pub fn write_map(&mut self, map: Option<&Map<String, Value>>) {
        match map {
            Some(map) => {
                self.write_byte(value_type::ORDERED_MAP as u8);
                self.write_object(map);
            }
            None => self.write_byte(value_type::NULL as u8),
        }
    }
}

impl<'a> StreamInput<'a> {
    pub fn read_generic_value(&mut self) -> MetadataResult<Value> {
        self.read_generic_at_depth(0)
    }

    fn read_generic_at_depth(&mut self, depth: usize) -> MetadataResult<Value> {
        if depth > MAX_DEPTH {
            return Err(MetadataError::decode(format!(
                "generic value nested deeper than {}",
                MAX_DEPTH
            )));
        }

        let tag = self.read_byte()? as i8;
        let value = match tag {
            value_type::NULL => Value::Null,
            value_type::STRING => Value::String(self.read_string()?),
            value_type::INT => Value::from(self.read_int()?),
            value_type::LONG => Value::from(self.read_long()?),
            value_type::FLOAT => float_value(self.read_float()? as f64)?,
            value_type::DOUBLE => float_value(self.read_double()?)?,
            value_type::BOOLEAN => Value::Bool(self.read_bool()?),
            value_type::LIST | value_type::OBJECT_ARRAY => {
                let len = self.read_len()?;
                let mut items = Vec::with_capacity(len.min(self.remaining()));
                for _ in 0..len {
                    items.push(self.read_generic_at_depth(depth + 1)?);
                }
                Value::Array(items)
            }
            value_type::ORDERED_MAP | value_type::HASH_MAP => {
                Value::Object(self.read_object(depth)?)
            }
            value_type::BYTE => Value::from(self.read_byte()? as i8),
            value_type::SHORT => Value::from(self.read_short()?),
            other => {
                return Err(MetadataError::decode(format!(
                    "can't read unknown generic value type [{}]",
                    other
                )))
            }
        };
        Ok(value)
    }

    fn read_object(&mut self, depth: usize) -> MetadataResult<Map<String, Value>> {
        let len = self.read_len()?;
        let mut map = Map::new();
        for _ in 0..len {
            let key = self.read_string()?;
            let value = self.read_generic_at_depth(depth + 1)?;
            map.insert(key, value);
        }
        Ok(map)
    }

    /// Inverse of `StreamOutput::write_map`.
    pub fn read_map(&mut self) -> MetadataResult<Option<Map<String, Value>>> {
        match self.read_generic_value()? {
            Value::Null => Ok(None),
            Value::Object(map) => Ok(Some(map)),
            other => Err(MetadataError::decode(format!(
                "expected a map but read [{}]",
                other
            ))),
        }
    }
}

fn float_value(f: f64) -> MetadataResult<Value> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| MetadataError::decode(format!("non-finite number [{}] in generic value", f)))
}
