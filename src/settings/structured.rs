//! Dotted-key and nested-tree conversions

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::{scalar_text, SettingValue};

enum Node {
    Leaf(Value),
    Branch(BTreeMap<String, Node>),
}

/// Splits dotted keys into nested objects.
///
/// A key that extends through an existing scalar prefix replaces that scalar
/// with an object, so `{"a": "x", "a.b": "y"}` becomes `{"a": {"b": "y"}}`.
/// Below the top level, an object whose keys are exactly `"0".."N-1"` is
/// turned into an array.
pub(super) fn flatten(entries: &BTreeMap<String, SettingValue>) -> Value {
    let mut root: BTreeMap<String, Node> = BTreeMap::new();
    for (key, value) in entries {
        insert(&mut root, key, value.to_value());
    }

    let map: Map<String, Value> = root
        .into_iter()
        .map(|(k, node)| (k, node_to_value(node)))
        .collect();
    Value::Object(map)
}

fn insert(map: &mut BTreeMap<String, Node>, key: &str, value: Value) {
    match key.split_once('.') {
        None => {
            // the nested form wins over a scalar at the same key
            if let Some(Node::Branch(_)) = map.get(key) {
                return;
            }
            map.insert(key.to_string(), Node::Leaf(value));
        }
        Some((head, rest)) => {
            let entry = map
                .entry(head.to_string())
                .or_insert_with(|| Node::Branch(BTreeMap::new()));
            if matches!(entry, Node::Leaf(_)) {
                *entry = Node::Branch(BTreeMap::new());
            }
            if let Node::Branch(inner) = entry {
                insert(inner, rest, value);
            }
        }
    }
}

fn node_to_value(node: Node) -> Value {
    match node {
        Node::Leaf(value) => value,
        Node::Branch(children) => {
            let mut converted: BTreeMap<String, Value> = children
                .into_iter()
                .map(|(k, child)| (k, node_to_value(child)))
                .collect();

            let is_dense_array = !converted.is_empty()
                && (0..converted.len()).all(|i| converted.contains_key(&i.to_string()));
            if is_dense_array {
                let items = (0..converted.len())
                    .filter_map(|i| converted.remove(&i.to_string()))
                    .collect();
                Value::Array(items)
            } else {
                Value::Object(converted.into_iter().collect())
            }
        }
    }
}

/// Inverse of [`flatten`]: objects become dotted prefixes, arrays are kept
/// as lists element for element, null stays an explicit null.
pub(super) fn unflatten(document: &Map<String, Value>) -> BTreeMap<String, SettingValue> {
    let mut out = BTreeMap::new();
    walk("", document, &mut out);
    out
}

fn walk(prefix: &str, object: &Map<String, Value>, out: &mut BTreeMap<String, SettingValue>) {
    for (name, value) in object {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };

        match value {
            Value::Object(inner) => walk(&key, inner, out),
            Value::Array(items) => {
                out.insert(key, SettingValue::List(items.clone()));
            }
            Value::Null => {
                out.insert(key, SettingValue::Null);
            }
            scalar => {
                if let Some(text) = scalar_text(scalar) {
                    out.insert(key, SettingValue::String(text));
                }
            }
        }
    }
}
