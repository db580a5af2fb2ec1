//! Shared fixtures for integration tests

#![allow(dead_code)]

use idxmeta::remote::{CODEC_MAGIC, FOOTER_MAGIC, INDEX_METADATA_CODEC};
use idxmeta::stream::{StreamInput, StreamOutput};
use idxmeta::{
    AliasEntry, IndexMetadata, IndexState, MappingEntry, MetadataResult, OpaqueValue,
    SettingsView, WireExtensions,
};
use serde_json::json;

/// Wrap `content` in a checksum frame with the given codec name and version.
pub fn write_frame(codec: &str, version: i32, content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + codec.len() + 32);
    out.extend_from_slice(&CODEC_MAGIC.to_be_bytes());
    assert!(codec.len() < 0x80, "codec name too long for a single-byte vint");
    out.push(codec.len() as u8);
    out.extend_from_slice(codec.as_bytes());
    out.extend_from_slice(&version.to_be_bytes());
    out.extend_from_slice(content);
    out.extend_from_slice(&FOOTER_MAGIC.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());
    let crc = crc32fast::hash(&out);
    out.extend_from_slice(&u64::from(crc).to_be_bytes());
    out
}

/// Frame for the index metadata codec at version 1.
pub fn metadata_frame(content: &[u8]) -> Vec<u8> {
    write_frame(INDEX_METADATA_CODEC, 1, content)
}

/// The "orders" record used across integration tests.
pub fn orders() -> IndexMetadata {
    let mapping = MappingEntry::from_content(
        "_doc",
        &json!({"properties": {"sku": {"type": "keyword"}, "qty": {"type": "integer"}}}),
    )
    .unwrap();

    IndexMetadata::builder("orders")
        .version(10)
        .mapping_version(5)
        .settings_version(3)
        .aliases_version(2)
        .routing_num_shards(32)
        .state(IndexState::Open)
        .settings(SettingsView::normalize(vec![("index.number_of_shards", json!("3"))]))
        .primary_terms(vec![1, 2, 3])
        .put_mapping(mapping)
        .put_alias(AliasEntry::builder("orders_alias").index_routing("r1").build())
        .system(false)
        .build()
}

fn string_value(value: &OpaqueValue) -> &str {
    value.downcast_ref::<String>().map(String::as_str).unwrap_or("")
}

fn read_string_value(input: &mut StreamInput<'_>) -> MetadataResult<OpaqueValue> {
    Ok(OpaqueValue::new(input.read_string()?))
}

fn write_string_value(value: &OpaqueValue, out: &mut StreamOutput) -> MetadataResult<()> {
    out.write_string(string_value(value));
    Ok(())
}

/// Extension hooks that store every entry as a single string.
pub fn string_extensions() -> WireExtensions {
    WireExtensions::none()
        .with_custom_data_reader(read_string_value)
        .with_custom_data_writer(write_string_value)
        .with_rollover_reader(read_string_value, |value| string_value(value).to_string())
        .with_rollover_writer(write_string_value)
}
