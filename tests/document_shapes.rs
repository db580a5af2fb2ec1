//! Document codec shape tests
//!
//! The same record renders differently per context mode:
//! - API: alias names only, primary terms keyed by shard, nested settings
//! - GATEWAY/SNAPSHOT: full alias entries, primary-term array, flat settings

mod common;

use common::orders;
use idxmeta::{
    AliasEntry, CompressedPayload, ContextEntry, ContextMode, DocumentExtensions, DocumentParams,
    ErrorCode, IndexMetadata, MetadataResult, OpaqueValue,
};
use serde_json::{json, Value};

// =============================================================================
// Test Utilities
// =============================================================================

fn parse_value(_key: &str, value: &Value) -> MetadataResult<OpaqueValue> {
    Ok(OpaqueValue::new(value.clone()))
}

fn write_value(_key: &str, value: &OpaqueValue) -> MetadataResult<Value> {
    Ok(value.downcast_ref::<Value>().cloned().unwrap_or(Value::Null))
}

fn value_extensions() -> DocumentExtensions {
    DocumentExtensions::none()
        .with_custom_data_parser(parse_value)
        .with_custom_data_writer(write_value)
        .with_rollover_parser(parse_value)
        .with_rollover_writer(write_value)
}

fn round_trip(record: &IndexMetadata, params: DocumentParams, ext: &DocumentExtensions) -> IndexMetadata {
    let document = record.to_document(&params, ext).unwrap();
    IndexMetadata::from_document(&document, ext).unwrap()
}

// =============================================================================
// API Shape
// =============================================================================

#[test]
fn test_api_shape_for_orders() {
    let document = orders()
        .to_document(&DocumentParams::api(), &DocumentExtensions::none())
        .unwrap();
    let body = &document["orders"];

    assert_eq!(body["aliases"], json!(["orders_alias"]));
    assert_eq!(body["primary_terms"], json!({"0": 1, "1": 2, "2": 3}));
    assert_eq!(body["settings"], json!({"index": {"number_of_shards": "3"}}));
    assert_eq!(body["state"], json!("open"));
    assert_eq!(body["version"], json!(10));
    assert_eq!(body["routing_num_shards"], json!(32));
    assert_eq!(body["system"], json!(false));
    assert_eq!(
        body["mappings"]["_doc"]["properties"]["sku"]["type"],
        json!("keyword")
    );
    assert!(body.get("rollover_info").is_none());
    assert!(body.get("context").is_none());
}

#[test]
fn test_api_round_trip_reduces_aliases_to_names() {
    let original = orders();
    let decoded = round_trip(&original, DocumentParams::api(), &DocumentExtensions::none());

    assert_eq!(decoded.version(), original.version());
    assert_eq!(decoded.mapping_version(), original.mapping_version());
    assert_eq!(decoded.routing_num_shards(), original.routing_num_shards());
    assert_eq!(decoded.primary_terms(), original.primary_terms());
    assert_eq!(decoded.settings(), original.settings());
    assert_eq!(decoded.mappings(), original.mappings());

    let alias = &decoded.aliases()["orders_alias"];
    assert_eq!(alias, &AliasEntry::named("orders_alias"));
    assert_ne!(decoded, original);
}

// =============================================================================
// Persisted Shapes
// =============================================================================

#[test]
fn test_gateway_shape_and_full_round_trip() {
    let original = orders()
        .to_builder()
        .put_alias(
            AliasEntry::builder("recent")
                .filter(Some(CompressedPayload::from_json(&json!({"range": {"ts": {"gte": "now-1d"}}})).unwrap()))
                .search_routing("1,2")
                .write_index(Some(true))
                .build(),
        )
        .put_in_sync_allocation_ids(1, ["a1"])
        .context(Some(ContextEntry::new("analytics", None, None)))
        .ingestion_paused(Some(false))
        .build();
    let params = DocumentParams::with_mode(ContextMode::Gateway);

    let document = original.to_document(&params, &DocumentExtensions::none()).unwrap();
    let body = &document["orders"];
    assert_eq!(body["primary_terms"], json!([1, 2, 3]));
    assert_eq!(body["settings"], json!({"index.number_of_shards": "3"}));
    assert_eq!(body["aliases"]["orders_alias"], json!({"index_routing": "r1"}));
    assert_eq!(body["aliases"]["recent"]["filter"]["range"]["ts"]["gte"], json!("now-1d"));
    assert_eq!(body["in_sync_allocations"], json!({"1": ["a1"]}));
    assert_eq!(body["context"], json!({"name": "analytics", "version": "_latest"}));
    assert_eq!(body["ingestion_status"], json!({"is_paused": false}));
    assert!(body["mappings"].is_array());

    let decoded = IndexMetadata::from_document(&document, &DocumentExtensions::none()).unwrap();
    assert_eq!(decoded, original);
    assert_eq!(
        decoded.aliases()["recent"].search_routing_values().iter().collect::<Vec<_>>(),
        vec!["1", "2"]
    );
}

#[test]
fn test_binary_mappings_round_trip() {
    let original = orders();
    let params = DocumentParams::with_mode(ContextMode::Snapshot).binary(true);

    let document = original.to_document(&params, &DocumentExtensions::none()).unwrap();
    let element = &document["orders"]["mappings"][0];
    assert!(element.is_string());

    let decoded = IndexMetadata::from_document(&document, &DocumentExtensions::none()).unwrap();
    assert_eq!(decoded, original);
}

// =============================================================================
// Extension Slots
// =============================================================================

#[test]
fn test_custom_data_and_rollover_with_hooks() {
    let ext = value_extensions();
    let original = orders()
        .to_builder()
        .put_custom_data("my_plugin", OpaqueValue::new(json!({"enabled": "true"})))
        .put_rollover_info("orders_alias", OpaqueValue::new(json!({"met_conditions": {}, "time": 1})))
        .build();

    let document = original
        .to_document(&DocumentParams::with_mode(ContextMode::Gateway), &ext)
        .unwrap();
    assert_eq!(document["orders"]["my_plugin"], json!({"enabled": "true"}));
    assert_eq!(document["orders"]["rollover_info"]["orders_alias"]["time"], json!(1));

    let decoded = IndexMetadata::from_document(&document, &ext).unwrap();
    let custom = decoded.custom_data().unwrap();
    assert_eq!(
        custom["my_plugin"].downcast_ref::<Value>(),
        Some(&json!({"enabled": "true"}))
    );
    assert!(decoded.rollover_infos().unwrap().contains_key("orders_alias"));
}

#[test]
fn test_rollover_slot_written_empty_when_writer_present() {
    let document = orders()
        .to_document(&DocumentParams::api(), &value_extensions())
        .unwrap();
    assert_eq!(document["orders"]["rollover_info"], json!({}));

    let decoded = IndexMetadata::from_document(&document, &value_extensions()).unwrap();
    assert!(decoded.rollover_infos().unwrap().is_empty());
    assert!(decoded.custom_data().unwrap().is_empty());
}

#[test]
fn test_extension_subtrees_skipped_without_hooks() {
    let document = json!({"orders": {
        "version": 3,
        "my_plugin": {"nested": {"deep": [1, 2, {"x": null}]}},
        "rollover_info": {"orders_alias": {"time": 5}},
        "primary_terms": [4]
    }});
    let decoded = IndexMetadata::from_document(&document, &DocumentExtensions::none()).unwrap();
    assert_eq!(decoded.version(), 3);
    assert_eq!(decoded.primary_terms(), &[4]);
    assert!(decoded.custom_data().is_none());
    assert!(decoded.rollover_infos().is_none());
}

// =============================================================================
// Strict Decode
// =============================================================================

#[test]
fn test_unknown_scalar_field_is_rejected() {
    let document = json!({"orders": {"version": 1, "surprise": "x"}});
    let err = IndexMetadata::from_document(&document, &DocumentExtensions::none()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnknownField);
    assert!(err.to_string().contains("surprise"));
}

#[test]
fn test_primary_terms_with_gap_rejected() {
    let document = json!({"orders": {"primary_terms": {"0": 1, "2": 3}}});
    let err = IndexMetadata::from_document(&document, &DocumentExtensions::none()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Decode);
}

#[test]
fn test_json_bytes_round_trip() {
    let original = orders();
    let params = DocumentParams::with_mode(ContextMode::Gateway);
    let bytes = original.to_json_bytes(&params, &DocumentExtensions::none()).unwrap();
    let decoded = IndexMetadata::from_json_slice(&bytes, &DocumentExtensions::none()).unwrap();
    assert_eq!(decoded, original);
}
