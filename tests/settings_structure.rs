//! Settings normalization through the record codecs
//!
//! Settings travel flat on the wire and in persisted documents, and nested
//! in API documents. These tests exercise both paths end to end.

mod common;

use idxmeta::stream::{StreamInput, StreamOutput};
use idxmeta::{
    DocumentExtensions, DocumentParams, IndexMetadata, SettingValue, SettingsView, WireExtensions,
    WireVersion,
};
use serde_json::{json, Value};

fn record_with(settings: SettingsView) -> IndexMetadata {
    common::orders().to_builder().settings(settings).build()
}

#[test]
fn test_promotion_drops_scalar_prefix() {
    let view = SettingsView::normalize(vec![("a", json!("x")), ("a.b", json!("y"))]);

    let nested = view.flatten();
    assert_eq!(nested, json!({"a": {"b": "y"}}));

    let back = SettingsView::unflatten(&nested).unwrap();
    assert_eq!(back.len(), 1);
    assert_eq!(back.get_str("a.b"), Some("y"));
    assert!(back.get("a").is_none());
}

#[test]
fn test_nested_api_settings_round_trip() {
    let settings = SettingsView::normalize(vec![
        ("index.number_of_shards", json!(3)),
        ("index.refresh_interval", json!("1s")),
        ("index.routing.allocation.include._tier", json!("hot")),
        ("index.blocks.write", json!(true)),
        ("index.analysis.filter.stop.stopwords", json!(["a", "the"])),
        ("index.hidden", json!(null)),
    ]);
    assert_eq!(settings.get_str("index.number_of_shards"), Some("3"));
    assert_eq!(settings.get_str("index.blocks.write"), Some("true"));

    let record = record_with(settings.clone());
    let document = record
        .to_document(&DocumentParams::api(), &DocumentExtensions::none())
        .unwrap();
    let nested = &document["orders"]["settings"];
    assert_eq!(nested["index"]["routing"]["allocation"]["include"]["_tier"], json!("hot"));
    assert_eq!(nested["index"]["analysis"]["filter"]["stop"]["stopwords"], json!(["a", "the"]));

    let decoded = IndexMetadata::from_document(&document, &DocumentExtensions::none()).unwrap();
    assert_eq!(decoded.settings(), &settings);
    assert_eq!(
        decoded.settings().get("index.hidden"),
        Some(&SettingValue::Null)
    );
}

#[test]
fn test_settings_survive_wire_encoding() {
    let settings = SettingsView::normalize(vec![
        ("index.number_of_replicas", json!(1)),
        ("index.sort.field", json!(["ts", "id"])),
        ("index.codec", json!(null)),
    ]);
    let record = record_with(settings.clone());

    for version in [WireVersion::new(2, 16, 0), WireVersion::CURRENT] {
        let bytes = record.to_bytes(version, &WireExtensions::none()).unwrap();
        let decoded = IndexMetadata::from_bytes(&bytes, version, &WireExtensions::none()).unwrap();
        assert_eq!(decoded.settings(), &settings);
    }
}

#[test]
fn test_mixed_list_is_kept_verbatim() {
    let mut out = StreamOutput::new(WireVersion::CURRENT);
    out.write_vint(1);
    out.write_string("index.sort.missing");
    out.write_generic_value(&json!(["a", null, 7]));
    let original = out.into_bytes();

    let mut input = StreamInput::new(&original, WireVersion::CURRENT);
    let view = SettingsView::read_from(&mut input).unwrap();
    assert_eq!(input.remaining(), 0);
    assert_eq!(
        view.get("index.sort.missing"),
        Some(&SettingValue::List(vec![json!("a"), Value::Null, json!(7)]))
    );

    let mut again = StreamOutput::new(WireVersion::CURRENT);
    view.write_to(&mut again);
    assert_eq!(again.into_bytes(), original);

    let nested = view.flatten();
    assert_eq!(nested["index"]["sort"]["missing"], json!(["a", null, 7]));
    assert_eq!(SettingsView::unflatten(&nested).unwrap(), view);
}
