//! Tests for the decode module

use super::*;
use crate::types::Format;
use pretty_assertions::assert_eq;
use serde_json::json;

// ============================================================================
// XML Reader Tests
// ============================================================================

#[test]
fn test_xml_text_elements_stay_strings() {
    let (tag, value) = xml::parse("<computer><general><id>42</id><name>mac-01</name></general></computer>")
        .unwrap();
    assert_eq!(tag, "computer");
    assert_eq!(value, json!({"general": {"id": "42", "name": "mac-01"}}));
}

#[test]
fn test_xml_repeated_tags_become_array() {
    let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<computers>
  <size>2</size>
  <computer><id>1</id><name>a</name></computer>
  <computer><id>2</id><name>b</name></computer>
</computers>"#;
    let (_, value) = xml::parse(body).unwrap();
    assert_eq!(
        value,
        json!({
            "size": "2",
            "computer": [{"id": "1", "name": "a"}, {"id": "2", "name": "b"}]
        })
    );
}

#[test]
fn test_xml_empty_and_self_closing_are_null() {
    let (_, value) = xml::parse("<policy><category/><notes>   </notes><site></site></policy>").unwrap();
    assert_eq!(value, json!({"category": null, "notes": null, "site": null}));
}

#[test]
fn test_xml_entities_cdata_and_attributes() {
    let body = r#"<!DOCTYPE script [ <!ENTITY x "y"> ]>
<!-- exported -->
<script id="7" kind='shell'>
  <name>Tom &amp; Jerry &#x41;&#66;</name>
  <contents><![CDATA[#!/bin/sh
echo "<hi>"]]></contents>
  <?processing ignored?>
</script>"#;
    let (tag, value) = xml::parse(body).unwrap();
    assert_eq!(tag, "script");
    assert_eq!(
        value,
        json!({"name": "Tom & Jerry AB", "contents": "#!/bin/sh\necho \"<hi>\""})
    );
}

#[test]
fn test_xml_unknown_entity_kept_literally() {
    assert_eq!(xml::unescape("a &nbsp; b &amp; c"), "a &nbsp; b & c");
    assert_eq!(xml::unescape("dangling & amp"), "dangling & amp");
}

#[test]
fn test_xml_malformed_inputs() {
    assert!(xml::parse("").is_err());
    assert!(xml::parse("not xml").is_err());
    assert!(xml::parse("<a><b></a>").is_err());
    assert!(xml::parse("<a></a><b/>").is_err());
    assert!(xml::parse("<a>unterminated").is_err());
}

// ============================================================================
// XML Writer Tests
// ============================================================================

#[test]
fn test_xml_write_is_compact_and_escaped() {
    let value = json!({
        "name": "R&D <lab>",
        "enabled": true,
        "priority": 10,
        "category": null,
        "computer": [{"id": "1"}, {"id": "2"}]
    });
    assert_eq!(
        xml::write("policy", &value),
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "<policy><name>R&amp;D &lt;lab&gt;</name><enabled>true</enabled>",
            "<priority>10</priority><category/>",
            "<computer><id>1</id></computer><computer><id>2</id></computer></policy>"
        )
    );
}

#[test]
fn test_xml_reserialization_is_stable() {
    let body = "<group><name>Lab</name><computers><computer><id>1</id></computer><computer><id>3</id></computer></computers><site/></group>";
    let (tag, value) = xml::parse(body).unwrap();
    let written = xml::write(&tag, &value);
    assert_eq!(written, format!("{}{body}", xml::XML_DECLARATION));
}

// ============================================================================
// Document Tests
// ============================================================================

fn sample() -> Document {
    Document::parse(
        Format::Xml,
        "policy",
        "<policy><general><id>5</id><name>Install</name><category><id>-1</id><name>No category assigned</name></category></general>\
         <scope><computers><computer><id>9</id></computer></computers></scope></policy>",
    )
    .unwrap()
}

#[test]
fn test_document_get_and_text() {
    let doc = sample();
    assert_eq!(doc.root_tag(), "policy");
    assert_eq!(doc.text("general/id").as_deref(), Some("5"));
    assert_eq!(doc.text("/general/name/").as_deref(), Some("Install"));
    assert!(doc.text("general").is_none());
    assert!(doc.get("general/missing").is_none());
}

#[test]
fn test_document_index_addresses_lone_element() {
    let doc = sample();
    assert_eq!(doc.text("scope/computers/computer/0/id").as_deref(), Some("9"));
    assert!(doc.get("scope/computers/computer/1").is_none());
}

#[test]
fn test_document_set_creates_intermediate_objects() {
    let mut doc = Document::new(Format::Xml, "package");
    doc.set("general/name", "Firefox.pkg").unwrap();
    doc.set("general/priority", 10).unwrap();
    assert_eq!(doc.get("general"), Some(&json!({"name": "Firefox.pkg", "priority": 10})));
}

#[test]
fn test_document_set_replaces_empty_element() {
    let mut doc = Document::parse(Format::Xml, "policy", "<policy><scope/></policy>").unwrap();
    doc.set("scope/all_computers", "true").unwrap();
    assert_eq!(doc.text("scope/all_computers").as_deref(), Some("true"));
}

#[test]
fn test_document_set_array_bounds() {
    let mut doc = Document::from_value(Format::Json, "x", json!({"items": ["a"]}));
    doc.set("items/1", "b").unwrap();
    doc.set("items/0", "z").unwrap();
    assert_eq!(doc.get("items"), Some(&json!(["z", "b"])));
    assert!(matches!(
        doc.set("items/5", "c"),
        Err(crate::Error::IndexOutOfRange { index: 5, len: 2 })
    ));
    assert!(doc.set("items/name/x", "c").is_err());
}

#[test]
fn test_document_remove() {
    let mut doc = sample();
    assert_eq!(doc.remove("general/category/name"), Some(json!("No category assigned")));
    assert!(!doc.contains("general/category/name"));
    assert!(doc.contains("general/category/id"));
    assert!(doc.remove("general/nope").is_none());
    assert!(doc.remove("").is_none());
}

#[test]
fn test_document_serialize_round_trip_is_byte_identical() {
    let doc = sample();
    let again = Document::parse(Format::Xml, "ignored", &doc.serialize()).unwrap();
    assert_eq!(doc.serialize(), again.serialize());
    assert_eq!(doc.content_hash(), again.content_hash());
}

#[test]
fn test_document_json_format() {
    let doc = Document::parse(Format::Json, "building", r#"{"id":"3","name":"HQ"}"#).unwrap();
    assert_eq!(doc.root_tag(), "building");
    assert_eq!(doc.text("name").as_deref(), Some("HQ"));
    assert_eq!(doc.serialize(), r#"{"id":"3","name":"HQ"}"#);
    assert!(Document::parse(Format::Json, "b", "<xml/>").is_err());
}

#[test]
fn test_document_is_empty() {
    assert!(Document::new(Format::Xml, "x").is_empty());
    assert!(!sample().is_empty());
    assert_eq!(sample().top_level_keys(), vec!["general", "scope"]);
}
