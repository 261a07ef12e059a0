//! Block and flow collections, anchors and aliases, implicit keys.

use indoc::indoc;
use yamlet::{Error, Yaml, YamlLoader, load, parse};

#[test]
fn block_sequence() {
    let docs = YamlLoader::load_from_str("- 1\n- 2\n- 3").unwrap();
    let arr = docs[0].as_vec().unwrap();
    assert_eq!(arr.len(), 3);
    assert_eq!(arr[1].as_i64().unwrap(), 2);
}

#[test]
fn nested_block_sequences() {
    let docs = YamlLoader::load_from_str("- - a\n  - b\n- c").unwrap();
    let arr = docs[0].as_vec().unwrap();
    let inner = arr[0].as_vec().unwrap();
    assert_eq!(inner[0].as_str().unwrap(), "a");
    assert_eq!(inner[1].as_str().unwrap(), "b");
    assert_eq!(arr[1].as_str().unwrap(), "c");
}

#[test]
fn block_mapping_nested() {
    let yaml = indoc! {"
        outer:
          a: 1
          b: 2
        other: 3
    "};
    let docs = YamlLoader::load_from_str(yaml).unwrap();
    assert_eq!(docs[0]["outer"]["a"].as_i64().unwrap(), 1);
    assert_eq!(docs[0]["outer"]["b"].as_i64().unwrap(), 2);
    assert_eq!(docs[0]["other"].as_i64().unwrap(), 3);
}

#[test]
fn sequence_at_mapping_indent() {
    let yaml = indoc! {"
        key:
        - a
        - b
    "};
    let docs = YamlLoader::load_from_str(yaml).unwrap();
    let arr = docs[0]["key"].as_vec().unwrap();
    assert_eq!(arr.len(), 2);
}

#[test]
fn compact_mapping_in_sequence() {
    let yaml = indoc! {"
        - foo: bar
          baz: qux
        - single
    "};
    let docs = YamlLoader::load_from_str(yaml).unwrap();
    let arr = docs[0].as_vec().unwrap();
    assert_eq!(arr[0]["foo"].as_str().unwrap(), "bar");
    assert_eq!(arr[0]["baz"].as_str().unwrap(), "qux");
    assert_eq!(arr[1].as_str().unwrap(), "single");
}

#[test]
fn explicit_key_entries() {
    let yaml = "? key\n: value\n";
    let docs = YamlLoader::load_from_str(yaml).unwrap();
    assert_eq!(docs[0]["key"].as_str().unwrap(), "value");
}

#[test]
fn sequence_entry_without_content_is_null() {
    let docs = YamlLoader::load_from_str("-\n- b").unwrap();
    let arr = docs[0].as_vec().unwrap();
    assert!(arr[0].is_null());
    assert_eq!(arr[1].as_str().unwrap(), "b");
}

#[test]
fn flow_sequence_and_mapping() {
    let docs = YamlLoader::load_from_str("{a: 1, b: [x, y]}").unwrap();
    assert_eq!(docs[0]["a"].as_i64().unwrap(), 1);
    let arr = docs[0]["b"].as_vec().unwrap();
    assert_eq!(arr[1].as_str().unwrap(), "y");
}

#[test]
fn flow_mapping_lone_key_and_empty_value() {
    let docs = YamlLoader::load_from_str("{ key1: value1, key2: , lone }").unwrap();
    assert_eq!(docs[0]["key1"].as_str().unwrap(), "value1");
    assert!(docs[0]["key2"].is_null());
    assert!(docs[0]["lone"].is_null());
}

#[test]
fn flow_sequence_elided_entry_is_null() {
    let docs = YamlLoader::load_from_str("[item1, , item3]").unwrap();
    let arr = docs[0].as_vec().unwrap();
    assert_eq!(arr.len(), 3);
    assert!(arr[1].is_null());
}

#[test]
fn flow_pair_in_sequence_wraps_a_mapping() {
    let docs = YamlLoader::load_from_str("[a: 1, b]").unwrap();
    let arr = docs[0].as_vec().unwrap();
    assert_eq!(arr[0]["a"].as_i64().unwrap(), 1);
    assert_eq!(arr[1].as_str().unwrap(), "b");
}

#[test]
fn multiline_flow_collection() {
    let yaml = indoc! {"
        [
          alpha,
          beta,
        ]
    "};
    let docs = YamlLoader::load_from_str(yaml).unwrap();
    let arr = docs[0].as_vec().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[1].as_str().unwrap(), "beta");
}

#[test]
fn aliased_sequence_entries() {
    let docs = YamlLoader::load_from_str("- &a 1\n- *a\n").unwrap();
    let arr = docs[0].as_vec().unwrap();
    assert_eq!(arr[0].as_i64().unwrap(), 1);
    assert_eq!(arr[1].as_i64().unwrap(), 1);
}

#[test]
fn aliased_mapping() {
    let yaml = indoc! {"
        base: &b {x: 1}
        copy: *b
    "};
    let docs = YamlLoader::load_from_str(yaml).unwrap();
    assert_eq!(docs[0]["copy"]["x"].as_i64().unwrap(), 1);
}

#[test]
fn unknown_alias_is_an_error() {
    let err = YamlLoader::load_from_str("a: *nowhere").unwrap_err();
    assert!(matches!(err, Error::BadAlias(name) if name == "nowhere"));
}

#[test]
fn cyclic_alias_resolves_to_bad_value() {
    let docs = YamlLoader::load_from_str("&a [*a]").unwrap();
    let arr = docs[0].as_vec().unwrap();
    assert_eq!(arr[0], Yaml::BadValue);
}

#[test]
fn mapping_preserves_insertion_order() {
    let docs = YamlLoader::load_from_str("b: 1\na: 2\nc: 3").unwrap();
    let keys: Vec<String> = docs[0]
        .as_hash()
        .unwrap()
        .keys()
        .map(|k| k.as_str().unwrap().to_owned())
        .collect();
    assert_eq!(keys, ["b", "a", "c"]);
}

#[test]
fn implicit_key_over_1024_bytes_fails() {
    let long_key = "x".repeat(1100);
    let yaml = format!("{long_key}: 1\n");
    assert!(load(&yaml).is_err());
}

#[test]
fn parsed_styles_are_recorded() {
    let doc = parse("{a: 1}").unwrap().unwrap();
    let root = doc.root().unwrap();
    assert!(root.is_mapping());
    match &root.data().kind {
        yamlet::NodeKind::Mapping { style, .. } => {
            assert_eq!(*style, yamlet::CollectionStyle::Flow);
        }
        _ => panic!("expected a mapping"),
    }
}

#[test]
fn anchors_are_recorded_on_the_tree() {
    let doc = parse("- &a 1\n- *a\n").unwrap().unwrap();
    let root = doc.root().unwrap();
    let first = root.seq_get(0).unwrap();
    assert_eq!(first.anchor().as_deref(), Some("a"));
    let second = root.seq_get(1).unwrap();
    assert!(second.is_alias());
    assert!(doc.resolve_alias("a").unwrap().ptr_eq(&first));
}
