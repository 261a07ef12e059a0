//! The load API surface: scalar resolution, option handling, and the safe
//! loader's restrictions.

use yamlet::{Error, LoadOptions, Yaml, YamlLoader, load, load_with, safe_load};

#[test]
fn decodes_the_basic_shapes() {
    assert_eq!(load("1").unwrap(), Yaml::Integer(1));
    assert_eq!(load("a: 1").unwrap()["a"], Yaml::Integer(1));
    assert_eq!(load("{a: 1}").unwrap()["a"], Yaml::Integer(1));
    assert_eq!(load("- 1").unwrap()[0], Yaml::Integer(1));
    assert_eq!(load("[1]").unwrap()[0], Yaml::Integer(1));
}

#[test]
fn resolves_core_schema_scalars() {
    let docs = YamlLoader::load_from_str(
        "int: 42\nneg: -7\nhex: 0x1F\nfloat: 3.5\nbool: True\nnothing: ~\nword: plain\n",
    )
    .unwrap();
    let doc = &docs[0];
    assert_eq!(doc["int"].as_i64().unwrap(), 42);
    assert_eq!(doc["neg"].as_i64().unwrap(), -7);
    assert_eq!(doc["hex"].as_i64().unwrap(), 31);
    assert_eq!(doc["float"].as_f64().unwrap(), 3.5);
    assert!(doc["bool"].as_bool().unwrap());
    assert!(doc["nothing"].is_null());
    assert_eq!(doc["word"].as_str().unwrap(), "plain");
}

#[test]
fn quoted_scalars_stay_strings() {
    let docs = YamlLoader::load_from_str("a: '1'\nb: \"true\"\n").unwrap();
    assert_eq!(docs[0]["a"], Yaml::String("1".into()));
    assert_eq!(docs[0]["b"], Yaml::String("true".into()));
}

#[test]
fn strict_integer_rejects_underscored_digits() {
    let relaxed = load_with("1_000", &LoadOptions::default()).unwrap();
    assert_eq!(relaxed, Yaml::Integer(1000));
    let strict = load_with(
        "1_000",
        &LoadOptions {
            strict_integer: true,
            ..LoadOptions::default()
        },
    )
    .unwrap();
    assert_eq!(strict, Yaml::String("1_000".into()));
}

#[test]
fn safe_load_accepts_core_documents() {
    let value = safe_load("a: [1, two, 3.0]\n").unwrap();
    assert_eq!(value["a"][1], Yaml::String("two".into()));
}

#[test]
fn safe_load_rejects_aliases() {
    let err = safe_load("- &a 1\n- *a\n").unwrap_err();
    assert!(matches!(err, Error::BadAlias(_)));
}

#[test]
fn safe_load_rejects_application_tags() {
    let err = safe_load("!widget {a: 1}\n").unwrap_err();
    assert!(matches!(err, Error::DisallowedTag(tag) if tag == "!widget"));
}

#[test]
fn safe_load_allows_core_tags() {
    assert_eq!(safe_load("!!str 42\n").unwrap(), Yaml::String("42".into()));
}

#[test]
fn tagged_scalars_resolve_by_tag() {
    assert_eq!(load("!!int '7'").unwrap(), Yaml::Integer(7));
    assert_eq!(load("!!str 7").unwrap(), Yaml::String("7".into()));
    assert_eq!(load("!!bool 'true'").unwrap(), Yaml::Boolean(true));
    assert_eq!(load("!!int 'seven'").unwrap(), Yaml::BadValue);
}

#[test]
fn integer_overflow_falls_back_to_real() {
    let value = load("99999999999999999999999999").unwrap();
    assert!(matches!(value, Yaml::Real(_)));
}

#[test]
fn load_stream_yields_every_document() {
    let values = YamlLoader::load_from_str("---\n1\n---\n2\n---\n3\n").unwrap();
    let ints: Vec<i64> = values.iter().filter_map(Yaml::as_i64).collect();
    assert_eq!(ints, [1, 2, 3]);
}

#[test]
fn documents_share_nothing() {
    // Anchors do not leak between documents.
    let err = YamlLoader::load_from_str("&a 1\n---\n*a\n").unwrap_err();
    assert!(matches!(err, Error::BadAlias(_)));
}
