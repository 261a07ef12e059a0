//! Scalar styles: plain folding, quoted escapes, literal and folded blocks
//! with every chomping variant.

use indoc::indoc;
use yamlet::{YamlLoader, load};

#[test]
fn plain_scalar_document() {
    let docs = YamlLoader::load_from_str("hello world").unwrap();
    assert_eq!(docs[0].as_str().unwrap(), "hello world");
}

#[test]
fn plain_multiline_folds_to_spaces() {
    assert_eq!(load("first\nsecond").unwrap().as_str().unwrap(), "first second");
}

#[test]
fn plain_paragraph_break_keeps_newline() {
    assert_eq!(
        load("first\n\nsecond").unwrap().as_str().unwrap(),
        "first\nsecond"
    );
}

#[test]
fn plain_scalar_with_colon_inside() {
    assert_eq!(load("a:b").unwrap().as_str().unwrap(), "a:b");
    let docs = YamlLoader::load_from_str("a: b:c").unwrap();
    assert_eq!(docs[0]["a"].as_str().unwrap(), "b:c");
}

#[test]
fn double_quoted_escapes() {
    let docs =
        YamlLoader::load_from_str(r#""Tab:\t Newline:\n Quote:\" Backslash:\\""#).unwrap();
    let value = docs[0].as_str().unwrap();
    assert!(value.contains('\t'));
    assert!(value.contains('\n'));
    assert!(value.contains('"'));
    assert!(value.contains('\\'));
}

#[test]
fn double_quoted_unicode_escapes() {
    assert_eq!(load(r#""\x41B""#).unwrap().as_str().unwrap(), "AB");
    assert_eq!(
        load(r#""\U0001F600""#).unwrap().as_str().unwrap(),
        "\u{1F600}"
    );
    assert_eq!(load(r#""\N\_""#).unwrap().as_str().unwrap(), "\u{85}\u{a0}");
}

#[test]
fn double_quoted_folding() {
    let value = load("\"First line\nSecond line\"").unwrap();
    assert_eq!(value.as_str().unwrap(), "First line Second line");
}

#[test]
fn double_quoted_escaped_break_is_a_continuation() {
    let value = load("\"a \\\n  b\"").unwrap();
    assert_eq!(value.as_str().unwrap(), "a b");
}

#[test]
fn double_quoted_unknown_escape_is_an_error() {
    assert!(load(r#""\q""#).is_err());
}

#[test]
fn single_quoted_doubles_its_quote() {
    assert_eq!(load("'it''s'").unwrap().as_str().unwrap(), "it's");
}

#[test]
fn single_quoted_folds_like_plain() {
    assert_eq!(load("'a\nb'").unwrap().as_str().unwrap(), "a b");
}

#[test]
fn unclosed_quote_is_an_error() {
    assert!(load("\"abc").is_err());
    assert!(load("'abc").is_err());
}

#[test]
fn literal_scalar_keeps_breaks() {
    let yaml = indoc! {"
        text: |
          a
          b
    "};
    let docs = YamlLoader::load_from_str(yaml).unwrap();
    assert_eq!(docs[0]["text"].as_str().unwrap(), "a\nb\n");
}

#[test]
fn literal_chomping_variants() {
    // Content ends in three breaks: strip drops all, clip keeps one, keep
    // keeps every one of them.
    let strip = "text: |-\n  a\n\n\n";
    let clip = "text: |\n  a\n\n\n";
    let keep = "text: |+\n  a\n\n\n";
    assert_eq!(
        YamlLoader::load_from_str(strip).unwrap()[0]["text"]
            .as_str()
            .unwrap(),
        "a"
    );
    assert_eq!(
        YamlLoader::load_from_str(clip).unwrap()[0]["text"]
            .as_str()
            .unwrap(),
        "a\n"
    );
    assert_eq!(
        YamlLoader::load_from_str(keep).unwrap()[0]["text"]
            .as_str()
            .unwrap(),
        "a\n\n\n"
    );
}

#[test]
fn literal_explicit_indentation_indicator() {
    // The indicator counts from the parent indentation, so the second
    // column of these lines is content.
    let docs = YamlLoader::load_from_str("key: |1\n  x\n").unwrap();
    assert_eq!(docs[0]["key"].as_str().unwrap(), " x\n");
}

#[test]
fn literal_zero_indicator_is_an_error() {
    assert!(load("key: |0\n  x\n").is_err());
}

#[test]
fn folded_scalar_joins_lines() {
    let yaml = indoc! {"
        text: >
          a
          b
    "};
    let docs = YamlLoader::load_from_str(yaml).unwrap();
    assert_eq!(docs[0]["text"].as_str().unwrap(), "a b\n");
}

#[test]
fn folded_paragraphs_and_indented_lines() {
    let yaml = "text: >\n  a\n\n  b\n    in\n  c\n";
    let docs = YamlLoader::load_from_str(yaml).unwrap();
    // The two extra spaces beyond the detected indent stay in the value.
    assert_eq!(docs[0]["text"].as_str().unwrap(), "a\nb\n  in\nc\n");
}

#[test]
fn leading_empty_lines_deeper_than_content_fail() {
    assert!(load("key: |\n    \n  x\n").is_err());
}

#[test]
fn empty_and_null_scalars() {
    let docs = YamlLoader::load_from_str("empty_key:\nexplicit: null\nstr: \"\"").unwrap();
    assert!(docs[0]["empty_key"].is_null());
    assert!(docs[0]["explicit"].is_null());
    assert_eq!(docs[0]["str"].as_str().unwrap(), "");
}
