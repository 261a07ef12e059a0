//! Value and document emission: layout, quoting, determinism, anchors.

use pretty_assertions::assert_eq;
use yamlet::{
    CollectionStyle, Document, DumpOptions, EmitError, Node, Yaml, dump, dump_document,
    dump_stream, dump_with, load, parse, safe_dump,
};

#[test]
fn dumps_scalars_and_mappings() {
    let value = load("a: 1\nb: true\nc: hello\n").unwrap();
    assert_eq!(dump(&value).unwrap(), "---\na: 1\nb: true\nc: hello\n");
}

#[test]
fn dumps_sequences() {
    let value = load("- 1\n- two\n").unwrap();
    assert_eq!(dump(&value).unwrap(), "---\n- 1\n- two\n");
}

#[test]
fn sequence_under_key_sits_at_key_column_by_default() {
    let value = load("key:\n- 1\n- 2\n").unwrap();
    assert_eq!(dump(&value).unwrap(), "---\nkey:\n- 1\n- 2\n");
    let indented = DumpOptions {
        sequence_indent: true,
        ..DumpOptions::default()
    };
    assert_eq!(
        dump_with(&value, &indented).unwrap(),
        "---\nkey:\n  - 1\n  - 2\n"
    );
}

#[test]
fn nested_mappings_indent() {
    let value = load("a:\n  b: 1\n  c: 2\n").unwrap();
    assert_eq!(dump(&value).unwrap(), "---\na:\n  b: 1\n  c: 2\n");
}

#[test]
fn custom_indentation_width() {
    let value = load("a:\n  b: 1\n").unwrap();
    let options = DumpOptions {
        indent: 4,
        ..DumpOptions::default()
    };
    assert_eq!(dump_with(&value, &options).unwrap(), "---\na:\n    b: 1\n");
}

#[test]
fn ambiguous_strings_are_quoted() {
    assert_eq!(dump(&Yaml::String("true".into())).unwrap(), "---\n\"true\"\n");
    assert_eq!(dump(&Yaml::String("1".into())).unwrap(), "---\n\"1\"\n");
    assert_eq!(
        dump(&Yaml::String("a: b".into())).unwrap(),
        "---\n\"a: b\"\n"
    );
    assert_eq!(dump(&Yaml::String("".into())).unwrap(), "---\n\"\"\n");
}

#[test]
fn multiline_strings_emit_literal_blocks() {
    let value = load("text: |\n  a\n  b\n").unwrap();
    assert_eq!(dump(&value).unwrap(), "---\ntext: |\n  a\n  b\n");
}

#[test]
fn empty_collections_stay_flow() {
    let value = load("a: []\nb: {}\n").unwrap();
    assert_eq!(dump(&value).unwrap(), "---\na: []\nb: {}\n");
}

#[test]
fn dump_is_deterministic_and_round_trips() {
    let sources = [
        "a: 1\nb:\n  - x\n  - y: 2\n",
        "- 1\n- - 2\n  - 3\n",
        "text: |\n  line one\n  line two\n",
        "empty:\nlist: []\n",
    ];
    for source in sources {
        let value = load(source).unwrap();
        let once = dump(&value).unwrap();
        let twice = dump(&load(&once).unwrap()).unwrap();
        assert_eq!(once, twice, "unstable dump for {source:?}");
        assert_eq!(load(&once).unwrap(), value, "bad round trip for {source:?}");
    }
}

#[test]
fn mutation_leaves_no_residue() {
    let mut value = load("- a\n- b\n- c\n").unwrap();
    value.as_vec_mut().unwrap().remove(1);
    let out = dump(&value).unwrap();
    assert_eq!(out, "---\n- a\n- c\n");

    let mut value = load("a: 1\nb: 2\n").unwrap();
    value
        .as_hash_mut()
        .unwrap()
        .remove(&Yaml::String("b".into()));
    assert_eq!(dump(&value).unwrap(), "---\na: 1\n");
}

#[test]
fn dump_stream_frames_every_document() {
    let values = [load("a: 1").unwrap(), load("b: 2").unwrap()];
    let out = dump_stream(&values, &DumpOptions::default()).unwrap();
    assert_eq!(out, "---\na: 1\n---\nb: 2\n");
}

#[test]
fn parsed_aliases_survive_document_dump() {
    let doc = parse("- &a 1\n- *a\n").unwrap().unwrap();
    let out = dump_document(&doc, &DumpOptions::default()).unwrap();
    assert_eq!(out, "---\n- &a 1\n- *a\n");
}

#[test]
fn shared_handles_get_generated_anchors() {
    let shared = Node::scalar("x");
    let root = Node::sequence(CollectionStyle::Block);
    root.seq_push(shared.clone());
    root.seq_push(shared);
    let mut doc = Document::default();
    doc.root = Some(root);
    let out = dump_document(&doc, &DumpOptions::default()).unwrap();
    assert_eq!(out, "---\n- &1 x\n- *1\n");
}

#[test]
fn disabled_aliases_fail_on_repeats() {
    let doc = parse("- &a 1\n- *a\n").unwrap().unwrap();
    let options = DumpOptions {
        aliases: false,
        ..DumpOptions::default()
    };
    assert!(matches!(
        dump_document(&doc, &options),
        Err(EmitError::BadAlias(_))
    ));
}

#[test]
fn safe_dump_matches_dump_for_plain_values() {
    let value = load("a: [1, 2]\n").unwrap();
    assert_eq!(safe_dump(&value).unwrap(), dump(&value).unwrap());
}

#[test]
fn flow_style_is_preserved_when_it_fits() {
    let doc = parse("nums: [1, 2, 3]\n").unwrap().unwrap();
    let out = dump_document(&doc, &DumpOptions::default()).unwrap();
    assert_eq!(out, "---\nnums: [1, 2, 3]\n");
}

#[test]
fn complex_keys_use_explicit_form() {
    let value = load("? [a, b]\n: 1\n").unwrap();
    let out = dump(&value).unwrap();
    assert!(out.starts_with("---\n? "));
    assert_eq!(load(&out).unwrap(), value);
}
