//! Comment collection, attachment, and round-tripping through the
//! document emitter.

use yamlet::{Node, ParseOptions, dump_document, parse_with};

fn opts() -> ParseOptions {
    ParseOptions {
        comments: true,
        ..Default::default()
    }
}

#[test]
fn inline_comment_trails_the_preceding_node() {
    let doc = parse_with("- a # tail\n- b\n", &opts()).unwrap().unwrap();
    let root = doc.root().unwrap();
    let first = root.seq_get(0).unwrap();
    let trailing = &first.data().trailing;
    assert_eq!(trailing.len(), 1);
    assert_eq!(trailing[0].text, "# tail");
    assert!(trailing[0].inline);
}

#[test]
fn leading_comment_attaches_to_the_following_node() {
    let doc = parse_with("# head\na: 1\n", &opts()).unwrap().unwrap();
    let root = doc.root().unwrap();
    let leading = &root.data().leading;
    assert_eq!(leading.len(), 1);
    assert_eq!(leading[0].text, "# head");
    assert!(!leading[0].inline);
}

#[test]
fn comment_between_entries_leads_the_next_one() {
    let doc = parse_with("- a\n# middle\n- b\n", &opts()).unwrap().unwrap();
    let root = doc.root().unwrap();
    let second = root.seq_get(1).unwrap();
    assert_eq!(second.data().leading[0].text, "# middle");
}

#[test]
fn trailing_comment_after_everything() {
    let doc = parse_with("a: 1\n# tail\n", &opts()).unwrap().unwrap();
    let root = doc.root().unwrap();
    assert_eq!(root.data().trailing[0].text, "# tail");
}

#[test]
fn comment_after_key_trails_the_key() {
    let doc = parse_with("a: # why\n  b: 1\n", &opts()).unwrap().unwrap();
    let root = doc.root().unwrap();
    let pairs = root.children();
    // Children interleave keys and values; the key is first.
    assert_eq!(pairs[0].data().trailing[0].text, "# why");
}

#[test]
fn comments_are_recorded_once_despite_backtracking() {
    // The value line is re-scanned by several failed productions before the
    // plain scalar wins; the comment must still be unique.
    let doc = parse_with("a: 1 # once\n", &opts()).unwrap().unwrap();
    let out = dump_document(&doc, &Default::default()).unwrap();
    assert_eq!(out.matches("# once").count(), 1);
}

#[test]
fn comments_round_trip_through_the_emitter() {
    let source = "# head\n- a # tail\n- b\n";
    let doc = parse_with(source, &opts()).unwrap().unwrap();
    let out = dump_document(&doc, &Default::default()).unwrap();
    assert!(out.contains("# head"));
    assert!(out.contains("a # tail"));
    let reparsed = parse_with(&out, &opts()).unwrap().unwrap();
    let first = reparsed.root().unwrap().seq_get(0).unwrap();
    assert_eq!(first.data().trailing[0].text, "# tail");
    assert!(first.data().trailing[0].inline);
}

#[test]
fn mutated_sequence_keeps_its_comments() {
    // Insert a middle element between two commented entries, then dump.
    let doc = parse_with("- a # comment1\n- c # comment2\n", &opts())
        .unwrap()
        .unwrap();
    let root = doc.root().unwrap();
    root.seq_insert(1, Node::scalar("b"));
    let out = dump_document(&doc, &Default::default()).unwrap();
    assert!(out.contains("# comment1"));
    assert!(out.contains("# comment2"));
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "---");
    assert_eq!(lines[1], "- a # comment1");
    assert_eq!(lines[2], "- b");
    assert_eq!(lines[3], "- c # comment2");
}

#[test]
fn comments_disabled_by_default() {
    let doc = parse_with("- a # hidden\n", &Default::default())
        .unwrap()
        .unwrap();
    let first = doc.root().unwrap().seq_get(0).unwrap();
    assert!(first.data().trailing.is_empty());
}
