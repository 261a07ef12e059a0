//! A pure-Rust YAML 1.2 processor: a backtracking recursive-descent parser
//! that emits byte-located structural events (with optional comment
//! records), a value builder producing a mutable document tree, and an
//! emitter that serialises values back to YAML.
//!
//! # Example
//! ```rust
//! let docs = yamlet::YamlLoader::load_from_str("foo: 123").unwrap();
//! let doc = &docs[0];
//! assert_eq!(doc["foo"].as_i64().unwrap(), 123);
//! ```
//!
//! Comments survive a round trip when enabled:
//! ```rust
//! let options = yamlet::ParseOptions { comments: true, ..Default::default() };
//! let doc = yamlet::parse_with("- a # first\n", &options).unwrap().unwrap();
//! let out = yamlet::dump_document(&doc, &Default::default()).unwrap();
//! assert!(out.contains("# first"));
//! ```

mod comments;
mod cursor;
mod emitter;
mod error;
mod events;
mod linked_hash_map;
mod loader;
mod parser;
mod source;
mod tree;
mod yaml;

pub use cursor::Cursor;
pub use emitter::{
    DocumentEmitter, DumpOptions, YamlEmitter, dump, dump_document, dump_stream, dump_with,
    safe_dump,
};
pub use error::{EmitError, EmitResult, Error, SyntaxError};
pub use events::{CollectionStyle, Comment, Event, EventReceiver, ScalarStyle};
pub use linked_hash_map::LinkedHashMap;
pub use loader::{
    LoadOptions, ParseOptions, YamlLoader, load, load_stream, load_with, parse, parse_stream,
    parse_with, safe_load,
};
pub use parser::Parser;
pub use source::{Location, Source};
pub use tree::{Document, Node, NodeData, NodeKind};
pub use yaml::Yaml;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_simple_mapping() {
        let docs = YamlLoader::load_from_str("key: value").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["key"].as_str().unwrap(), "value");
    }

    #[test]
    fn load_typed_scalars() {
        let docs = YamlLoader::load_from_str("hello: world\nint: 42\nbool: true\nnulltest: ~")
            .unwrap();
        let doc = &docs[0];
        assert_eq!(doc["hello"].as_str().unwrap(), "world");
        assert_eq!(doc["int"].as_i64().unwrap(), 42);
        assert!(doc["bool"].as_bool().unwrap());
        assert!(doc["nulltest"].is_null());
    }

    #[test]
    fn load_flow_sequence() {
        let docs = YamlLoader::load_from_str("[1, 2, 3]").unwrap();
        let arr = docs[0].as_vec().unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr[0].as_i64().unwrap(), 1);
        assert_eq!(arr[2].as_i64().unwrap(), 3);
    }

    #[test]
    fn event_stream_is_well_bracketed() {
        struct Depth {
            depth: i32,
            min: i32,
        }
        impl EventReceiver for Depth {
            fn on_event(&mut self, event: Event, _location: Location) {
                match event {
                    Event::StreamStart
                    | Event::DocumentStart { .. }
                    | Event::SequenceStart { .. }
                    | Event::MappingStart { .. } => self.depth += 1,
                    Event::StreamEnd
                    | Event::DocumentEnd { .. }
                    | Event::SequenceEnd
                    | Event::MappingEnd => {
                        self.depth -= 1;
                        self.min = self.min.min(self.depth);
                    }
                    _ => {}
                }
            }
        }
        let mut depth = Depth { depth: 0, min: 0 };
        Parser::new("a: [1, {b: 2}]\nc:\n  - d\n")
            .parse(&mut depth)
            .unwrap();
        assert_eq!(depth.depth, 0);
        assert_eq!(depth.min, 0);
    }

    #[test]
    fn event_locations_are_ordered_spans() {
        struct Spans {
            spans: Vec<(usize, usize)>,
        }
        impl EventReceiver for Spans {
            fn on_event(&mut self, _event: Event, location: Location) {
                self.spans.push((location.start, location.end));
            }
        }
        let text = "a: 1\nb:\n  - x # c\n  - \"y\"\n";
        let mut spans = Spans { spans: Vec::new() };
        Parser::new(text).parse(&mut spans).unwrap();
        for (start, end) in &spans.spans {
            assert!(start <= end);
            assert!(*end <= text.len() + 1);
        }
    }

    #[test]
    fn non_utf8_input_is_rejected() {
        let err = YamlLoader::load_from_bytes(&[0xff, 0xfe, b'a']).unwrap_err();
        assert!(matches!(err, Error::NotUtf8));
    }
}
