//! The value builder: an event receiver that assembles document trees, plus
//! the `parse`/`load` family of entry points.

use log::{debug, trace};

use crate::comments::attach_comments;
use crate::error::Error;
use crate::events::{Comment, Event, EventReceiver};
use crate::parser::Parser;
use crate::source::Location;
use crate::tree::{Document, Node};
use crate::yaml::Yaml;

/// Options for the event-level parse.
#[derive(Clone, Debug, Default)]
pub struct ParseOptions {
    pub filename: Option<String>,
    pub comments: bool,
}

/// Options for loading resolved values.
#[derive(Clone, Debug)]
pub struct LoadOptions {
    pub aliases: bool,
    pub comments: bool,
    pub strict_integer: bool,
    pub filename: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            aliases: true,
            comments: false,
            strict_integer: false,
            filename: None,
        }
    }
}

/// Consumes parser events and produces document trees with resolved
/// anchors and attached comments.
pub(crate) struct TreeBuilder {
    documents: Vec<Document>,
    current: Option<Document>,
    stack: Vec<Frame>,
    comments: Vec<Comment>,
    aliases_enabled: bool,
    error: Option<Error>,
}

enum Frame {
    Sequence(Node),
    Mapping(Node, Option<Node>),
}

impl TreeBuilder {
    pub(crate) fn new(aliases_enabled: bool) -> Self {
        TreeBuilder {
            documents: Vec::new(),
            current: None,
            stack: Vec::new(),
            comments: Vec::new(),
            aliases_enabled,
            error: None,
        }
    }

    fn place(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(Frame::Sequence(seq)) => seq.seq_push(node),
            Some(Frame::Mapping(map, pending)) => match pending.take() {
                None => *pending = Some(node),
                Some(key) => map.map_insert(key, node),
            },
            None => {
                if let Some(doc) = &mut self.current {
                    doc.root = Some(node);
                }
            }
        }
    }

    fn register_anchor(&mut self, anchor: Option<&str>, node: &Node) {
        if let Some(name) = anchor
            && let Some(doc) = &mut self.current
        {
            trace!("anchor &{name} registered");
            doc.anchors.insert(name.to_owned(), node.clone());
        }
    }

    fn fail(&mut self, error: Error) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub(crate) fn finish(self) -> Result<Vec<Document>, Error> {
        if let Some(error) = self.error {
            return Err(error);
        }
        attach_comments(&self.documents, self.comments)?;
        debug!("loaded {} document(s)", self.documents.len());
        Ok(self.documents)
    }
}

impl EventReceiver for TreeBuilder {
    fn on_event(&mut self, event: Event, location: Location) {
        if self.error.is_some() {
            return;
        }
        match event {
            Event::StreamStart | Event::StreamEnd => {}
            Event::DocumentStart {
                version, implicit, ..
            } => {
                self.current = Some(Document {
                    version,
                    implicit_start: implicit,
                    location: Some(location),
                    ..Document::default()
                });
            }
            Event::DocumentEnd { implicit } => {
                if let Some(mut doc) = self.current.take() {
                    doc.implicit_end = implicit;
                    if let Some(start) = doc.location.take() {
                        doc.location = Some(start.join(&location));
                    }
                    self.documents.push(doc);
                } else {
                    self.fail(Error::Internal("document end without a document".into()));
                }
            }
            Event::Scalar {
                value,
                style,
                anchor,
                tag,
                ..
            } => {
                let node = Node::scalar_styled(value, style);
                node.set_location(location);
                node.set_tag(tag);
                node.set_anchor(anchor.clone());
                self.register_anchor(anchor.as_deref(), &node);
                self.place(node);
            }
            Event::SequenceStart { anchor, tag, style } => {
                let node = Node::sequence(style);
                node.set_location(location);
                node.set_tag(tag);
                node.set_anchor(anchor.clone());
                self.register_anchor(anchor.as_deref(), &node);
                self.stack.push(Frame::Sequence(node));
            }
            Event::SequenceEnd => match self.stack.pop() {
                Some(Frame::Sequence(node)) => {
                    if let Some(start) = node.location() {
                        node.set_location(start.join(&location));
                    }
                    self.place(node);
                }
                _ => self.fail(Error::Internal("unbalanced sequence end".into())),
            },
            Event::MappingStart { anchor, tag, style } => {
                let node = Node::mapping(style);
                node.set_location(location);
                node.set_tag(tag);
                node.set_anchor(anchor.clone());
                self.register_anchor(anchor.as_deref(), &node);
                self.stack.push(Frame::Mapping(node, None));
            }
            Event::MappingEnd => match self.stack.pop() {
                Some(Frame::Mapping(node, pending)) => {
                    if pending.is_some() {
                        self.fail(Error::Internal("mapping ended inside a pair".into()));
                        return;
                    }
                    if let Some(start) = node.location() {
                        node.set_location(start.join(&location));
                    }
                    self.place(node);
                }
                _ => self.fail(Error::Internal("unbalanced mapping end".into())),
            },
            Event::Alias { anchor } => {
                if !self.aliases_enabled {
                    self.fail(Error::BadAlias(anchor));
                    return;
                }
                let known = self
                    .current
                    .as_ref()
                    .is_some_and(|doc| doc.anchors.contains_key(&anchor));
                if !known {
                    self.fail(Error::BadAlias(anchor));
                    return;
                }
                let node = Node::alias(anchor);
                node.set_location(location);
                self.place(node);
            }
            Event::Comment(comment) => self.comments.push(comment),
        }
    }
}

// ----------------------------------------------------------------------
// Entry points
// ----------------------------------------------------------------------

/// Parse the first document into a tree; `Ok(None)` for an empty stream.
pub fn parse(source: &str) -> Result<Option<Document>, Error> {
    parse_with(source, &ParseOptions::default())
}

pub fn parse_with(source: &str, options: &ParseOptions) -> Result<Option<Document>, Error> {
    Ok(parse_stream(source, options)?.into_iter().next())
}

/// Parse every document in the stream.
pub fn parse_stream(source: &str, options: &ParseOptions) -> Result<Vec<Document>, Error> {
    let parser = Parser::with_options(source, options);
    let mut builder = TreeBuilder::new(true);
    parser.parse(&mut builder)?;
    builder.finish()
}

/// Load the first document as a resolved value; an empty stream is `Null`.
pub fn load(source: &str) -> Result<Yaml, Error> {
    load_with(source, &LoadOptions::default())
}

pub fn load_with(source: &str, options: &LoadOptions) -> Result<Yaml, Error> {
    Ok(load_stream(source, options)?
        .into_iter()
        .next()
        .unwrap_or(Yaml::Null))
}

/// Load with aliases disabled and application tags rejected.
pub fn safe_load(source: &str) -> Result<Yaml, Error> {
    let options = LoadOptions {
        aliases: false,
        ..LoadOptions::default()
    };
    let documents = load_documents(source, &options)?;
    for doc in &documents {
        check_core_tags(doc)?;
    }
    Ok(documents
        .first()
        .map(|doc| doc.to_yaml_strict(options.strict_integer))
        .unwrap_or(Yaml::Null))
}

/// Load every document in the stream as resolved values.
pub fn load_stream(source: &str, options: &LoadOptions) -> Result<Vec<Yaml>, Error> {
    let documents = load_documents(source, options)?;
    Ok(documents
        .iter()
        .map(|doc| doc.to_yaml_strict(options.strict_integer))
        .collect())
}

fn load_documents(source: &str, options: &LoadOptions) -> Result<Vec<Document>, Error> {
    let parse_options = ParseOptions {
        filename: options.filename.clone(),
        comments: options.comments,
    };
    let parser = Parser::with_options(source, &parse_options);
    let mut builder = TreeBuilder::new(options.aliases);
    parser.parse(&mut builder)?;
    builder.finish()
}

fn check_core_tags(doc: &Document) -> Result<(), Error> {
    fn walk(node: &Node, seen: &mut Vec<*const std::cell::RefCell<crate::tree::NodeData>>) -> Result<(), Error> {
        if seen.contains(&node.id()) {
            return Ok(());
        }
        seen.push(node.id());
        if let Some(tag) = node.tag()
            && tag != "!"
            && !tag.starts_with("tag:yaml.org,2002:")
        {
            return Err(Error::DisallowedTag(tag));
        }
        for child in node.children() {
            walk(&child, seen)?;
        }
        Ok(())
    }
    match doc.root() {
        Some(root) => walk(root, &mut Vec::new()),
        None => Ok(()),
    }
}

/// Multi-document convenience loader.
pub struct YamlLoader;

impl YamlLoader {
    pub fn load_from_str(source: &str) -> Result<Vec<Yaml>, Error> {
        load_stream(source, &LoadOptions::default())
    }

    /// Like `load_from_str`, validating that the bytes are UTF-8 first.
    pub fn load_from_bytes(source: &[u8]) -> Result<Vec<Yaml>, Error> {
        let text = std::str::from_utf8(source).map_err(|_| Error::NotUtf8)?;
        Self::load_from_str(text)
    }
}
