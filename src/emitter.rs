//! Emitters: `YamlEmitter` renders resolved values, `DocumentEmitter`
//! renders parsed trees with their comments, anchors, and aliases.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::{EmitError, EmitResult};
use crate::events::{CollectionStyle, ScalarStyle};
use crate::linked_hash_map::LinkedHashMap;
use crate::tree::{Document, Node, NodeKind};
use crate::yaml::Yaml;

/// Layout options shared by both emitters.
#[derive(Clone, Debug)]
pub struct DumpOptions {
    /// Spaces per nesting level.
    pub indent: usize,
    /// Preferred maximum line width for inline flow rendering.
    pub line_width: usize,
    /// Whether anchors/aliases may be written.
    pub aliases: bool,
    /// Indent sequences nested under mapping keys one extra level.
    pub sequence_indent: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        DumpOptions {
            indent: 2,
            line_width: 79,
            aliases: true,
            sequence_indent: false,
        }
    }
}

/// An emitter for `Yaml` values: block layout, deterministic output.
pub struct YamlEmitter<'a> {
    writer: &'a mut dyn fmt::Write,
    options: DumpOptions,
    level: isize,
}

impl<'a> YamlEmitter<'a> {
    pub fn new(writer: &'a mut dyn fmt::Write) -> Self {
        YamlEmitter {
            writer,
            options: DumpOptions::default(),
            level: -1,
        }
    }

    pub fn with_options(writer: &'a mut dyn fmt::Write, options: DumpOptions) -> Self {
        YamlEmitter {
            writer,
            options,
            level: -1,
        }
    }

    /// Write one document: `---`, the value, a final newline.
    pub fn dump(&mut self, doc: &Yaml) -> EmitResult {
        writeln!(self.writer, "---")?;
        self.level = -1;
        self.emit_node(doc)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn emit_node(&mut self, node: &Yaml) -> EmitResult {
        match node {
            Yaml::Array(v) => self.emit_array(v),
            Yaml::Hash(h) => self.emit_hash(h),
            Yaml::String(s) => self.emit_string(s),
            Yaml::Boolean(b) => {
                write!(self.writer, "{}", if *b { "true" } else { "false" })?;
                Ok(())
            }
            Yaml::Integer(i) => {
                write!(self.writer, "{i}")?;
                Ok(())
            }
            Yaml::Real(s) => {
                write!(self.writer, "{s}")?;
                Ok(())
            }
            Yaml::Null | Yaml::BadValue => {
                write!(self.writer, "~")?;
                Ok(())
            }
        }
    }

    fn emit_string(&mut self, s: &str) -> EmitResult {
        if literal_block_fits(s) && self.level >= 0 {
            self.emit_literal_block(s)
        } else if need_quotes(s) {
            escape_str(self.writer, s)?;
            Ok(())
        } else {
            write!(self.writer, "{s}")?;
            Ok(())
        }
    }

    /// Multi-line strings render as literal blocks with the right chomping
    /// indicator.
    fn emit_literal_block(&mut self, s: &str) -> EmitResult {
        let trailing = s.len() - s.trim_end_matches('\n').len();
        let header = match trailing {
            0 => "|-",
            1 => "|",
            _ => "|+",
        };
        writeln!(self.writer, "{header}")?;
        let body = s.trim_end_matches('\n');
        let extra = trailing.saturating_sub(1);
        let mut first = true;
        for line in body.split('\n').chain(std::iter::repeat_n("", extra)) {
            if !first {
                writeln!(self.writer)?;
            }
            first = false;
            if !line.is_empty() {
                self.level += 1;
                self.write_indent()?;
                self.level -= 1;
                write!(self.writer, "{line}")?;
            }
        }
        Ok(())
    }

    fn emit_array(&mut self, arr: &[Yaml]) -> EmitResult {
        if arr.is_empty() {
            write!(self.writer, "[]")?;
            return Ok(());
        }
        self.level += 1;
        for (i, item) in arr.iter().enumerate() {
            if i > 0 {
                writeln!(self.writer)?;
                self.write_indent()?;
            }
            write!(self.writer, "- ")?;
            self.emit_val(true, item)?;
        }
        self.level -= 1;
        Ok(())
    }

    fn emit_hash(&mut self, hash: &LinkedHashMap<Yaml, Yaml>) -> EmitResult {
        if hash.is_empty() {
            write!(self.writer, "{{}}")?;
            return Ok(());
        }
        self.level += 1;
        let mut first = true;
        for (key, value) in hash.iter() {
            if !first {
                writeln!(self.writer)?;
                self.write_indent()?;
            }
            first = false;
            if complex_key(key) {
                write!(self.writer, "? ")?;
                self.emit_node(key)?;
                writeln!(self.writer)?;
                self.write_indent()?;
                write!(self.writer, ": ")?;
                self.emit_val(true, value)?;
            } else {
                self.emit_node(key)?;
                write!(self.writer, ":")?;
                self.emit_hash_value(value)?;
            }
        }
        self.level -= 1;
        Ok(())
    }

    /// A mapping value: inline for scalars, on following lines for
    /// non-empty collections.
    fn emit_hash_value(&mut self, value: &Yaml) -> EmitResult {
        match value {
            Yaml::Array(a) if !a.is_empty() => {
                writeln!(self.writer)?;
                if self.options.sequence_indent {
                    self.level += 1;
                    self.write_indent()?;
                    self.level -= 1;
                    self.emit_array(a)
                } else {
                    self.write_indent()?;
                    self.level -= 1;
                    let result = self.emit_array(a);
                    self.level += 1;
                    result
                }
            }
            Yaml::Hash(h) if !h.is_empty() => {
                writeln!(self.writer)?;
                self.level += 1;
                self.write_indent()?;
                self.level -= 1;
                self.emit_hash(h)
            }
            other => {
                write!(self.writer, " ")?;
                self.emit_node(other)
            }
        }
    }

    /// A nested value after `- ` or `? `, sharing the item's line.
    fn emit_val(&mut self, inline: bool, value: &Yaml) -> EmitResult {
        match value {
            Yaml::Array(a) => {
                if inline || a.is_empty() {
                    self.emit_array(a)
                } else {
                    writeln!(self.writer)?;
                    self.level += 1;
                    self.write_indent()?;
                    self.level -= 1;
                    self.emit_array(a)
                }
            }
            Yaml::Hash(h) => {
                if inline || h.is_empty() {
                    self.emit_hash(h)
                } else {
                    writeln!(self.writer)?;
                    self.level += 1;
                    self.write_indent()?;
                    self.level -= 1;
                    self.emit_hash(h)
                }
            }
            other => self.emit_node(other),
        }
    }

    fn write_indent(&mut self) -> EmitResult {
        if self.level <= 0 {
            return Ok(());
        }
        for _ in 0..(self.level as usize) * self.options.indent {
            write!(self.writer, " ")?;
        }
        Ok(())
    }
}

fn complex_key(key: &Yaml) -> bool {
    matches!(key, Yaml::Array(_) | Yaml::Hash(_))
        || matches!(key, Yaml::String(s) if s.contains('\n'))
}

/// A string renders as a literal block when it is genuinely multi-line and
/// every line survives the round trip without an indentation indicator.
fn literal_block_fits(s: &str) -> bool {
    if !s.contains('\n') || s.contains('\r') {
        return false;
    }
    let body = s.trim_end_matches('\n');
    if body.is_empty() {
        return false;
    }
    body.split('\n').all(|line| {
        !line.starts_with(' ')
            && !line.starts_with('\t')
            && line.chars().all(|c| c == '\t' || !c.is_control())
    })
}

/// Whether a plain rendering of `s` would reload as something else.
fn need_quotes(s: &str) -> bool {
    if s.is_empty() || s.starts_with(' ') || s.ends_with(' ') {
        return true;
    }
    if s.parse::<i64>().is_ok() || s.parse::<f64>().is_ok() {
        return true;
    }
    match s {
        "null" | "~" | "NULL" | "Null" => return true,
        "true" | "false" | "True" | "False" | "TRUE" | "FALSE" => return true,
        _ => {}
    }
    if s.starts_with(|c: char| {
        matches!(
            c,
            ':' | '&' | '*' | '?' | '|' | '-' | '<' | '>' | '=' | '!' | '%' | '@' | '`'
        )
    }) {
        return true;
    }
    s.contains(|c: char| {
        matches!(
            c,
            '{' | '}'
                | '['
                | ']'
                | ','
                | '#'
                | '"'
                | '\''
                | '\\'
                | '\0'..='\x06'
                | '\t'
                | '\n'
                | '\r'
                | '\x0e'..='\x1f'
        )
    }) || s.contains(": ")
        || s.ends_with(':')
        || s.contains(" #")
}

/// Escape a string for double-quoted output.
fn escape_str(writer: &mut dyn fmt::Write, s: &str) -> Result<(), fmt::Error> {
    write!(writer, "\"")?;
    for c in s.chars() {
        match c {
            '"' => write!(writer, "\\\"")?,
            '\\' => write!(writer, "\\\\")?,
            '\n' => write!(writer, "\\n")?,
            '\t' => write!(writer, "\\t")?,
            '\r' => write!(writer, "\\r")?,
            _ if c.is_control() => write!(writer, "\\u{:04x}", c as u32)?,
            _ => write!(writer, "{c}")?,
        }
    }
    write!(writer, "\"")?;
    Ok(())
}

// ----------------------------------------------------------------------
// Document emitter
// ----------------------------------------------------------------------

/// Emits a parsed (or hand-built) tree, preserving comments, anchors, and
/// aliases. Repeated handles (`Node::ptr_eq`) get generated anchors.
pub struct DocumentEmitter<'a> {
    writer: &'a mut dyn fmt::Write,
    options: DumpOptions,
    level: isize,
    /// Anchor name each shared or explicitly anchored node emits.
    anchors: HashMap<*const std::cell::RefCell<crate::tree::NodeData>, String>,
    /// Nodes already written once; later visits become aliases.
    emitted: HashSet<*const std::cell::RefCell<crate::tree::NodeData>>,
}

impl<'a> DocumentEmitter<'a> {
    pub fn new(writer: &'a mut dyn fmt::Write) -> Self {
        Self::with_options(writer, DumpOptions::default())
    }

    pub fn with_options(writer: &'a mut dyn fmt::Write, options: DumpOptions) -> Self {
        DocumentEmitter {
            writer,
            options,
            level: -1,
            anchors: HashMap::new(),
            emitted: HashSet::new(),
        }
    }

    pub fn dump(&mut self, doc: &Document) -> EmitResult {
        self.level = -1;
        self.anchors.clear();
        self.emitted.clear();
        let Some(root) = doc.root() else {
            writeln!(self.writer, "---")?;
            return Ok(());
        };
        self.assign_anchors(root);
        for comment in &root.data().leading {
            writeln!(self.writer, "{}", comment.text)?;
        }
        writeln!(self.writer, "---")?;
        self.emit_node(root)?;
        self.emit_trailing(root)?;
        writeln!(self.writer)?;
        Ok(())
    }

    /// First walk: nodes reached through more than one handle get an
    /// anchor name up front, so the first emission can carry it.
    fn assign_anchors(&mut self, root: &Node) {
        let mut counts: HashMap<*const std::cell::RefCell<crate::tree::NodeData>, usize> =
            HashMap::new();
        let mut queue = vec![root.clone()];
        let mut shared = Vec::new();
        while let Some(node) = queue.pop() {
            let count = counts.entry(node.id()).or_insert(0);
            *count += 1;
            if *count > 1 {
                shared.push(node);
                continue;
            }
            queue.extend(node.children());
        }
        let mut next_id = 1usize;
        for node in shared {
            if self.anchors.contains_key(&node.id()) {
                continue;
            }
            let name = node.anchor().unwrap_or_else(|| {
                let name = next_id.to_string();
                next_id += 1;
                name
            });
            self.anchors.insert(node.id(), name);
        }
        // Explicit anchors always emit, shared or not, so parsed
        // anchor/alias pairs survive a round trip.
        let mut stack = vec![root.clone()];
        let mut seen = HashSet::new();
        while let Some(node) = stack.pop() {
            if !seen.insert(node.id()) {
                continue;
            }
            if let Some(name) = node.anchor() {
                self.anchors.entry(node.id()).or_insert(name);
            }
            stack.extend(node.children());
        }
    }

    fn emit_node(&mut self, node: &Node) -> EmitResult {
        if self.emitted.contains(&node.id()) {
            // A repeated handle becomes an alias of its first emission.
            let name = self.anchors.get(&node.id()).cloned().unwrap_or_default();
            if !self.options.aliases {
                return Err(EmitError::BadAlias(name));
            }
            write!(self.writer, "*{name}")?;
            return Ok(());
        }
        self.emitted.insert(node.id());
        if let Some(name) = self.anchors.get(&node.id()).cloned() {
            if !self.options.aliases {
                return Err(EmitError::BadAlias(name));
            }
            write!(self.writer, "&{name} ")?;
        }
        let data = node.data();
        match &data.kind {
            NodeKind::Alias { name } => {
                if !self.options.aliases {
                    return Err(EmitError::BadAlias(name.clone()));
                }
                write!(self.writer, "*{name}")?;
                Ok(())
            }
            NodeKind::Scalar { value, style } => self.emit_scalar(value, *style),
            NodeKind::Sequence { children, .. } => {
                let children = children.clone();
                drop(data);
                self.emit_sequence(node, &children)
            }
            NodeKind::Mapping { pairs, .. } => {
                let pairs = pairs.clone();
                drop(data);
                self.emit_mapping(node, &pairs)
            }
        }
    }

    fn emit_scalar(&mut self, value: &str, style: ScalarStyle) -> EmitResult {
        match style {
            ScalarStyle::Literal | ScalarStyle::Folded if literal_block_fits(value) => {
                let trailing = value.len() - value.trim_end_matches('\n').len();
                let header = match trailing {
                    0 => "|-",
                    1 => "|",
                    _ => "|+",
                };
                writeln!(self.writer, "{header}")?;
                let body = value.trim_end_matches('\n');
                let extra = trailing.saturating_sub(1);
                let mut first = true;
                for line in body.split('\n').chain(std::iter::repeat_n("", extra)) {
                    if !first {
                        writeln!(self.writer)?;
                    }
                    first = false;
                    if !line.is_empty() {
                        self.level += 1;
                        self.write_indent()?;
                        self.level -= 1;
                        write!(self.writer, "{line}")?;
                    }
                }
                Ok(())
            }
            // A scalar that parsed as plain re-emits verbatim; its text is
            // already plain-safe and resolves to the same value.
            ScalarStyle::Plain if value.is_empty() => {
                write!(self.writer, "~")?;
                Ok(())
            }
            ScalarStyle::Plain if !value.contains('\n') => {
                write!(self.writer, "{value}")?;
                Ok(())
            }
            _ if !need_quotes(value) => {
                write!(self.writer, "{value}")?;
                Ok(())
            }
            _ => {
                escape_str(self.writer, value)?;
                Ok(())
            }
        }
    }

    fn emit_sequence(&mut self, node: &Node, children: &[Node]) -> EmitResult {
        if children.is_empty() {
            write!(self.writer, "[]")?;
            return Ok(());
        }
        if let Some(flow) = self.try_flow(node) {
            write!(self.writer, "{flow}")?;
            return Ok(());
        }
        self.level += 1;
        for (i, item) in children.iter().enumerate() {
            if i > 0 {
                writeln!(self.writer)?;
                self.write_indent()?;
            }
            self.emit_leading(item)?;
            write!(self.writer, "- ")?;
            self.emit_block_child(item)?;
            self.emit_trailing(item)?;
        }
        self.level -= 1;
        Ok(())
    }

    fn emit_mapping(&mut self, node: &Node, pairs: &[(Node, Node)]) -> EmitResult {
        if pairs.is_empty() {
            write!(self.writer, "{{}}")?;
            return Ok(());
        }
        if let Some(flow) = self.try_flow(node) {
            write!(self.writer, "{flow}")?;
            return Ok(());
        }
        self.level += 1;
        for (i, (key, value)) in pairs.iter().enumerate() {
            if i > 0 {
                writeln!(self.writer)?;
                self.write_indent()?;
            }
            self.emit_leading(key)?;
            if key_needs_explicit(key) {
                write!(self.writer, "? ")?;
                self.emit_block_child(key)?;
                writeln!(self.writer)?;
                self.write_indent()?;
                write!(self.writer, ": ")?;
                self.emit_block_child(value)?;
            } else {
                self.emit_node(key)?;
                write!(self.writer, ":")?;
                self.emit_map_value(key, value)?;
            }
            self.emit_trailing(value)?;
        }
        self.level -= 1;
        Ok(())
    }

    fn emit_map_value(&mut self, key: &Node, value: &Node) -> EmitResult {
        let key_comments: Vec<_> = key
            .data()
            .trailing
            .iter()
            .filter(|c| c.inline)
            .cloned()
            .collect();
        let block_collection = match &value.data().kind {
            NodeKind::Sequence { children, .. } => {
                !children.is_empty() && self.flow_rendering(value).is_none()
            }
            NodeKind::Mapping { pairs, .. } => {
                !pairs.is_empty() && self.flow_rendering(value).is_none()
            }
            _ => false,
        };
        if !block_collection && key_comments.is_empty() {
            write!(self.writer, " ")?;
            return self.emit_node(value);
        }
        // Comments trailing the key sit after the colon, pushing the value
        // onto its own lines.
        for comment in &key_comments {
            write!(self.writer, " {}", comment.text)?;
        }
        writeln!(self.writer)?;
        self.emit_leading(value)?;
        if !block_collection {
            self.level += 1;
            self.write_indent()?;
            self.level -= 1;
            return self.emit_node(value);
        }
        if value.is_sequence() && !self.options.sequence_indent {
            self.write_indent()?;
            self.level -= 1;
            let result = self.emit_node(value);
            self.level += 1;
            result
        } else {
            self.level += 1;
            self.write_indent()?;
            self.level -= 1;
            self.emit_node(value)
        }
    }

    /// A nested node after `- ` or `? `.
    fn emit_block_child(&mut self, node: &Node) -> EmitResult {
        self.emit_node(node)
    }

    fn emit_leading(&mut self, node: &Node) -> EmitResult {
        let comments = node.data().leading.clone();
        for comment in comments {
            writeln!(self.writer, "{}", comment.text)?;
            self.write_indent()?;
        }
        Ok(())
    }

    /// Inline trailing comments share the node's line; the rest follow it.
    fn emit_trailing(&mut self, node: &Node) -> EmitResult {
        let comments = node.data().trailing.clone();
        for comment in comments {
            if comment.inline {
                write!(self.writer, " {}", comment.text)?;
            } else {
                writeln!(self.writer)?;
                self.write_indent()?;
                write!(self.writer, "{}", comment.text)?;
            }
        }
        Ok(())
    }

    /// Render a comment-free flow-style subtree inline when it was parsed
    /// in flow style and fits the configured width; marks it emitted.
    fn try_flow(&mut self, node: &Node) -> Option<String> {
        let out = self.flow_rendering(node)?;
        // The flow rendering bypassed emit_node; record visits so shared
        // handles inside still alias correctly on later emissions.
        self.emitted.insert(node.id());
        let mut stack = node.children();
        while let Some(n) = stack.pop() {
            if self.emitted.insert(n.id()) {
                stack.extend(n.children());
            }
        }
        Some(out)
    }

    /// Pure check used both for probing and for the actual rendering.
    fn flow_rendering(&self, node: &Node) -> Option<String> {
        let style = match &node.data().kind {
            NodeKind::Sequence { style, .. } | NodeKind::Mapping { style, .. } => *style,
            _ => return None,
        };
        if style != CollectionStyle::Flow {
            return None;
        }
        let mut out = String::new();
        if !self.render_flow(node, true, &mut out) {
            return None;
        }
        let col = (self.level.max(0) as usize) * self.options.indent;
        if col + out.len() > self.options.line_width {
            return None;
        }
        Some(out)
    }

    fn render_flow(&self, node: &Node, is_root: bool, out: &mut String) -> bool {
        let data = node.data();
        if !data.leading.is_empty() || !data.trailing.is_empty() {
            return false;
        }
        if !is_root && (self.emitted.contains(&node.id()) || self.anchors.contains_key(&node.id()))
        {
            return false;
        }
        match &data.kind {
            NodeKind::Scalar { value, style } => {
                if value.contains('\n') {
                    return false;
                }
                if *style == ScalarStyle::Plain && value.is_empty() {
                    out.push('~');
                } else if *style == ScalarStyle::Plain && flow_plain_safe(value) {
                    out.push_str(value);
                } else {
                    let mut quoted = String::new();
                    if escape_str(&mut quoted, value).is_err() {
                        return false;
                    }
                    out.push_str(&quoted);
                }
                true
            }
            NodeKind::Alias { name } => {
                if !self.options.aliases {
                    return false;
                }
                out.push('*');
                out.push_str(name);
                true
            }
            NodeKind::Sequence { children, .. } => {
                out.push('[');
                for (i, item) in children.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    if !self.render_flow(item, false, out) {
                        return false;
                    }
                }
                out.push(']');
                true
            }
            NodeKind::Mapping { pairs, .. } => {
                out.push('{');
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    if !self.render_flow(key, false, out) {
                        return false;
                    }
                    out.push_str(": ");
                    if !self.render_flow(value, false, out) {
                        return false;
                    }
                }
                out.push('}');
                true
            }
        }
    }

    fn write_indent(&mut self) -> EmitResult {
        if self.level <= 0 {
            return Ok(());
        }
        for _ in 0..(self.level as usize) * self.options.indent {
            write!(self.writer, " ")?;
        }
        Ok(())
    }
}

/// Whether a plain-parsed scalar can re-emit verbatim inside flow
/// brackets, where commas and braces regain their meaning.
fn flow_plain_safe(value: &str) -> bool {
    !value.is_empty()
        && !value.contains(|c| matches!(c, ',' | '[' | ']' | '{' | '}'))
        && !value.contains(": ")
        && !value.ends_with(':')
        && !value.contains(" #")
}

fn key_needs_explicit(key: &Node) -> bool {
    match &key.data().kind {
        NodeKind::Scalar { value, .. } => value.contains('\n'),
        NodeKind::Alias { .. } => false,
        _ => true,
    }
}

// ----------------------------------------------------------------------
// Entry points
// ----------------------------------------------------------------------

pub fn dump(value: &Yaml) -> Result<String, EmitError> {
    dump_with(value, &DumpOptions::default())
}

pub fn dump_with(value: &Yaml, options: &DumpOptions) -> Result<String, EmitError> {
    let mut out = String::new();
    YamlEmitter::with_options(&mut out, options.clone()).dump(value)?;
    Ok(out)
}

/// One `---`-framed document per value.
pub fn dump_stream(values: &[Yaml], options: &DumpOptions) -> Result<String, EmitError> {
    let mut out = String::new();
    let mut emitter = YamlEmitter::with_options(&mut out, options.clone());
    for value in values {
        emitter.dump(value)?;
    }
    Ok(out)
}

/// Like `dump`, refusing anchors and aliases.
pub fn safe_dump(value: &Yaml) -> Result<String, EmitError> {
    let options = DumpOptions {
        aliases: false,
        ..DumpOptions::default()
    };
    dump_with(value, &options)
}

/// Emit a parsed tree, preserving comments, anchors, and aliases.
pub fn dump_document(doc: &Document, options: &DumpOptions) -> Result<String, EmitError> {
    let mut out = String::new();
    DocumentEmitter::with_options(&mut out, options.clone()).dump(doc)?;
    Ok(out)
}
