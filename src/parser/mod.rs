//! The grammar engine: a backtracking recursive-descent parser over a byte
//! cursor, emitting located events through the speculative event cache.
//!
//! Productions return `Ok(false)` for a mismatch the caller may recover from
//! and `Err` for a hard syntax error. The combinators (`attempt`,
//! `lookahead`, `star`, `plus`) save and restore cursor position and pending
//! node properties; `speculate` additionally frames event emission so a
//! failed branch leaves no trace in the handler.

mod blocks;
mod cache;
mod context;
mod directives;
mod flows;
mod scalars;

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use log::debug;

use crate::cursor::Cursor;
use crate::error::{Error, SyntaxError};
use crate::events::{CollectionStyle, Comment, Event, EventReceiver, ScalarStyle};
use crate::loader::ParseOptions;
use crate::source::{Location, Source};

use cache::EventCache;
use context::Context;

/// Outcome of a production: matched, mismatched, or hard failure.
pub(crate) type PResult = Result<bool, SyntaxError>;

/// The public parser handle: one source, parsed once per receiver.
pub struct Parser {
    source: Rc<Source>,
    comments: bool,
}

impl Parser {
    pub fn new(text: &str) -> Self {
        Parser {
            source: Source::new(text, None),
            comments: false,
        }
    }

    pub fn with_options(text: &str, options: &ParseOptions) -> Self {
        Parser {
            source: Source::new(text, options.filename.as_deref()),
            comments: options.comments,
        }
    }

    /// Run the grammar over the whole input, handing every event to
    /// `receiver`. Fails with the first syntax error; no partial results.
    pub fn parse<R: EventReceiver>(&self, receiver: &mut R) -> Result<(), Error> {
        let mut engine = Engine::new(self.source.clone(), receiver, self.comments);
        engine.run()?;
        Ok(())
    }

    pub fn source(&self) -> &Rc<Source> {
        &self.source
    }
}

/// Everything one parse owns: cursor, cache, pending properties, directive
/// table and comment map. Instances are independent.
pub(crate) struct Engine<'r, R: EventReceiver> {
    pub(crate) receiver: &'r mut R,
    pub(crate) source: Rc<Source>,
    pub(crate) cursor: Cursor,
    pub(crate) cache: EventCache,
    // Node properties captured from `&anchor` / `!tag`, flushed onto the
    // next content event.
    pub(crate) anchor: Option<String>,
    pub(crate) tag: Option<String>,
    pub(crate) prop_start: Option<usize>,
    // Per-document directive state.
    pub(crate) tag_directives: HashMap<String, String>,
    pub(crate) user_directives: Vec<(String, String)>,
    pub(crate) version: Option<(u32, u32)>,
    pending_document: Option<PendingDocument>,
    document_end_armed: bool,
    // Comments keyed by starting byte offset; insert-if-absent so a branch
    // retry never records the same `#` twice.
    pub(crate) collect_comments: bool,
    pub(crate) comments: BTreeMap<usize, Comment>,
    // Furthest position any failed branch reached, for error reporting.
    high_water: usize,
}

struct PendingDocument {
    implicit: bool,
    start: usize,
    end: usize,
    version: Option<(u32, u32)>,
    tag_directives: Vec<(String, String)>,
}

/// Backtrack state saved by the combinators.
struct Saved {
    pos: usize,
    anchor: Option<String>,
    tag: Option<String>,
    prop_start: Option<usize>,
}

impl<'r, R: EventReceiver> Engine<'r, R> {
    pub(crate) fn new(source: Rc<Source>, receiver: &'r mut R, collect_comments: bool) -> Self {
        Engine {
            receiver,
            cursor: Cursor::new(source.clone()),
            source,
            cache: EventCache::new(),
            anchor: None,
            tag: None,
            prop_start: None,
            tag_directives: HashMap::new(),
            user_directives: Vec::new(),
            version: None,
            pending_document: None,
            document_end_armed: false,
            collect_comments,
            comments: BTreeMap::new(),
            high_water: 0,
        }
    }

    // ------------------------------------------------------------------
    // Combinators
    // ------------------------------------------------------------------

    fn save(&self) -> Saved {
        Saved {
            pos: self.cursor.pos(),
            anchor: self.anchor.clone(),
            tag: self.tag.clone(),
            prop_start: self.prop_start,
        }
    }

    fn restore(&mut self, saved: Saved) {
        self.high_water = self.high_water.max(self.cursor.pos());
        self.cursor.set_pos(saved.pos);
        self.anchor = saved.anchor;
        self.tag = saved.tag;
        self.prop_start = saved.prop_start;
    }

    /// Run `f`; on mismatch rewind the cursor and pending properties.
    pub(crate) fn attempt(&mut self, f: impl FnOnce(&mut Self) -> PResult) -> PResult {
        let saved = self.save();
        let matched = f(self)?;
        if !matched {
            self.restore(saved);
        }
        Ok(matched)
    }

    /// Run `f` and rewind no matter what; reports whether it matched.
    pub(crate) fn lookahead(&mut self, f: impl FnOnce(&mut Self) -> PResult) -> PResult {
        let saved = self.save();
        let matched = f(self)?;
        self.restore(saved);
        Ok(matched)
    }

    /// Like `attempt`, but also frames event emission: a mismatching branch
    /// leaves no events behind.
    pub(crate) fn speculate(&mut self, f: impl FnOnce(&mut Self) -> PResult) -> PResult {
        let saved = self.save();
        self.cache.push_frame();
        match f(self) {
            Ok(true) => {
                if let Some(events) = self.cache.flush_frame() {
                    for (event, location) in events {
                        self.deliver(event, location);
                    }
                }
                Ok(true)
            }
            Ok(false) => {
                self.cache.pop_frame();
                self.restore(saved);
                Ok(false)
            }
            Err(err) => {
                self.cache.pop_frame();
                Err(err)
            }
        }
    }

    /// Repeat `f` while it matches and advances; always succeeds.
    pub(crate) fn star(&mut self, mut f: impl FnMut(&mut Self) -> PResult) -> PResult {
        loop {
            let before = self.cursor.pos();
            if !f(self)? || self.cursor.pos() == before {
                break;
            }
        }
        Ok(true)
    }

    /// `star` that requires at least one match.
    pub(crate) fn plus(&mut self, mut f: impl FnMut(&mut Self) -> PResult) -> PResult {
        if !f(self)? {
            return Ok(false);
        }
        self.star(f)
    }

    // ------------------------------------------------------------------
    // Event plumbing
    // ------------------------------------------------------------------

    pub(crate) fn location(&self, start: usize, end: usize) -> Location {
        Location::new(self.source.clone(), start, end)
    }

    pub(crate) fn syntax_error(&self, message: &str) -> SyntaxError {
        self.syntax_error_at(self.cursor.pos(), message)
    }

    pub(crate) fn syntax_error_at(&self, offset: usize, message: &str) -> SyntaxError {
        SyntaxError::new(&self.location(offset, offset), message)
    }

    fn error_at_high_water(&self, message: &str) -> SyntaxError {
        let at = self.high_water.max(self.cursor.pos());
        self.syntax_error_at(at, message)
    }

    /// Route an event through the cache, or deliver it directly.
    pub(crate) fn push_event(&mut self, event: Event, location: Location) {
        if let Some((event, location)) = self.cache.push_event(event, location) {
            self.deliver(event, location);
        }
    }

    /// Hand an event to the receiver, flushing the queued DocumentStart
    /// first when this is the document's first content event.
    fn deliver(&mut self, event: Event, location: Location) {
        if event.is_content()
            && let Some(pending) = self.pending_document.take()
        {
            let doc_location = self.location(pending.start, pending.end);
            self.receiver.on_event(
                Event::DocumentStart {
                    version: pending.version,
                    tag_directives: pending.tag_directives,
                    implicit: pending.implicit,
                },
                doc_location,
            );
            self.document_end_armed = true;
        }
        self.receiver.on_event(event, location);
    }

    fn queue_document_start(&mut self, implicit: bool, start: usize, end: usize) {
        debug!(
            "document queued at offset {start} ({})",
            if implicit { "bare" } else { "explicit" }
        );
        self.pending_document = Some(PendingDocument {
            implicit,
            start,
            end,
            version: self.version.take(),
            tag_directives: std::mem::take(&mut self.user_directives),
        });
    }

    /// Emit the armed DocumentEnd (if any) and reset per-document state so
    /// the next document parses independently.
    fn end_document(&mut self, implicit: bool, span: Option<(usize, usize)>) {
        if self.document_end_armed {
            let (start, end) = span.unwrap_or_else(|| {
                let p = self.source.trim(self.cursor.pos());
                (p, p)
            });
            let location = self.location(start, end);
            self.deliver(Event::DocumentEnd { implicit }, location);
            self.document_end_armed = false;
        }
        self.pending_document = None;
        self.version = None;
        self.user_directives.clear();
        self.tag_directives.clear();
    }

    pub(crate) fn take_props(&mut self) -> (Option<String>, Option<String>, Option<usize>) {
        (self.anchor.take(), self.tag.take(), self.prop_start.take())
    }

    pub(crate) fn emit_scalar(
        &mut self,
        value: String,
        style: ScalarStyle,
        start: usize,
        end: usize,
    ) {
        let (anchor, tag, prop_start) = self.take_props();
        let start = prop_start.map_or(start, |p| p.min(start));
        let plain_implicit = tag.is_none() && style == ScalarStyle::Plain;
        let quoted_implicit = tag.is_none() && style != ScalarStyle::Plain;
        let location = self.location(start, end);
        self.push_event(
            Event::Scalar {
                value,
                style,
                anchor,
                tag,
                plain_implicit,
                quoted_implicit,
            },
            location,
        );
    }

    pub(crate) fn emit_empty_scalar(&mut self, at: usize) {
        self.emit_scalar(String::new(), ScalarStyle::Plain, at, at);
    }

    pub(crate) fn emit_sequence_start(&mut self, style: CollectionStyle, start: usize, end: usize) {
        let (anchor, tag, prop_start) = self.take_props();
        let start = prop_start.map_or(start, |p| p.min(start));
        let location = self.location(start, end);
        self.push_event(Event::SequenceStart { anchor, tag, style }, location);
    }

    pub(crate) fn emit_mapping_start(&mut self, style: CollectionStyle, start: usize, end: usize) {
        let (anchor, tag, prop_start) = self.take_props();
        let start = prop_start.map_or(start, |p| p.min(start));
        let location = self.location(start, end);
        self.push_event(Event::MappingStart { anchor, tag, style }, location);
    }

    pub(crate) fn emit_sequence_end(&mut self, start: usize, end: usize) {
        let location = self.location(start, end);
        self.push_event(Event::SequenceEnd, location);
    }

    pub(crate) fn emit_mapping_end(&mut self, start: usize, end: usize) {
        let location = self.location(start, end);
        self.push_event(Event::MappingEnd, location);
    }

    /// End a block collection at the trimmed cursor position, so trailing
    /// blank and comment lines stay outside the collection's span.
    pub(crate) fn emit_sequence_end_trimmed(&mut self) {
        let p = self.source.trim(self.cursor.pos());
        self.emit_sequence_end(p, p);
    }

    pub(crate) fn emit_mapping_end_trimmed(&mut self) {
        let p = self.source.trim(self.cursor.pos());
        self.emit_mapping_end(p, p);
    }

    // ------------------------------------------------------------------
    // Whitespace, breaks, comments
    // ------------------------------------------------------------------

    pub(crate) fn eat_break(&mut self) -> bool {
        if self.cursor.eat_str("\r\n") {
            return true;
        }
        self.cursor.eat_char('\r') || self.cursor.eat_char('\n')
    }

    fn check_break(&self) -> bool {
        self.cursor.check(is_break)
    }

    /// `s-separate-in-line`: one or more blanks, or the start of a line.
    pub(crate) fn separate_in_line(&mut self) -> bool {
        self.cursor.eat_while(is_white) > 0 || self.cursor.at_line_start()
    }

    /// `s-indent(n)`: exactly `n` spaces.
    pub(crate) fn indent_exact(&mut self, n: i32) -> bool {
        if n <= 0 {
            return true;
        }
        let saved = self.cursor.pos();
        let mut eaten = 0;
        while eaten < n && self.cursor.eat_char(' ') {
            eaten += 1;
        }
        if eaten == n {
            true
        } else {
            self.cursor.set_pos(saved);
            false
        }
    }

    /// `s-indent(<n)`: up to `n - 1` spaces, greedily.
    pub(crate) fn indent_lt(&mut self, n: i32) -> bool {
        let mut eaten = 0;
        while eaten + 1 < n && self.cursor.eat_char(' ') {
            eaten += 1;
        }
        true
    }

    pub(crate) fn line_prefix(&mut self, n: i32, c: Context) -> bool {
        match c {
            Context::BlockOut | Context::BlockIn => self.indent_exact(n),
            _ => self.flow_line_prefix(n),
        }
    }

    /// `s-flow-line-prefix(n)`: the indent plus any further blanks.
    pub(crate) fn flow_line_prefix(&mut self, n: i32) -> bool {
        if !self.indent_exact(n) {
            return false;
        }
        self.cursor.eat_while(is_white);
        true
    }

    /// `l-empty(n,c)`: a line contributing a fold, ending in its break.
    pub(crate) fn empty_line(&mut self, n: i32, c: Context) -> PResult {
        self.attempt(|p| {
            let saved = p.cursor.pos();
            if !(p.line_prefix(n, c) && p.check_break()) {
                p.cursor.set_pos(saved);
                p.indent_lt(n);
            }
            Ok(p.eat_break())
        })
    }

    /// Record the `# …` run at the cursor (deduplicated by offset).
    fn scan_comment(&mut self) {
        let start = self.cursor.pos();
        self.cursor.eat_while(|c| !is_break(c));
        if !self.collect_comments {
            return;
        }
        let end = self.cursor.pos();
        let line_start = self.source.line_start(self.source.line_index(start));
        let inline = self.source.text()[line_start..start]
            .bytes()
            .any(|b| b != b' ' && b != b'\t');
        let comment = Comment {
            location: self.location(start, end),
            text: self.cursor.slice(start, end).to_owned(),
            inline,
        };
        self.comments.entry(start).or_insert(comment);
    }

    /// `s-b-comment`: optional blanks and comment, then a break or EOF.
    pub(crate) fn s_b_comment(&mut self) -> PResult {
        self.attempt(|p| {
            if p.separate_in_line() && p.cursor.check(|c| c == '#') {
                p.scan_comment();
            }
            Ok(p.eat_break() || p.cursor.at_end())
        })
    }

    /// `l-comment`: a whole blank or comment line.
    pub(crate) fn l_comment(&mut self) -> PResult {
        self.attempt(|p| {
            if !p.separate_in_line() {
                return Ok(false);
            }
            if p.cursor.check(|c| c == '#') {
                p.scan_comment();
            }
            Ok(p.eat_break() || p.cursor.at_end())
        })
    }

    /// `s-l-comments`: end of line (or start of one), then any run of
    /// comment/blank lines.
    pub(crate) fn s_l_comments(&mut self) -> PResult {
        if !(self.s_b_comment()? || self.cursor.at_line_start()) {
            return Ok(false);
        }
        self.star(Self::l_comment)?;
        Ok(true)
    }

    /// `s-separate(n,c)`.
    pub(crate) fn separate(&mut self, n: i32, c: Context) -> PResult {
        match c {
            Context::BlockKey | Context::FlowKey => Ok(self.separate_in_line()),
            _ => self.separate_lines(n),
        }
    }

    fn separate_lines(&mut self, n: i32) -> PResult {
        if self.attempt(|p| Ok(p.s_l_comments()? && p.flow_line_prefix(n)))? {
            return Ok(true);
        }
        Ok(self.separate_in_line())
    }

    // ------------------------------------------------------------------
    // Stream and document framing
    // ------------------------------------------------------------------

    pub(crate) fn run(&mut self) -> Result<(), SyntaxError> {
        let start = Location::point(self.source.clone(), 0);
        self.deliver(Event::StreamStart, start);
        self.yaml_stream()?;
        if !self.cursor.at_end() {
            return Err(self.error_at_high_water("parser finished before end of input"));
        }
        self.end_document(true, None);
        if self.collect_comments {
            let comments = std::mem::take(&mut self.comments);
            for (_, comment) in comments {
                let location = comment.location.clone();
                self.deliver(Event::Comment(comment), location);
            }
        }
        let end = Location::point(self.source.clone(), self.source.len());
        self.deliver(Event::StreamEnd, end);
        debug_assert_eq!(self.cache.depth(), 0);
        Ok(())
    }

    /// `l-yaml-stream`.
    fn yaml_stream(&mut self) -> Result<(), SyntaxError> {
        self.document_prefix()?;
        let mut can_be_bare = true;
        loop {
            if self.cursor.at_end() {
                break;
            }
            if self.document_suffix()? {
                while self.document_suffix()? {}
                self.document_prefix()?;
                can_be_bare = true;
                continue;
            }
            if !can_be_bare {
                // Without an intervening `...` only an explicit document
                // (or more directives) may follow.
                if !(self.cursor.check(|c| c == '%') && self.cursor.at_line_start())
                    && !self.at_marker("---")
                {
                    return Err(self.syntax_error("did not find expected '---' or '...'"));
                }
                self.end_document(true, None);
            }
            if !self.any_document(can_be_bare)? {
                return Err(self.error_at_high_water("did not find expected node content"));
            }
            can_be_bare = false;
            self.document_prefix()?;
        }
        Ok(())
    }

    /// `l-document-prefix*`: BOM and leading comment/blank lines.
    fn document_prefix(&mut self) -> PResult {
        self.cursor.eat_char('\u{feff}');
        self.star(Self::l_comment)
    }

    fn at_marker(&self, marker: &str) -> bool {
        if !self.cursor.at_line_start() || !self.cursor.rest().starts_with(marker) {
            return false;
        }
        match self.cursor.rest().as_bytes().get(marker.len()) {
            None => true,
            Some(&b) => matches!(b, b' ' | b'\t' | b'\n' | b'\r'),
        }
    }

    /// `l-document-suffix`: `...` ends the open document explicitly.
    fn document_suffix(&mut self) -> PResult {
        if !self.at_marker("...") {
            return Ok(false);
        }
        let start = self.cursor.pos();
        self.cursor.set_pos(start + 3);
        self.end_document(false, Some((start, start + 3)));
        if !self.s_l_comments()? {
            return Err(self.syntax_error("did not find expected comment or line break"));
        }
        Ok(true)
    }

    /// `l-any-document`: directive, explicit, or (when allowed) bare.
    fn any_document(&mut self, allow_bare: bool) -> PResult {
        if self.directive_document()? || self.explicit_document()? {
            return Ok(true);
        }
        if allow_bare {
            return self.bare_document();
        }
        Ok(false)
    }

    fn directive_document(&mut self) -> PResult {
        if !self.cursor.check(|c| c == '%') {
            return Ok(false);
        }
        while self.directive()? {}
        if !self.at_marker("---") {
            return Err(self.syntax_error("expected '---' after directives"));
        }
        self.explicit_document()
    }

    fn explicit_document(&mut self) -> PResult {
        if !self.at_marker("---") {
            return Ok(false);
        }
        let start = self.cursor.pos();
        self.cursor.set_pos(start + 3);
        self.queue_document_start(false, start, start + 3);
        if !self.document_content()? {
            // `e-node`: an explicit document with no content.
            self.emit_empty_scalar(self.cursor.pos());
            if !self.s_l_comments()? {
                return Err(self.syntax_error("did not find expected comment or line break"));
            }
        }
        Ok(true)
    }

    fn bare_document(&mut self) -> PResult {
        if self.cursor.at_end() {
            return Ok(false);
        }
        let start = self.cursor.pos();
        self.queue_document_start(true, start, start);
        if self.document_content()? {
            Ok(true)
        } else {
            self.pending_document = None;
            Ok(false)
        }
    }

    /// `l-bare-document`: a top-level block node with the document-boundary
    /// guard engaged.
    fn document_content(&mut self) -> PResult {
        let was = self.cursor.set_in_document(true);
        let result = self.block_node(-1, Context::BlockIn);
        self.cursor.set_in_document(was);
        result
    }
}

// ----------------------------------------------------------------------
// Character classes
// ----------------------------------------------------------------------

pub(crate) fn is_break(c: char) -> bool {
    c == '\n' || c == '\r'
}

pub(crate) fn is_white(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_printable(c: char) -> bool {
    !matches!(
        c,
        '\u{0}'..='\u{8}' | '\u{b}'..='\u{c}' | '\u{e}'..='\u{1f}' | '\u{7f}'
    )
}

pub(crate) fn is_ns_char(c: char) -> bool {
    is_printable(c) && !is_white(c) && !is_break(c) && c != '\u{feff}'
}

pub(crate) fn is_indicator(c: char) -> bool {
    matches!(
        c,
        '-' | '?'
            | ':'
            | ','
            | '['
            | ']'
            | '{'
            | '}'
            | '#'
            | '&'
            | '*'
            | '!'
            | '|'
            | '>'
            | '\''
            | '"'
            | '%'
            | '@'
            | '`'
    )
}

pub(crate) fn is_flow_indicator(c: char) -> bool {
    matches!(c, ',' | '[' | ']' | '{' | '}')
}

pub(crate) fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

pub(crate) fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '#' | ';'
                | '/'
                | '?'
                | ':'
                | '@'
                | '&'
                | '='
                | '+'
                | '$'
                | '_'
                | '.'
                | '~'
                | '*'
                | '\''
                | '('
                | ')'
                | '%'
                | '-'
        )
}

pub(crate) fn is_uri_char(c: char) -> bool {
    is_tag_char(c) || matches!(c, '!' | ',' | '[' | ']')
}

pub(crate) fn is_anchor_char(c: char) -> bool {
    is_ns_char(c) && !is_flow_indicator(c)
}
