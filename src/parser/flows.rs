//! Flow-style productions: bracketed sequences, mappings, and the single
//! pairs that sequences wrap in a synthetic mapping.

use crate::events::{CollectionStyle, EventReceiver};

use super::context::Context;
use super::{Engine, PResult, is_ns_char, is_white};

/// `ns-plain-safe(c)`, shared with the pair-detection lookahead.
fn plain_safe(c: Context, ch: char) -> bool {
    match c {
        Context::FlowOut | Context::BlockKey => is_ns_char(ch),
        _ => is_ns_char(ch) && !super::is_flow_indicator(ch),
    }
}

impl<R: EventReceiver> Engine<'_, R> {
    /// `ns-flow-node(n,c)`: alias, properties, or flow content.
    pub(crate) fn flow_node(&mut self, n: i32, c: Context) -> PResult {
        if self.alias_node()? {
            return Ok(true);
        }
        if self.speculate(|p| {
            if !p.node_properties(n, c)? {
                return Ok(false);
            }
            if !p.attempt(|q| Ok(q.separate(n, c)? && q.flow_content(n, c)?))? {
                // Properties with no content make an empty scalar node.
                let at = p.cursor.pos();
                p.emit_empty_scalar(at);
            }
            Ok(true)
        })? {
            return Ok(true);
        }
        self.flow_content(n, c)
    }

    /// `ns-flow-content(n,c)`.
    pub(crate) fn flow_content(&mut self, n: i32, c: Context) -> PResult {
        if self.flow_sequence(n, c)? {
            return Ok(true);
        }
        if self.flow_mapping(n, c)? {
            return Ok(true);
        }
        if self.single_quoted(n, c)? {
            return Ok(true);
        }
        if self.double_quoted(n, c)? {
            return Ok(true);
        }
        self.plain_scalar(n, c)
    }

    /// Mismatches inside a flow collection are hard errors in value
    /// position but stay soft while probing an implicit key.
    fn flow_mismatch(&mut self, inner: Context, what: &str, expected: &str) -> PResult {
        if inner == Context::FlowKey {
            return Ok(false);
        }
        Err(self.syntax_error(&format!("while parsing a {what}, did not find expected {expected}")))
    }

    /// `c-flow-sequence(n,c)`.
    pub(crate) fn flow_sequence(&mut self, n: i32, c: Context) -> PResult {
        if !self.cursor.check(|ch| ch == '[') {
            return Ok(false);
        }
        self.speculate(|p| {
            let start = p.cursor.pos();
            p.cursor.eat_char('[');
            let inner = c.in_flow();
            p.emit_sequence_start(CollectionStyle::Flow, start, start + 1);
            p.separate(n, inner)?;
            loop {
                if p.cursor.eat_char(']') {
                    break;
                }
                if p.cursor.at_end() {
                    return p.flow_mismatch(inner, "flow sequence", "',' or ']'");
                }
                if p.cursor.check(|ch| ch == ',') {
                    // An elided entry reads as an empty scalar.
                    let at = p.cursor.pos();
                    p.emit_empty_scalar(at);
                } else if !p.flow_seq_entry(n, inner)? {
                    return p.flow_mismatch(inner, "flow sequence", "node");
                }
                p.separate(n, inner)?;
                if p.cursor.eat_char(',') {
                    p.separate(n, inner)?;
                    continue;
                }
                if p.cursor.eat_char(']') {
                    break;
                }
                return p.flow_mismatch(inner, "flow sequence", "',' or ']'");
            }
            let end = p.cursor.pos();
            p.emit_sequence_end(end - 1, end);
            Ok(true)
        })
    }

    /// `ns-flow-seq-entry(n,c)`: a pair or a plain node.
    fn flow_seq_entry(&mut self, n: i32, c: Context) -> PResult {
        if self.flow_pair(n, c)? {
            return Ok(true);
        }
        self.flow_node(n, c)
    }

    /// `ns-flow-pair(n,c)`: a single key/value pair inside a sequence,
    /// wrapped in a synthetic flow mapping.
    fn flow_pair(&mut self, n: i32, c: Context) -> PResult {
        self.speculate(|p| {
            let start = p.cursor.pos();
            if p.check_explicit_key(c) {
                p.emit_mapping_start(CollectionStyle::Flow, start, start);
                p.cursor.eat_char('?');
                if !p.attempt(|q| Ok(q.separate(n, c)? && q.flow_node(n, c)?))? {
                    let at = p.cursor.pos();
                    p.emit_empty_scalar(at);
                }
                p.attempt(|q| q.separate(n, c))?;
                if p.check_separate_value(c) {
                    p.flow_map_value(n, c)?;
                } else {
                    let at = p.cursor.pos();
                    p.emit_empty_scalar(at);
                }
                let end = p.cursor.pos();
                p.emit_mapping_end(end, end);
                return Ok(true);
            }
            p.emit_mapping_start(CollectionStyle::Flow, start, start);
            if p.check_separate_value(c) {
                p.emit_empty_scalar(start);
            } else {
                let json = p.cursor.check(|ch| matches!(ch, '"' | '\'' | '[' | '{'));
                // Implicit keys in a pair are restricted to one line and
                // 1024 bytes.
                if !p.flow_node(n, Context::FlowKey)? {
                    return Ok(false);
                }
                if p.cursor.pos() - start > 1024 {
                    return Ok(false);
                }
                p.cursor.eat_while(is_white);
                if !(p.check_separate_value(c) || (json && p.cursor.check(|ch| ch == ':'))) {
                    return Ok(false);
                }
            }
            p.flow_map_value(n, c)?;
            let end = p.cursor.pos();
            p.emit_mapping_end(end, end);
            Ok(true)
        })
    }

    /// `c-flow-mapping(n,c)`.
    pub(crate) fn flow_mapping(&mut self, n: i32, c: Context) -> PResult {
        if !self.cursor.check(|ch| ch == '{') {
            return Ok(false);
        }
        self.speculate(|p| {
            let start = p.cursor.pos();
            p.cursor.eat_char('{');
            let inner = c.in_flow();
            p.emit_mapping_start(CollectionStyle::Flow, start, start + 1);
            p.separate(n, inner)?;
            loop {
                if p.cursor.eat_char('}') {
                    break;
                }
                if p.cursor.at_end() {
                    return p.flow_mismatch(inner, "flow mapping", "',' or '}'");
                }
                if !p.flow_map_entry(n, inner)? {
                    return p.flow_mismatch(inner, "flow mapping", "key");
                }
                p.separate(n, inner)?;
                if p.cursor.eat_char(',') {
                    p.separate(n, inner)?;
                    continue;
                }
                if p.cursor.eat_char('}') {
                    break;
                }
                return p.flow_mismatch(inner, "flow mapping", "',' or '}'");
            }
            let end = p.cursor.pos();
            p.emit_mapping_end(end - 1, end);
            Ok(true)
        })
    }

    /// `ns-flow-map-entry(n,c)`: explicit, implicit, or a lone key.
    fn flow_map_entry(&mut self, n: i32, c: Context) -> PResult {
        if self.check_explicit_key(c) {
            self.cursor.eat_char('?');
            if !self.attempt(|p| Ok(p.separate(n, c)? && p.flow_node(n, c)?))? {
                let at = self.cursor.pos();
                self.emit_empty_scalar(at);
            }
            self.attempt(|p| p.separate(n, c))?;
            if self.check_separate_value(c) {
                self.flow_map_value(n, c)?;
            } else {
                let at = self.cursor.pos();
                self.emit_empty_scalar(at);
            }
            return Ok(true);
        }
        if self.check_separate_value(c) {
            let at = self.cursor.pos();
            self.emit_empty_scalar(at);
            return self.flow_map_value(n, c);
        }
        let json = self.cursor.check(|ch| matches!(ch, '"' | '\'' | '[' | '{'));
        if !self.flow_node(n, c)? {
            return Ok(false);
        }
        self.attempt(|p| p.separate(n, c))?;
        if self.check_separate_value(c) || (json && self.cursor.check(|ch| ch == ':')) {
            self.flow_map_value(n, c)?;
        } else {
            // A lone node reads as a key with a null value.
            let at = self.cursor.pos();
            self.emit_empty_scalar(at);
        }
        Ok(true)
    }

    /// `?` opens an explicit entry only when not glued to a plain scalar.
    fn check_explicit_key(&self, c: Context) -> bool {
        self.cursor.check(|ch| ch == '?')
            && !self.cursor.peek_nth(1).is_some_and(|next| plain_safe(c, next))
    }

    /// `:` separates a value only when not glued to a plain scalar.
    fn check_separate_value(&self, c: Context) -> bool {
        self.cursor.check(|ch| ch == ':')
            && !self.cursor.peek_nth(1).is_some_and(|next| plain_safe(c, next))
    }

    /// The value after `:`, or an empty scalar.
    fn flow_map_value(&mut self, n: i32, c: Context) -> PResult {
        self.cursor.eat_char(':');
        if !self.attempt(|p| {
            let _ = p.separate(n, c)?;
            p.flow_node(n, c)
        })? {
            let at = self.cursor.pos();
            self.emit_empty_scalar(at);
        }
        Ok(true)
    }
}
