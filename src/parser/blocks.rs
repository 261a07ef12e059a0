//! Block-style productions: indentation-delimited sequences and mappings.

use crate::events::{CollectionStyle, EventReceiver};

use super::context::Context;
use super::{Engine, PResult, is_ns_char};

/// `seq-spaces(n,c)`: a block sequence nested in a mapping may sit at the
/// mapping's own indentation.
fn seq_spaces(n: i32, c: Context) -> i32 {
    if c == Context::BlockOut { n - 1 } else { n }
}

impl<R: EventReceiver> Engine<'_, R> {
    /// `s-l+block-node(n,c)`.
    pub(crate) fn block_node(&mut self, n: i32, c: Context) -> PResult {
        if self.block_scalar_node(n, c)? {
            return Ok(true);
        }
        if self.block_collection(n, c)? {
            return Ok(true);
        }
        self.flow_in_block(n)
    }

    /// `s-l+block-scalar(n,c)`: separation, optional properties, then a
    /// literal or folded scalar.
    fn block_scalar_node(&mut self, n: i32, c: Context) -> PResult {
        self.speculate(|p| {
            if !p.separate(n + 1, c)? {
                return Ok(false);
            }
            p.attempt(|q| Ok(q.node_properties(n + 1, c)? && q.separate(n + 1, c)?))?;
            if p.block_scalar(n, false)? {
                return Ok(true);
            }
            p.block_scalar(n, true)
        })
    }

    /// `s-l+block-collection(n,c)`: optional properties on the header
    /// line, then a sequence or mapping on the following lines.
    fn block_collection(&mut self, n: i32, c: Context) -> PResult {
        self.speculate(|p| {
            p.attempt(|q| Ok(q.separate(n + 1, c)? && q.node_properties(n + 1, c)?))?;
            if !p.s_l_comments()? {
                return Ok(false);
            }
            if p.block_sequence(seq_spaces(n, c))? {
                return Ok(true);
            }
            p.block_mapping(n)
        })
    }

    /// `s-l+flow-in-block(n)`: a flow node on its own line(s), closed by
    /// comments or a break.
    fn flow_in_block(&mut self, n: i32) -> PResult {
        self.speculate(|p| {
            if !p.separate(n + 1, Context::FlowOut)? {
                return Ok(false);
            }
            if !p.flow_node(n + 1, Context::FlowOut)? {
                return Ok(false);
            }
            p.s_l_comments()
        })
    }

    /// The absolute indentation of the entries starting at the cursor,
    /// required to exceed `n`. The cursor sits at a line start here.
    fn detect_block_indent(&self, n: i32) -> Option<i32> {
        let bytes = self.source.text().as_bytes();
        let start = self.cursor.pos();
        let mut q = start;
        while q < bytes.len() && bytes[q] == b' ' {
            q += 1;
        }
        let w = (q - start) as i32;
        (w > n).then_some(w)
    }

    /// A `-` that introduces a sequence entry (not part of a scalar).
    fn check_seq_entry(&self) -> bool {
        self.cursor.check(|ch| ch == '-') && !self.cursor.peek_nth(1).is_some_and(is_ns_char)
    }

    /// `l+block-sequence(n)`.
    fn block_sequence(&mut self, n: i32) -> PResult {
        let Some(w) = self.detect_block_indent(n) else {
            return Ok(false);
        };
        self.speculate(|p| {
            if !p.lookahead(|q| Ok(q.indent_exact(w) && q.check_seq_entry()))? {
                return Ok(false);
            }
            let at = p.cursor.pos() + w.max(0) as usize;
            p.emit_sequence_start(CollectionStyle::Block, at, at);
            if !p.plus(|q| q.attempt(|r| Ok(r.indent_exact(w) && r.block_seq_entry(w)?)))? {
                return Ok(false);
            }
            p.emit_sequence_end_trimmed();
            Ok(true)
        })
    }

    /// `c-l-block-seq-entry(n)`: `-` then an indented block node.
    fn block_seq_entry(&mut self, n: i32) -> PResult {
        if !self.check_seq_entry() {
            return Ok(false);
        }
        self.cursor.eat_char('-');
        self.block_indented(n, Context::BlockIn)
    }

    /// `s-l+block-indented(n,c)`: a compact collection on the indicator's
    /// line, a full block node, or an empty node.
    pub(crate) fn block_indented(&mut self, n: i32, c: Context) -> PResult {
        if self.speculate(|p| {
            let m = p.cursor.eat_while(|ch| ch == ' ') as i32;
            if p.compact_sequence(n + 1 + m)? {
                return Ok(true);
            }
            p.compact_mapping(n + 1 + m)
        })? {
            return Ok(true);
        }
        if self.block_node(n, c)? {
            return Ok(true);
        }
        self.speculate(|p| {
            let at = p.cursor.pos();
            p.emit_empty_scalar(at);
            p.s_l_comments()
        })
    }

    /// `ns-l-compact-sequence(n)`: first entry at the cursor, siblings at
    /// indent `n`.
    fn compact_sequence(&mut self, n: i32) -> PResult {
        if !self.check_seq_entry() {
            return Ok(false);
        }
        self.speculate(|p| {
            let at = p.cursor.pos();
            p.emit_sequence_start(CollectionStyle::Block, at, at);
            if !p.block_seq_entry(n)? {
                return Ok(false);
            }
            p.star(|q| q.attempt(|r| Ok(r.indent_exact(n) && r.block_seq_entry(n)?)))?;
            p.emit_sequence_end_trimmed();
            Ok(true)
        })
    }

    /// `ns-l-compact-mapping(n)`.
    fn compact_mapping(&mut self, n: i32) -> PResult {
        self.speculate(|p| {
            let at = p.cursor.pos();
            p.emit_mapping_start(CollectionStyle::Block, at, at);
            if !p.block_map_entry(n)? {
                return Ok(false);
            }
            p.star(|q| q.attempt(|r| Ok(r.indent_exact(n) && r.block_map_entry(n)?)))?;
            p.emit_mapping_end_trimmed();
            Ok(true)
        })
    }

    /// `l+block-mapping(n)`.
    fn block_mapping(&mut self, n: i32) -> PResult {
        let Some(w) = self.detect_block_indent(n) else {
            return Ok(false);
        };
        self.speculate(|p| {
            if !p.indent_exact(w) {
                return Ok(false);
            }
            let at = p.cursor.pos();
            p.emit_mapping_start(CollectionStyle::Block, at, at);
            if !p.block_map_entry(w)? {
                return Ok(false);
            }
            p.star(|q| q.attempt(|r| Ok(r.indent_exact(w) && r.block_map_entry(w)?)))?;
            p.emit_mapping_end_trimmed();
            Ok(true)
        })
    }

    /// `ns-l-block-map-entry(n)`.
    fn block_map_entry(&mut self, n: i32) -> PResult {
        if self.block_map_explicit_entry(n)? {
            return Ok(true);
        }
        self.block_map_implicit_entry(n)
    }

    /// `c-l-block-map-explicit-entry(n)`: `? key` then `: value`.
    fn block_map_explicit_entry(&mut self, n: i32) -> PResult {
        if !(self.cursor.check(|ch| ch == '?') && !self.cursor.peek_nth(1).is_some_and(is_ns_char))
        {
            return Ok(false);
        }
        self.speculate(|p| {
            p.cursor.eat_char('?');
            if !p.block_indented(n, Context::BlockOut)? {
                return Ok(false);
            }
            let has_value = p.attempt(|q| {
                if !q.indent_exact(n) {
                    return Ok(false);
                }
                if !(q.cursor.check(|ch| ch == ':')
                    && !q.cursor.peek_nth(1).is_some_and(is_ns_char))
                {
                    return Ok(false);
                }
                q.cursor.eat_char(':');
                q.block_indented(n, Context::BlockOut)
            })?;
            if !has_value {
                let at = p.cursor.pos();
                p.emit_empty_scalar(at);
            }
            Ok(true)
        })
    }

    /// `ns-l-block-map-implicit-entry(n)`: a one-line key, `:`, and a block
    /// node (or nothing) as the value.
    fn block_map_implicit_entry(&mut self, n: i32) -> PResult {
        self.speculate(|p| {
            if !p.implicit_key()? {
                // An empty key still forms an entry when a `:` follows.
                if !(p.cursor.check(|ch| ch == ':')
                    && !p.cursor.peek_nth(1).is_some_and(is_ns_char))
                {
                    return Ok(false);
                }
                let at = p.cursor.pos();
                p.emit_empty_scalar(at);
            }
            if !p.cursor.eat_char(':') {
                return Ok(false);
            }
            if !p.block_node(n, Context::BlockOut)? {
                let at = p.cursor.pos();
                p.emit_empty_scalar(at);
                if !p.s_l_comments()? {
                    return Ok(false);
                }
            }
            Ok(true)
        })
    }

    /// `ns-s-block-map-implicit-key`: any one-line flow node, capped at
    /// 1024 bytes including trailing blanks.
    fn implicit_key(&mut self) -> PResult {
        self.speculate(|p| {
            let start = p.cursor.pos();
            if !p.flow_node(0, Context::BlockKey)? {
                return Ok(false);
            }
            p.cursor.eat_while(super::is_white);
            Ok(p.cursor.pos() - start <= 1024)
        })
    }
}
