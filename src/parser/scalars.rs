//! Scalar productions: plain, single- and double-quoted, literal and folded.

use crate::error::SyntaxError;
use crate::events::{EventReceiver, ScalarStyle};

use super::context::Context;
use super::{Engine, PResult, is_break, is_flow_indicator, is_indicator, is_ns_char, is_white};

/// `ns-plain-safe(c)`.
fn plain_safe(c: Context, ch: char) -> bool {
    match c {
        Context::FlowOut | Context::BlockKey => is_ns_char(ch),
        _ => is_ns_char(ch) && !is_flow_indicator(ch),
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Chomp {
    Strip,
    Clip,
    Keep,
}

impl<R: EventReceiver> Engine<'_, R> {
    // ------------------------------------------------------------------
    // Plain scalars
    // ------------------------------------------------------------------

    /// `ns-plain(n,c)`: scan, fold, and emit a plain scalar.
    pub(crate) fn plain_scalar(&mut self, n: i32, c: Context) -> PResult {
        let start = self.cursor.pos();
        let mut out = String::new();
        if !self.plain_first(c, &mut out) {
            return Ok(false);
        }
        self.plain_in_line(c, &mut out);
        let mut end = self.cursor.pos();
        if matches!(c, Context::FlowOut | Context::FlowIn) {
            while self.plain_next_line(n, c, &mut out)? {
                end = self.cursor.pos();
            }
        }
        self.emit_scalar(out, ScalarStyle::Plain, start, end);
        Ok(true)
    }

    /// `ns-plain-first(c)`.
    fn plain_first(&mut self, c: Context, out: &mut String) -> bool {
        let Some(ch) = self.cursor.peek() else {
            return false;
        };
        let ok = if is_ns_char(ch) && !is_indicator(ch) {
            true
        } else if matches!(ch, '-' | '?' | ':') {
            self.cursor.peek_nth(1).is_some_and(|next| plain_safe(c, next))
        } else {
            false
        };
        if ok {
            self.cursor.eat_if(|x| x == ch);
            out.push(ch);
        }
        ok
    }

    /// One `ns-plain-char(c)` at the cursor.
    fn eat_plain_char(&mut self, c: Context, out: &mut String) -> bool {
        let Some(ch) = self.cursor.peek() else {
            return false;
        };
        match ch {
            // `#` continues a plain scalar only when glued to the
            // preceding non-space character.
            '#' => match self.cursor.prev_byte() {
                Some(b) if !matches!(b, b' ' | b'\t' | b'\n' | b'\r') => {}
                _ => return false,
            },
            // `:` only when followed by a safe character.
            ':' => {
                if !self.cursor.peek_nth(1).is_some_and(|next| plain_safe(c, next)) {
                    return false;
                }
            }
            _ => {
                if !plain_safe(c, ch) {
                    return false;
                }
            }
        }
        self.cursor.eat_if(|x| x == ch);
        out.push(ch);
        true
    }

    /// `nb-ns-plain-in-line(c)`: blanks glued to further plain characters.
    fn plain_in_line(&mut self, c: Context, out: &mut String) {
        loop {
            let saved = self.cursor.pos();
            let ws_start = self.cursor.pos();
            self.cursor.eat_while(is_white);
            let ws = self.cursor.slice(ws_start, self.cursor.pos()).to_owned();
            let len_before = out.len();
            out.push_str(&ws);
            if !self.eat_plain_char(c, out) {
                out.truncate(len_before);
                self.cursor.set_pos(saved);
                break;
            }
        }
    }

    /// `s-ns-plain-next-line(n,c)`: fold onto a continuation line.
    fn plain_next_line(&mut self, n: i32, c: Context, out: &mut String) -> PResult {
        let saved = self.cursor.pos();
        let len = out.len();
        if self.flow_folded(n, out)? && self.eat_plain_char(c, out) {
            self.plain_in_line(c, out);
            return Ok(true);
        }
        out.truncate(len);
        self.cursor.set_pos(saved);
        Ok(false)
    }

    // ------------------------------------------------------------------
    // Folding shared by plain and quoted scalars
    // ------------------------------------------------------------------

    /// `b-l-folded(n,c)`: a break run. One break folds to a space, a run of
    /// `k` breaks folds to `k - 1` line feeds.
    pub(crate) fn fold_breaks(&mut self, n: i32, c: Context, out: &mut String) -> PResult {
        if !self.eat_break() {
            return Ok(false);
        }
        let mut empties = 0;
        while self.empty_line(n, c)? {
            empties += 1;
        }
        if empties == 0 {
            out.push(' ');
        } else {
            for _ in 0..empties {
                out.push('\n');
            }
        }
        Ok(true)
    }

    /// `s-flow-folded(n)`: trailing blanks, a break run, and the next
    /// line's prefix.
    pub(crate) fn flow_folded(&mut self, n: i32, out: &mut String) -> PResult {
        let saved = self.cursor.pos();
        let len = out.len();
        self.cursor.eat_while(is_white);
        if self.fold_breaks(n, Context::FlowIn, out)? && self.flow_line_prefix(n) {
            return Ok(true);
        }
        out.truncate(len);
        self.cursor.set_pos(saved);
        Ok(false)
    }

    // ------------------------------------------------------------------
    // Quoted scalars
    // ------------------------------------------------------------------

    /// `c-single-quoted(n,c)`. `''` decodes to a quote; folding works as in
    /// plain scalars.
    pub(crate) fn single_quoted(&mut self, n: i32, c: Context) -> PResult {
        let start = self.cursor.pos();
        if !self.cursor.eat_char('\'') {
            return Ok(false);
        }
        let one_line = c.is_key();
        let mut out = String::new();
        let mut pending_ws = String::new();
        loop {
            if self.cursor.check_str("''") {
                self.cursor.eat_str("''");
                out.push_str(&pending_ws);
                pending_ws.clear();
                out.push('\'');
                continue;
            }
            if self.cursor.eat_char('\'') {
                out.push_str(&pending_ws);
                let end = self.cursor.pos();
                self.emit_scalar(out, ScalarStyle::SingleQuoted, start, end);
                return Ok(true);
            }
            match self.cursor.peek() {
                None => {
                    if one_line {
                        self.cursor.set_pos(start);
                        return Ok(false);
                    }
                    return Err(self.quote_error(start, "single-quoted"));
                }
                Some(ch) if is_break(ch) => {
                    if one_line {
                        self.cursor.set_pos(start);
                        return Ok(false);
                    }
                    pending_ws.clear();
                    if !self.flow_folded(n, &mut out)? {
                        return Err(self.quote_error(start, "single-quoted"));
                    }
                }
                Some(ch) if is_white(ch) => {
                    pending_ws.push(ch);
                    self.cursor.eat_if(is_white);
                }
                Some(ch) => {
                    out.push_str(&pending_ws);
                    pending_ws.clear();
                    out.push(ch);
                    self.cursor.eat_if(|x| x == ch);
                }
            }
        }
    }

    /// `c-double-quoted(n,c)` with the full escape table and `\`-continued
    /// lines.
    pub(crate) fn double_quoted(&mut self, n: i32, c: Context) -> PResult {
        let start = self.cursor.pos();
        if !self.cursor.eat_char('"') {
            return Ok(false);
        }
        let one_line = c.is_key();
        let mut out = String::new();
        let mut pending_ws = String::new();
        loop {
            if self.cursor.eat_char('"') {
                out.push_str(&pending_ws);
                let end = self.cursor.pos();
                self.emit_scalar(out, ScalarStyle::DoubleQuoted, start, end);
                return Ok(true);
            }
            match self.cursor.peek() {
                None => {
                    if one_line {
                        self.cursor.set_pos(start);
                        return Ok(false);
                    }
                    return Err(self.quote_error(start, "double-quoted"));
                }
                Some('\\') => {
                    self.cursor.eat_char('\\');
                    if self.cursor.check(is_break) {
                        // Escaped break: the break and the next line's
                        // indentation vanish; blanks before the escape stay.
                        out.push_str(&pending_ws);
                        pending_ws.clear();
                        self.eat_break();
                        while self.empty_line(n, Context::FlowIn)? {}
                        if !self.flow_line_prefix(n) {
                            return Err(self.quote_error(start, "double-quoted"));
                        }
                    } else {
                        out.push_str(&pending_ws);
                        pending_ws.clear();
                        let decoded = self.decode_escape()?;
                        out.push(decoded);
                    }
                }
                Some(ch) if is_break(ch) => {
                    if one_line {
                        self.cursor.set_pos(start);
                        return Ok(false);
                    }
                    pending_ws.clear();
                    if !self.flow_folded(n, &mut out)? {
                        return Err(self.quote_error(start, "double-quoted"));
                    }
                }
                Some(ch) if is_white(ch) => {
                    pending_ws.push(ch);
                    self.cursor.eat_if(is_white);
                }
                Some(ch) => {
                    out.push_str(&pending_ws);
                    pending_ws.clear();
                    out.push(ch);
                    self.cursor.eat_if(|x| x == ch);
                }
            }
        }
    }

    fn quote_error(&self, start: usize, what: &str) -> SyntaxError {
        self.syntax_error_at(
            start,
            &format!("while parsing a {what} scalar, did not find expected closing quote"),
        )
    }

    fn decode_escape(&mut self) -> Result<char, SyntaxError> {
        let Some(ch) = self.cursor.peek() else {
            return Err(self.syntax_error("unexpected end of escape sequence"));
        };
        self.cursor.eat_if(|x| x == ch);
        let decoded = match ch {
            '0' => '\0',
            'a' => '\x07',
            'b' => '\x08',
            't' => '\t',
            'n' => '\n',
            'v' => '\x0b',
            'f' => '\x0c',
            'r' => '\r',
            'e' => '\x1b',
            ' ' => ' ',
            '"' => '"',
            '/' => '/',
            '\\' => '\\',
            'N' => '\u{85}',
            '_' => '\u{a0}',
            'L' => '\u{2028}',
            'P' => '\u{2029}',
            'x' => return self.hex_escape(2),
            'u' => return self.hex_escape(4),
            'U' => return self.hex_escape(8),
            _ => return Err(self.syntax_error("found unknown escape character")),
        };
        Ok(decoded)
    }

    fn hex_escape(&mut self, digits: u32) -> Result<char, SyntaxError> {
        let start = self.cursor.pos();
        for _ in 0..digits {
            if self.cursor.eat_if(|c| c.is_ascii_hexdigit()).is_none() {
                return Err(self.syntax_error("expected hexadecimal digit in escape sequence"));
            }
        }
        let text = self.cursor.slice(start, self.cursor.pos());
        let code = u32::from_str_radix(text, 16)
            .map_err(|_| self.syntax_error_at(start, "invalid escape sequence"))?;
        char::from_u32(code)
            .ok_or_else(|| self.syntax_error_at(start, "invalid Unicode code point in escape"))
    }

    // ------------------------------------------------------------------
    // Block scalars
    // ------------------------------------------------------------------

    /// `c-l+literal(n)` / `c-l+folded(n)`: header, indentation detection,
    /// content lines, chomping.
    pub(crate) fn block_scalar(&mut self, n: i32, folded: bool) -> PResult {
        let start = self.cursor.pos();
        let indicator = if folded { '>' } else { '|' };
        if !self.cursor.eat_char(indicator) {
            return Ok(false);
        }
        let (chomp, explicit) = self.block_header()?;
        if !self.s_b_comment()? {
            return Err(
                self.syntax_error("while scanning a block scalar, did not find expected comment or line break")
            );
        }
        let w = match explicit {
            Some(m) => n + m,
            None => n + self.detect_scalar_indent(n)?,
        };

        // Collect content: text lines at indent `w` with the number of
        // empty lines preceding each, plus the trailing empty-line run.
        let mut chunks: Vec<(usize, String, bool)> = Vec::new();
        let mut pending_empties = 0usize;
        let mut end = self.cursor.pos();
        loop {
            if self.empty_line(w, Context::BlockIn)? {
                pending_empties += 1;
                continue;
            }
            let saved = self.cursor.pos();
            if !self.indent_exact(w) {
                break;
            }
            let line_start = self.cursor.pos();
            match self.cursor.peek() {
                Some(ch) if !is_break(ch) => {}
                _ => {
                    self.cursor.set_pos(saved);
                    break;
                }
            }
            let more_indented = self.cursor.check(is_white);
            self.cursor.eat_while(|ch| !is_break(ch));
            let text = self.cursor.slice(line_start, self.cursor.pos()).to_owned();
            end = self.cursor.pos();
            let had_break = self.eat_break();
            chunks.push((pending_empties, text, more_indented));
            pending_empties = 0;
            if !had_break {
                break;
            }
        }

        let value = assemble_block_scalar(&chunks, pending_empties, folded, chomp);
        let style = if folded {
            ScalarStyle::Folded
        } else {
            ScalarStyle::Literal
        };
        self.emit_scalar(value, style, start, end);
        Ok(true)
    }

    /// `c-b-block-header(m,t)`: optional chomping and indentation
    /// indicators in either order.
    fn block_header(&mut self) -> Result<(Chomp, Option<i32>), SyntaxError> {
        let mut chomp = Chomp::Clip;
        let mut explicit = None;
        let mut saw_chomp = false;
        loop {
            let Some(ch) = self.cursor.peek() else { break };
            match ch {
                '-' | '+' if !saw_chomp => {
                    saw_chomp = true;
                    chomp = if ch == '-' { Chomp::Strip } else { Chomp::Keep };
                    self.cursor.eat_if(|x| x == ch);
                }
                '0' if explicit.is_none() => {
                    return Err(self.syntax_error("found an indentation indicator equal to 0"));
                }
                '1'..='9' if explicit.is_none() => {
                    explicit = Some(ch as i32 - '0' as i32);
                    self.cursor.eat_if(|x| x == ch);
                }
                _ => break,
            }
        }
        Ok((chomp, explicit))
    }

    /// Auto-detect the indentation of block scalar content: the indent of
    /// the first non-empty line, relative to `n` (at least one). An earlier
    /// all-space line deeper than the content is a syntax error.
    fn detect_scalar_indent(&self, n: i32) -> Result<i32, SyntaxError> {
        let bytes = self.source.text().as_bytes();
        let mut p = self.cursor.pos();
        let mut max_empty = 0i32;
        while p < bytes.len() {
            let line_start = p;
            let mut q = p;
            while q < bytes.len() && bytes[q] == b' ' {
                q += 1;
            }
            let indent = (q - line_start) as i32;
            if q < bytes.len() && (bytes[q] == b'\n' || bytes[q] == b'\r') {
                max_empty = max_empty.max(indent);
                p = q + 1;
                if bytes[q] == b'\r' && p < bytes.len() && bytes[p] == b'\n' {
                    p += 1;
                }
                continue;
            }
            let m = (indent - n).max(1);
            if max_empty > n + m {
                return Err(self.syntax_error_at(
                    line_start,
                    "a leading all-space line must not hold more spaces than the first content line",
                ));
            }
            return Ok(m);
        }
        Ok((max_empty - n).max(1))
    }
}

/// Join collected block-scalar lines per style, then chomp.
fn assemble_block_scalar(
    chunks: &[(usize, String, bool)],
    trailing_empties: usize,
    folded: bool,
    chomp: Chomp,
) -> String {
    let mut value = String::new();
    let mut prev_more = false;
    for (i, (empties, text, more)) in chunks.iter().enumerate() {
        if i == 0 {
            for _ in 0..*empties {
                value.push('\n');
            }
        } else {
            let breaks = empties + 1;
            if folded && !prev_more && !*more {
                if breaks == 1 {
                    value.push(' ');
                } else {
                    for _ in 0..breaks - 1 {
                        value.push('\n');
                    }
                }
            } else {
                for _ in 0..breaks {
                    value.push('\n');
                }
            }
        }
        value.push_str(text);
        prev_more = *more;
    }
    match chomp {
        Chomp::Strip => {}
        Chomp::Clip => {
            if !chunks.is_empty() {
                value.push('\n');
            }
        }
        Chomp::Keep => {
            if chunks.is_empty() {
                for _ in 0..trailing_empties {
                    value.push('\n');
                }
            } else {
                for _ in 0..trailing_empties + 1 {
                    value.push('\n');
                }
            }
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(empties: usize, text: &str) -> (usize, String, bool) {
        (empties, text.to_owned(), false)
    }

    #[test]
    fn literal_clip_keeps_one_break() {
        let chunks = [chunk(0, "a"), chunk(0, "b")];
        assert_eq!(
            assemble_block_scalar(&chunks, 2, false, Chomp::Clip),
            "a\nb\n"
        );
    }

    #[test]
    fn literal_strip_and_keep() {
        let chunks = [chunk(0, "a")];
        assert_eq!(assemble_block_scalar(&chunks, 0, false, Chomp::Strip), "a");
        assert_eq!(
            assemble_block_scalar(&chunks, 2, false, Chomp::Keep),
            "a\n\n\n"
        );
    }

    #[test]
    fn folded_single_break_becomes_space() {
        let chunks = [chunk(0, "a"), chunk(0, "b"), chunk(1, "c")];
        assert_eq!(
            assemble_block_scalar(&chunks, 0, true, Chomp::Clip),
            "a b\nc\n"
        );
    }

    #[test]
    fn folded_keeps_breaks_around_indented_lines() {
        let chunks = [chunk(0, "a"), (0, "  in".to_owned(), true), chunk(0, "b")];
        assert_eq!(
            assemble_block_scalar(&chunks, 0, true, Chomp::Clip),
            "a\n  in\nb\n"
        );
    }
}
