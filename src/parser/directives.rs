//! Directives, tag resolution, and node properties.

use log::debug;

use crate::error::SyntaxError;
use crate::events::Event;

use super::context::Context;
use super::{Engine, PResult, is_anchor_char, is_ns_char, is_tag_char, is_uri_char, is_word_char};
use crate::events::EventReceiver;

impl<R: EventReceiver> Engine<'_, R> {
    /// `l-directive`: `%YAML`, `%TAG`, or a reserved directive (ignored).
    pub(crate) fn directive(&mut self) -> PResult {
        if !self.cursor.eat_char('%') {
            return Ok(false);
        }
        let name_start = self.cursor.pos();
        self.cursor.eat_while(is_ns_char);
        let name = self.cursor.slice(name_start, self.cursor.pos()).to_owned();
        match name.as_str() {
            "YAML" => self.yaml_directive()?,
            "TAG" => self.tag_directive()?,
            _ => {
                debug!("ignoring reserved directive %{name}");
                self.cursor.eat_while(|c| !super::is_break(c));
            }
        }
        if !self.s_l_comments()? {
            return Err(self.syntax_error("did not find expected comment or line break"));
        }
        Ok(true)
    }

    fn yaml_directive(&mut self) -> Result<(), SyntaxError> {
        let at = self.cursor.pos();
        if self.version.is_some() {
            return Err(self.syntax_error_at(at, "found duplicate %YAML directive"));
        }
        self.require_directive_blanks()?;
        let major = self.directive_number()?;
        if !self.cursor.eat_char('.') {
            return Err(self.syntax_error("expected '.' in %YAML directive"));
        }
        let minor = self.directive_number()?;
        if major != 1 {
            return Err(self.syntax_error_at(at, "found incompatible YAML document version"));
        }
        if minor != 2 {
            debug!("accepting %YAML {major}.{minor} as 1.2");
        }
        self.version = Some((major, minor));
        Ok(())
    }

    fn tag_directive(&mut self) -> Result<(), SyntaxError> {
        self.require_directive_blanks()?;
        let handle_start = self.cursor.pos();
        if !self.cursor.eat_char('!') {
            return Err(self.syntax_error("expected '!' in %TAG directive"));
        }
        self.cursor.eat_while(is_word_char);
        self.cursor.eat_char('!');
        let handle = self
            .cursor
            .slice(handle_start, self.cursor.pos())
            .to_owned();
        self.require_directive_blanks()?;
        let prefix_start = self.cursor.pos();
        self.cursor.eat_while(is_uri_char);
        if self.cursor.pos() == prefix_start {
            return Err(self.syntax_error("expected tag prefix in %TAG directive"));
        }
        let prefix = self
            .cursor
            .slice(prefix_start, self.cursor.pos())
            .to_owned();
        if self.tag_directives.contains_key(&handle) {
            return Err(self.syntax_error_at(handle_start, "found duplicate %TAG directive"));
        }
        debug!("tag directive {handle} -> {prefix}");
        self.tag_directives.insert(handle.clone(), prefix.clone());
        self.user_directives.push((handle, prefix));
        Ok(())
    }

    fn require_directive_blanks(&mut self) -> Result<(), SyntaxError> {
        if self.cursor.eat_while(super::is_white) == 0 {
            return Err(self.syntax_error("expected whitespace in directive"));
        }
        Ok(())
    }

    fn directive_number(&mut self) -> Result<u32, SyntaxError> {
        let start = self.cursor.pos();
        self.cursor.eat_while(|c| c.is_ascii_digit());
        let digits = self.cursor.slice(start, self.cursor.pos());
        digits
            .parse::<u32>()
            .map_err(|_| self.syntax_error_at(start, "expected version number in %YAML directive"))
    }

    /// Resolve a tag handle against the document's `%TAG` table, falling
    /// back to the built-in primary and secondary prefixes.
    fn resolve_tag_handle(&self, handle: &str, at: usize) -> Result<String, SyntaxError> {
        if let Some(prefix) = self.tag_directives.get(handle) {
            return Ok(prefix.clone());
        }
        match handle {
            "!" => Ok("!".to_owned()),
            "!!" => Ok("tag:yaml.org,2002:".to_owned()),
            _ => Err(self.syntax_error_at(at, &format!("found undefined tag handle {handle}"))),
        }
    }

    // ------------------------------------------------------------------
    // Node properties
    // ------------------------------------------------------------------

    /// `c-ns-properties(n,c)`: a tag and/or an anchor, in either order.
    pub(crate) fn node_properties(&mut self, n: i32, c: Context) -> PResult {
        if self.tag_property()? {
            self.attempt(|p| Ok(p.separate(n, c)? && p.anchor_property()?))?;
            return Ok(true);
        }
        if self.anchor_property()? {
            self.attempt(|p| Ok(p.separate(n, c)? && p.tag_property()?))?;
            return Ok(true);
        }
        Ok(false)
    }

    fn set_tag(&mut self, tag: String, start: usize) {
        self.tag = Some(tag);
        self.prop_start = Some(self.prop_start.map_or(start, |p| p.min(start)));
    }

    /// `c-ns-tag-property`: verbatim `!<uri>`, shorthand, or a lone `!`.
    pub(crate) fn tag_property(&mut self) -> PResult {
        let start = self.cursor.pos();
        if !self.cursor.eat_char('!') {
            return Ok(false);
        }
        if self.cursor.eat_char('<') {
            let uri_start = self.cursor.pos();
            self.cursor.eat_while(is_uri_char);
            let uri = self.cursor.slice(uri_start, self.cursor.pos()).to_owned();
            if !self.cursor.eat_char('>') {
                return Err(self.syntax_error("did not find expected '>' in verbatim tag"));
            }
            if uri.is_empty() {
                return Err(self.syntax_error_at(start, "verbatim tag must not be empty"));
            }
            let decoded = self.decode_percent(&uri, start)?;
            self.set_tag(decoded, start);
            return Ok(true);
        }
        self.cursor.eat_while(is_word_char);
        if self.cursor.eat_char('!') {
            // A named handle `!name!` (or the secondary `!!`).
            let handle = self.cursor.slice(start, self.cursor.pos()).to_owned();
            let suffix_start = self.cursor.pos();
            self.cursor.eat_while(is_tag_char);
            if self.cursor.pos() == suffix_start {
                return Err(self.syntax_error("expected tag suffix after tag handle"));
            }
            let suffix = self
                .cursor
                .slice(suffix_start, self.cursor.pos())
                .to_owned();
            let prefix = self.resolve_tag_handle(&handle, start)?;
            let decoded = self.decode_percent(&suffix, suffix_start)?;
            self.set_tag(prefix + &decoded, start);
            return Ok(true);
        }
        self.cursor.eat_while(is_tag_char);
        let suffix = self.cursor.slice(start + 1, self.cursor.pos()).to_owned();
        if suffix.is_empty() {
            // The non-specific tag `!`.
            self.set_tag("!".to_owned(), start);
        } else {
            let prefix = self.resolve_tag_handle("!", start)?;
            let decoded = self.decode_percent(&suffix, start + 1)?;
            self.set_tag(prefix + &decoded, start);
        }
        Ok(true)
    }

    fn decode_percent(&self, text: &str, at: usize) -> Result<String, SyntaxError> {
        if !text.contains('%') {
            return Ok(text.to_owned());
        }
        let mut bytes = Vec::with_capacity(text.len());
        let mut iter = text.bytes();
        while let Some(b) = iter.next() {
            if b != b'%' {
                bytes.push(b);
                continue;
            }
            let hi = iter.next().and_then(hex_value);
            let lo = iter.next().and_then(hex_value);
            match (hi, lo) {
                (Some(hi), Some(lo)) => bytes.push(hi * 16 + lo),
                _ => return Err(self.syntax_error_at(at, "invalid percent escape in tag")),
            }
        }
        String::from_utf8(bytes)
            .map_err(|_| self.syntax_error_at(at, "percent escape in tag is not valid UTF-8"))
    }

    /// `c-ns-anchor-property`: `&name`.
    pub(crate) fn anchor_property(&mut self) -> PResult {
        let start = self.cursor.pos();
        if !self.cursor.eat_char('&') {
            return Ok(false);
        }
        let name_start = self.cursor.pos();
        self.cursor.eat_while(is_anchor_char);
        if self.cursor.pos() == name_start {
            return Err(self.syntax_error("did not find expected anchor name"));
        }
        let name = self.cursor.slice(name_start, self.cursor.pos()).to_owned();
        self.anchor = Some(name);
        self.prop_start = Some(self.prop_start.map_or(start, |p| p.min(start)));
        Ok(true)
    }

    /// `c-ns-alias-node`: `*name`, emitted immediately.
    pub(crate) fn alias_node(&mut self) -> PResult {
        let start = self.cursor.pos();
        if !self.cursor.eat_char('*') {
            return Ok(false);
        }
        let name_start = self.cursor.pos();
        self.cursor.eat_while(is_anchor_char);
        if self.cursor.pos() == name_start {
            return Err(self.syntax_error("did not find expected alias name"));
        }
        let name = self.cursor.slice(name_start, self.cursor.pos()).to_owned();
        let location = self.location(start, self.cursor.pos());
        self.push_event(Event::Alias { anchor: name }, location);
        Ok(true)
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
