//! XML reader and writer
//!
//! Maps XML documents onto `serde_json::Value` trees and back:
//! - text-only elements become strings (no type inference, the server's
//!   text is kept verbatim so documents re-serialize unchanged)
//! - empty and self-closing elements become `null`
//! - elements with children become objects, insertion order preserved
//! - repeated sibling tags collapse into an array under one key
//!
//! Attributes, comments, processing instructions and DOCTYPE declarations
//! are accepted and dropped. Mixed content keeps only the child elements.

use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Declaration emitted at the top of every written document
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

// ============================================================================
// Reader
// ============================================================================

/// Parse a complete document, returning the root tag and its value
pub fn parse(input: &str) -> Result<(String, Value)> {
    let mut parser = Parser::new(input);
    parser.skip_misc()?;
    if parser.at_end() {
        return Err(Error::malformed("XML document has no root element"));
    }
    let (tag, value) = parser.parse_element()?;
    parser.skip_misc()?;
    if !parser.at_end() {
        return Err(parser.error("unexpected content after root element"));
    }
    Ok((tag, value))
}

/// Cursor over the raw document text
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        // A UTF-8 byte order mark is legal before the declaration
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn error(&self, message: &str) -> Error {
        Error::malformed(format!("XML {message} at byte {}", self.pos))
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    /// Advance past `terminator`, returning the text before it
    fn take_until(&mut self, terminator: &str) -> Result<&'a str> {
        let rest = self.rest();
        match rest.find(terminator) {
            Some(idx) => {
                self.pos += idx + terminator.len();
                Ok(&rest[..idx])
            }
            None => Err(self.error(&format!("missing '{terminator}'"))),
        }
    }

    /// Skip whitespace, declarations, comments and DOCTYPE between elements
    fn skip_misc(&mut self) -> Result<()> {
        loop {
            self.skip_whitespace();
            if self.starts_with("<?") {
                self.take_until("?>")?;
            } else if self.starts_with("<!--") {
                self.take_until("-->")?;
            } else if self.starts_with("<!DOCTYPE") || self.starts_with("<!doctype") {
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_doctype(&mut self) -> Result<()> {
        let mut depth = 0usize;
        for (idx, ch) in self.rest().char_indices() {
            match ch {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                '>' if depth == 0 => {
                    self.pos += idx + 1;
                    return Ok(());
                }
                _ => {}
            }
        }
        Err(self.error("unterminated DOCTYPE"))
    }

    fn parse_name(&mut self) -> Result<&'a str> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(self.error("expected tag name"));
        }
        self.pos += end;
        Ok(&rest[..end])
    }

    /// Skip attributes up to the end of the start tag.
    ///
    /// Returns true when the tag was self-closing.
    fn finish_start_tag(&mut self) -> Result<bool> {
        let mut quote: Option<char> = None;
        for (idx, ch) in self.rest().char_indices() {
            match (quote, ch) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(ch),
                (None, '>') => {
                    let self_closing = self.rest()[..idx].trim_end().ends_with('/');
                    self.pos += idx + 1;
                    return Ok(self_closing);
                }
                _ => {}
            }
        }
        Err(self.error("unterminated start tag"))
    }

    fn parse_element(&mut self) -> Result<(String, Value)> {
        if !self.starts_with("<") {
            return Err(self.error("expected '<'"));
        }
        self.pos += 1;
        let tag = self.parse_name()?.to_string();
        if self.finish_start_tag()? {
            return Ok((tag, Value::Null));
        }

        let mut text = String::new();
        let mut children: Vec<(String, Value)> = Vec::new();

        loop {
            if self.at_end() {
                return Err(self.error(&format!("missing closing tag for <{tag}>")));
            }
            if self.starts_with("</") {
                self.pos += 2;
                let closing = self.parse_name()?;
                if closing != tag {
                    return Err(self.error(&format!(
                        "mismatched closing tag </{closing}> for <{tag}>"
                    )));
                }
                self.skip_whitespace();
                if !self.starts_with(">") {
                    return Err(self.error("malformed closing tag"));
                }
                self.pos += 1;
                break;
            } else if self.starts_with("<![CDATA[") {
                self.pos += "<![CDATA[".len();
                text.push_str(self.take_until("]]>")?);
            } else if self.starts_with("<!--") {
                self.take_until("-->")?;
            } else if self.starts_with("<?") {
                self.take_until("?>")?;
            } else if self.starts_with("<") {
                children.push(self.parse_element()?);
            } else {
                let rest = self.rest();
                let end = rest.find('<').unwrap_or(rest.len());
                text.push_str(&unescape(&rest[..end]));
                self.pos += end;
            }
        }

        if children.is_empty() {
            if text.trim().is_empty() {
                return Ok((tag, Value::Null));
            }
            return Ok((tag, Value::String(text)));
        }

        Ok((tag, group_children(children)))
    }
}

/// Fold child elements into an object, turning repeated tags into arrays
fn group_children(children: Vec<(String, Value)>) -> Value {
    let mut obj = Map::new();
    for (tag, value) in children {
        match obj.get_mut(&tag) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                obj.insert(tag, value);
            }
        }
    }
    Value::Object(obj)
}

/// Resolve the predefined and numeric character references
pub fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];
        let Some(semi) = after.find(';') else {
            out.push_str(after);
            return out;
        };
        let entity = &after[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &after[semi + 1..];
            }
            None => {
                // Unknown entity, keep it literally
                out.push('&');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// ============================================================================
// Writer
// ============================================================================

/// Escape text for element content
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Write a value as a complete document under `root_tag`
pub fn write(root_tag: &str, value: &Value) -> String {
    let mut out = String::from(XML_DECLARATION);
    write_element(&mut out, root_tag, value);
    out
}

fn write_element(out: &mut String, tag: &str, value: &Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                write_element(out, tag, item);
            }
        }
        Value::Null => {
            out.push('<');
            out.push_str(tag);
            out.push_str("/>");
        }
        Value::Object(map) => {
            out.push('<');
            out.push_str(tag);
            out.push('>');
            for (child, child_value) in map {
                write_element(out, child, child_value);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        Value::String(s) => write_text(out, tag, s),
        Value::Bool(b) => write_text(out, tag, if *b { "true" } else { "false" }),
        Value::Number(n) => write_text(out, tag, &n.to_string()),
    }
}

fn write_text(out: &mut String, tag: &str, text: &str) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(&escape(text));
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}
