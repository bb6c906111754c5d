//! Structured document parser
//!
//! `DocumentParser` is the seam between the codec and the byte-level
//! parsing primitive. `MarkupParser` is the built-in implementation: a
//! small, strict parser for the element subset undo documents use.
//!
//! Supported: prolog (`<?xml ..?>`), comments, elements, self-closing
//! elements, single or double quoted attributes, the five named entities
//! and numeric character references. Not supported: DTDs, CDATA sections,
//! namespaces (a prefixed name is just a name).
//!
//! Whitespace between child elements is dropped. The text of a leaf element
//! is kept exactly, including surrounding whitespace.

use super::element::Element;
use super::error::DocumentError;
use tracing::debug;
use undolog_core::markup;

/// Default nesting limit for `MarkupParser`
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Document parser trait.
///
/// Must fail on malformed input and must accept an in-memory buffer.
/// Parsers are `Send + Sync` so a single instance can be shared.
pub trait DocumentParser: Send + Sync {
    /// Parse `input` into its root element
    fn parse(&self, input: &[u8]) -> Result<Element, DocumentError>;

    /// Unique parser identifier
    fn parser_id(&self) -> &str;
}

/// Built-in strict markup parser
#[derive(Debug, Clone, Copy)]
pub struct MarkupParser {
    max_depth: usize,
}

impl Default for MarkupParser {
    fn default() -> Self {
        MarkupParser {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl MarkupParser {
    /// Create a parser with the default nesting limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the nesting limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse a string
    pub fn parse_str(&self, input: &str) -> Result<Element, DocumentError> {
        let mut cursor = Cursor {
            input,
            pos: 0,
            max_depth: self.max_depth,
        };
        cursor.skip_misc()?;
        if cursor.rest().is_empty() {
            return Err(cursor.error("empty document"));
        }
        let root = cursor.element(1)?;
        cursor.skip_misc()?;
        if !cursor.rest().is_empty() {
            return Err(cursor.error("trailing content after root element"));
        }
        debug!(target: "undolog::document", root = root.name(), bytes = input.len(), "Parsed document");
        Ok(root)
    }
}

impl DocumentParser for MarkupParser {
    fn parse(&self, input: &[u8]) -> Result<Element, DocumentError> {
        let text = std::str::from_utf8(input).map_err(|e| DocumentError::Encoding(e.to_string()))?;
        self.parse_str(text)
    }

    fn parser_id(&self) -> &str {
        "markup"
    }
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    max_depth: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn error(&self, detail: impl Into<String>) -> DocumentError {
        DocumentError::malformed(self.pos, detail)
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), DocumentError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", token)))
        }
    }

    fn skip_past(&mut self, terminator: &str) -> Result<(), DocumentError> {
        match self.rest().find(terminator) {
            Some(i) => {
                self.pos += i + terminator.len();
                Ok(())
            }
            None => Err(self.error(format!("missing '{}'", terminator))),
        }
    }

    /// Skip whitespace, prolog and comments
    fn skip_misc(&mut self) -> Result<(), DocumentError> {
        loop {
            self.skip_whitespace();
            if self.rest().starts_with("<?") {
                self.skip_past("?>")?;
            } else if self.rest().starts_with("<!--") {
                self.skip_past("-->")?;
            } else {
                return Ok(());
            }
        }
    }

    fn name(&mut self) -> Result<&'a str, DocumentError> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '>' | '/' | '=' | '<'))
            .unwrap_or(rest.len());
        let name = &rest[..end];
        if !markup::is_valid_name(name) {
            return Err(self.error(format!("invalid name '{}'", name)));
        }
        self.pos += end;
        Ok(name)
    }

    fn attribute_value(&mut self) -> Result<String, DocumentError> {
        let quote = match self.rest().chars().next() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("expected quoted attribute value")),
        };
        self.pos += 1;
        let rest = self.rest();
        let end = rest
            .find(quote)
            .ok_or_else(|| self.error("unterminated attribute value"))?;
        let raw = &rest[..end];
        if raw.contains('<') {
            return Err(self.error("'<' in attribute value"));
        }
        let value = markup::unescape(raw)
            .map_err(|e| self.error(e.to_string()))?
            .into_owned();
        self.pos += end + 1;
        Ok(value)
    }

    fn element(&mut self, depth: usize) -> Result<Element, DocumentError> {
        if depth > self.max_depth {
            return Err(DocumentError::TooDeep {
                max: self.max_depth,
            });
        }
        self.expect("<")?;
        let name = self.name()?;
        let mut element = Element::new(name);

        loop {
            self.skip_whitespace();
            if self.eat("/>") {
                return Ok(element);
            }
            if self.eat(">") {
                break;
            }
            let attribute = self.name()?;
            self.skip_whitespace();
            self.expect("=")?;
            self.skip_whitespace();
            let value = self.attribute_value()?;
            if element.attribute(attribute).is_some() {
                return Err(self.error(format!("duplicate attribute '{}'", attribute)));
            }
            element.push_attribute(attribute, value);
        }

        let mut text = String::new();
        loop {
            let rest = self.rest();
            let lt = rest
                .find('<')
                .ok_or_else(|| self.error(format!("unterminated element <{}>", name)))?;
            text.push_str(&rest[..lt]);
            self.pos += lt;

            if self.eat("</") {
                let close = self.name()?;
                if close != name {
                    return Err(self.error(format!(
                        "closing tag </{}> does not match <{}>",
                        close, name
                    )));
                }
                self.skip_whitespace();
                self.expect(">")?;
                break;
            } else if self.rest().starts_with("<!--") {
                self.skip_past("-->")?;
            } else if self.rest().starts_with("<![CDATA[") || self.rest().starts_with("<!") {
                return Err(self.error("declarations and CDATA sections are not supported"));
            } else if self.rest().starts_with("<?") {
                self.skip_past("?>")?;
            } else {
                let child = self.element(depth + 1)?;
                element.push_child(child);
            }
        }

        if element.is_leaf() || !text.trim().is_empty() {
            markup::unescape(&text).map_err(|e| self.error(e.to_string()))?;
            element.set_text(text);
        }
        Ok(element)
    }
}
