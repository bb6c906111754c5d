//! Parsed document tree
//!
//! An Element is `{tag, attributes, children, text}`. Attribute values are
//! held decoded. Text is held as written, still escaped, because whether it
//! needs decoding depends on the field type the reader finds in `TypeId`.

use super::error::DocumentError;
use std::borrow::Cow;
use undolog_core::markup;

/// A document element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an attribute (builder style)
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_attribute(name, value);
        self
    }

    /// Add a child (builder style)
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Set the text as written (builder style)
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Tag name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes in document order
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Attributes as borrowed pairs
    pub fn attribute_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Value of the named attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Append an attribute
    pub fn push_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((name.into(), value.into()));
    }

    /// Child elements in document order
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Append a child element
    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// First child with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Text content as written
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text content (as written)
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Text content with entities decoded
    pub fn decoded_text(&self) -> Result<Cow<'_, str>, DocumentError> {
        markup::unescape(&self.text).map_err(|e| DocumentError::BadEntity {
            element: self.name.clone(),
            detail: e.to_string(),
        })
    }

    /// Whether the element has no children
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Append compact markup for this element and its subtree to `out`
    pub fn write_markup(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attributes {
            markup::push_attribute(out, name, value);
        }
        out.push('>');
        out.push_str(&self.text);
        for child in &self.children {
            child.write_markup(out);
        }
        markup::close_tag(out, &self.name);
    }

    /// Compact markup for this element and its subtree
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }
}
