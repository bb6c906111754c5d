//! Structured document primitives
//!
//! - Element: the parsed tree `{tag, attributes, children, text}`
//! - DocumentParser: parser seam; MarkupParser is the built-in implementation
//! - DocumentError: malformed input and shape violations

mod element;
mod error;
mod parser;

pub use element::Element;
pub use error::DocumentError;
pub use parser::{DocumentParser, MarkupParser, DEFAULT_MAX_DEPTH};
