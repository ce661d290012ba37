//! Filtering HTML serializer.
//!
//! [`Serializer`] clones a subtree, lets pre-process callbacks adjust the
//! clone, re-parses its markup through the schema-aware parser and the
//! built-in cleanup filters, renders it with the configured entity
//! encoding and hands the result to post-process callbacks.
//!
//! Built-in filters, in order:
//!
//! - `src,href,style`: promote `data-mce-*` mirrors, normalize styles, convert URLs
//! - `class`: drop `mceItem*` classes
//! - `data-mce-type`: remove bookmarks
//! - `data-mce-bogus`: remove or unwrap editor-only elements
//! - `data-mce-src,data-mce-href,data-mce-style,data-mce-selected`: strip leftovers
//! - `script,style`: restore script types, wrap content in comment guards
//! - `br`: remove trailing line breaks of blocks
//! - `#comment`: restore CDATA sections and protected fragments
//! - `#pi,input`: drop namespace declarations, default `input` type
//! - `ul,ol`: optionally move stray nested lists into the previous item

mod error;
mod filters;
mod serializer;
mod url_converter;

pub use error::SerializeError;
pub use serializer::{DEFAULT_CARET_CHAR, Format, SerializeArgs, Serializer, SerializerSettings};
pub use url_converter::{BaseUrlConverter, UrlConverter};
