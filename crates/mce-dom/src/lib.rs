//! Document model for the MCE content pipeline.
//!
//! An arena [`Tree`] of DOM-like nodes, a bounded [`TreeWalker`], DOM
//! [`Range`]s with the selection element helpers, the element
//! [`Schema`], and the entity and inline style codecs used when markup is
//! parsed and written back.
//!
//! # Example
//!
//! ```
//! use mce_dom::{NodeType, Tree};
//!
//! let mut tree = Tree::new();
//! let root = tree.root();
//! let p = tree.create_element("p");
//! let text = tree.create_text("Hello");
//! tree.append_child(root, p);
//! tree.append_child(p, text);
//!
//! assert_eq!(tree.node_type(text), NodeType::Text);
//! assert_eq!(tree.text_content(p), "Hello");
//! ```

mod document;
pub mod entities;
mod error;
mod node;
mod range;
mod schema;
pub mod styles;
mod tree;
mod walker;

pub use document::Document;
pub use entities::EntityEncoding;
pub use error::SchemaError;
pub use node::{Attributes, NodeId, NodeType};
pub use range::{BoundaryPoint, Range, end_element, start_element};
pub use schema::{AttributeRule, ElementRule, INTERNAL_ATTRIBUTE_PREFIX, Schema};
pub use tree::{Ancestors, Children, Descendants, Tree};
pub use walker::TreeWalker;
