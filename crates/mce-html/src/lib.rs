//! Markup layer of the MCE content pipeline.
//!
//! A tolerant tokenizer, the schema-aware [`DomParser`] with its ordered
//! [`FilterPipeline`], the [`HtmlSerializer`] writer and helpers to protect
//! fragments that must pass through parsing untouched.

mod filter;
mod parser;
pub mod protect;
pub mod tokenizer;
mod writer;

pub use filter::{FilterCallback, FilterPass, FilterPipeline};
pub use parser::DomParser;
pub use protect::{PROTECTED_PREFIX, protect, unprotect};
pub use writer::{ElementFormat, HtmlSerializer, inner_html, outer_html};
