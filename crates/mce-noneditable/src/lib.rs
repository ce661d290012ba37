//! Caret and selection handling around non-editable regions.
//!
//! Elements marked `contenteditable="false"` (or with the internal
//! `data-mce-contenteditable` marker) are atomic: the caret may sit next to
//! them but never inside. [`NonEditable`] reacts to mouse-up, key-up and
//! key-down events on an [`EditorDom`]:
//!
//! - a collapsed caret inside a non-editable region moves into an invisible
//!   caret container beside it, or the whole element gets selected;
//! - a range touching a non-editable region is widened to enclose it;
//! - keys that would edit a non-editable region are suppressed.
//!
//! [`classify`] only reads the document; [`apply`] performs the edits.

mod caret;
mod dom;
mod editable;
mod filters;
mod keys;
mod plugin;
mod state;

pub use caret::{CARET_CONTAINER_ID, caret_container_parent, remove_container, remove_stale_containers};
pub use dom::EditorDom;
pub use editable::{
    ContentEditable, INTERNAL_ATTRIBUTE, NATIVE_ATTRIBUTE, content_editable, is_editable,
    non_editable_parent,
};
pub use filters::{register_parser_filters, register_serializer_filters};
pub use keys::{Key, KeyOutcome};
pub use plugin::{NonEditable, NonEditableSettings};
pub use state::{SelectionState, Side, apply, classify};
