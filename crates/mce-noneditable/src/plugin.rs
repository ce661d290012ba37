//! Event handlers keeping the caret out of non-editable regions.

use mce_config::NonEditableConfig;
use mce_serializer::DEFAULT_CARET_CHAR;

use crate::caret::remove_stale_containers;
use crate::dom::EditorDom;
use crate::keys::{Key, KeyOutcome, handle_key_down};
use crate::state::{SelectionState, apply, classify};

/// Marker classes and caret character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEditableSettings {
    pub editable_class: String,
    pub noneditable_class: String,
    pub caret_char: char,
}

impl NonEditableSettings {
    #[must_use]
    pub fn new() -> Self {
        Self {
            editable_class: "mceEditable".to_owned(),
            noneditable_class: "mceNonEditable".to_owned(),
            caret_char: DEFAULT_CARET_CHAR,
        }
    }

    #[must_use]
    pub fn with_editable_class(mut self, class: impl Into<String>) -> Self {
        self.editable_class = class.into();
        self
    }

    #[must_use]
    pub fn with_noneditable_class(mut self, class: impl Into<String>) -> Self {
        self.noneditable_class = class.into();
        self
    }

    #[must_use]
    pub fn with_caret_char(mut self, caret: char) -> Self {
        self.caret_char = caret;
        self
    }
}

impl Default for NonEditableSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&NonEditableConfig> for NonEditableSettings {
    fn from(config: &NonEditableConfig) -> Self {
        Self::new()
            .with_editable_class(config.editable_class.trim())
            .with_noneditable_class(config.noneditable_class.trim())
            .with_caret_char(config.caret_char.as_char())
    }
}

/// Selection state machine bound to one document.
///
/// Every handler recomputes from the current tree and selection, so
/// repeated events are harmless.
#[derive(Debug)]
pub struct NonEditable<D> {
    dom: D,
    settings: NonEditableSettings,
}

impl<D: EditorDom> NonEditable<D> {
    pub fn new(dom: D) -> Self {
        Self::with_settings(dom, NonEditableSettings::new())
    }

    pub fn with_settings(dom: D, settings: NonEditableSettings) -> Self {
        Self { dom, settings }
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn settings(&self) -> &NonEditableSettings {
        &self.settings
    }

    pub fn into_inner(self) -> D {
        self.dom
    }

    /// Classify the current selection without touching the document.
    pub fn classify(&self) -> SelectionState {
        classify(&self.dom)
    }

    pub fn on_mouse_up(&mut self) -> SelectionState {
        self.move_selection()
    }

    pub fn on_key_up(&mut self) -> SelectionState {
        self.move_selection()
    }

    pub fn on_key_down(&mut self, key: Key) -> KeyOutcome {
        handle_key_down(&mut self.dom, key, self.settings.caret_char)
    }

    /// Drop stale caret containers, then reposition or expand the selection.
    fn move_selection(&mut self) -> SelectionState {
        remove_stale_containers(&mut self.dom, self.settings.caret_char);
        let state = classify(&self.dom);
        tracing::debug!(state = ?state, "Classified selection");
        apply(&mut self.dom, state, self.settings.caret_char);
        state
    }
}
