//! Parser and serializer filters mapping marker classes to editability.

use mce_html::DomParser;
use mce_serializer::Serializer;

use crate::editable::INTERNAL_ATTRIBUTE;
use crate::plugin::NonEditableSettings;

/// Mark elements carrying the editable or non-editable class.
///
/// The editable class wins when an element carries both.
pub fn register_parser_filters(parser: &mut DomParser, settings: &NonEditableSettings) {
    let editable = settings.editable_class.clone();
    let noneditable = settings.noneditable_class.clone();

    parser.add_attribute_filter("class", move |pass, nodes, name| {
        for &node in nodes.iter().rev() {
            let Some(classes) = pass.tree.attr(node, name) else {
                continue;
            };
            let has = |class: &str| classes.split_ascii_whitespace().any(|c| c == class);
            let state = if has(&editable) {
                "true"
            } else if has(&noneditable) {
                "false"
            } else {
                continue;
            };
            pass.tree.set_attr(node, INTERNAL_ATTRIBUTE, state);
        }
    });
}

/// Keep the internal editability marker out of serialized output.
pub fn register_serializer_filters(serializer: &mut Serializer) {
    serializer.add_attribute_filter(INTERNAL_ATTRIBUTE, |pass, nodes, name| {
        for &node in nodes.iter().rev() {
            pass.tree.remove_attr(node, name);
        }
    });
}
