use std::sync::LazyLock;

use scraper::Selector;

use crate::dom::dom_model::{ElementInfo, NodeId, TextAccessor};
use crate::dom::selector::{ElementFragment, parse_selector};

/// Data attribute (`data-racco-attached`) marking an element as already handled.
pub const ATTACHED_MARKER: &str = "racco-attached";

/// Everything a control may be attached to, as one selector group.
pub const ELIGIBLE_SELECTOR: &str = r#"textarea, input[type=text], [contenteditable="true"], [contenteditable=""], [contenteditable="plaintext-only"]"#;

const RULES: &[(&str, TextAccessor)] = &[
    ("textarea", TextAccessor::Value),
    ("input[type=text]", TextAccessor::Value),
    (r#"[contenteditable="true"]"#, TextAccessor::Content),
    (r#"[contenteditable=""]"#, TextAccessor::Content),
    (r#"[contenteditable="plaintext-only"]"#, TextAccessor::PlainText),
];

static PARSED_RULES: LazyLock<Vec<(Selector, TextAccessor)>> = LazyLock::new(|| {
    RULES
        .iter()
        .filter_map(|(source, accessor)| {
            parse_selector(source)
                .ok()
                .map(|selector| (selector, *accessor))
        })
        .collect()
});

/// A node the scanner has claimed, with its accessor resolved once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EligibleElement {
    pub node: NodeId,
    pub accessor: TextAccessor,
}

/// Resolve how text is read from `element`, or `None` if it is not eligible.
pub fn classify(element: &ElementInfo) -> Option<TextAccessor> {
    let fragment = ElementFragment::new(element);
    PARSED_RULES
        .iter()
        .find(|(selector, _)| fragment.matches(selector))
        .map(|(_, accessor)| *accessor)
}
