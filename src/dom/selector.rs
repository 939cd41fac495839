use scraper::{ElementRef, Html, Selector};

use crate::dom::dom_model::ElementInfo;
use crate::error::DomError;

pub fn parse_selector(source: &str) -> Result<Selector, DomError> {
    Selector::parse(source).map_err(|e| DomError::InvalidSelector {
        selector: source.to_string(),
        reason: e.to_string(),
    })
}

/// One element rendered as an HTML fragment, so selectors match it with HTML
/// rules: tag names and values of attributes such as `type` compare
/// case-insensitively, like `querySelectorAll` does.
///
/// Only the element itself is rendered. Combinators that look at ancestors or
/// siblings see the fragment, not the page. Elements the HTML parser refuses in
/// body context (`html`, `head`, `body`) match nothing.
pub struct ElementFragment {
    fragment: Html,
}

impl ElementFragment {
    pub fn new(element: &ElementInfo) -> Self {
        Self {
            fragment: Html::parse_fragment(&render(element)),
        }
    }

    pub fn matches(&self, selector: &Selector) -> bool {
        self.fragment
            .root_element()
            .children()
            .find_map(ElementRef::wrap)
            .is_some_and(|element| selector.matches(&element))
    }
}

fn render(element: &ElementInfo) -> String {
    let mut html = format!("<{}", element.tag);
    for (name, value) in &element.attributes {
        if !is_attribute_name(name) {
            continue;
        }
        html.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
    }
    html.push('>');
    html
}

fn is_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '>' | '/' | '=' | '<'))
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
