use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Opaque handle to a node owned by an `Environment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Tag name plus attributes of an element, as seen by selector matching.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementInfo {
    /// Lowercase tag name
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
}

impl ElementInfo {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_lowercase(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Viewport-relative rectangle, as returned by `getBoundingClientRect`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            left: self.left + dx,
            top: self.top + dy,
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Display {
    #[default]
    Block,
    Inline,
    InlineBlock,
    Flex,
    InlineFlex,
    Grid,
    InlineGrid,
    None,
}

impl Display {
    /// Flex and grid containers lay out their children themselves.
    pub fn is_layout_container(&self) -> bool {
        matches!(
            self,
            Display::Flex | Display::InlineFlex | Display::Grid | Display::InlineGrid
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

impl Position {
    /// Taken out of normal flow; wrapping such an element moves nothing.
    pub fn is_out_of_flow(&self) -> bool {
        matches!(self, Position::Absolute | Position::Fixed)
    }
}

/// The subset of computed style the layout decision reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComputedStyle {
    #[serde(default)]
    pub display: Display,
    #[serde(default)]
    pub position: Position,
}

/// How an element's text is read and written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextAccessor {
    /// `value` property of form fields
    Value,
    /// Rendered text of a rich editable region
    Content,
    /// Text of a region editable as plain text only
    PlainText,
}

impl TextAccessor {
    pub fn is_value_bearing(&self) -> bool {
        matches!(self, TextAccessor::Value)
    }
}

/// Batch entry delivered to mutation observers. Moves report the addition only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MutationRecord {
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportEvent {
    Scroll,
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Input,
    Change,
}

/// Synthetic event dispatched on an element after a programmatic write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub bubbles: bool,
}

impl Notification {
    pub fn input() -> Self {
        Self {
            kind: NotificationKind::Input,
            bubbles: true,
        }
    }

    pub fn change() -> Self {
        Self {
            kind: NotificationKind::Change,
            bubbles: true,
        }
    }
}
