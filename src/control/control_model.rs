use std::cell::Cell;

use serde::Serialize;

use crate::dom::dom_model::{NodeId, TextAccessor};
use crate::scanner::eligibility::EligibleElement;

pub const IDLE_LABEL: &str = "Enhance";
pub const BUSY_LABEL: &str = "Enhancing...";
pub const CONTROL_TITLE: &str = "Enhance this prompt using RACCO Prompt Enhancer";
pub const CONTROL_CLASS: &str = "racco-enhance-btn";
pub const WRAPPER_CLASS: &str = "racco-wrapper";

/// Horizontal distance from the element's right edge to an overlay's left edge.
pub const OVERLAY_OFFSET_X: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControlState {
    Idle,
    Busy,
    /// Transient: always followed by `Idle` in the same handler
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LayoutMode {
    /// Element and button share a wrapper inserted where the element was
    Inline,
    /// Button floats over the page, tracking the element's rectangle
    Overlay,
}

/// The trigger bound to one eligible element.
#[derive(Debug)]
pub struct Control {
    pub element: EligibleElement,
    pub button: NodeId,
    pub mode: LayoutMode,
    pub wrapper: Option<NodeId>,
    pub(crate) state: Cell<ControlState>,
}

impl Control {
    pub fn new(element: EligibleElement, button: NodeId, mode: LayoutMode, wrapper: Option<NodeId>) -> Self {
        Self {
            element,
            button,
            mode,
            wrapper,
            state: Cell::new(ControlState::Idle),
        }
    }

    pub fn state(&self) -> ControlState {
        self.state.get()
    }

    pub fn node(&self) -> NodeId {
        self.element.node
    }

    pub fn accessor(&self) -> TextAccessor {
        self.element.accessor
    }
}
