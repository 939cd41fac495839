use tracing::debug;

use crate::control::control_model::{
    CONTROL_CLASS, CONTROL_TITLE, IDLE_LABEL, LayoutMode, OVERLAY_OFFSET_X, WRAPPER_CLASS,
};
use crate::dom::dom_model::{NodeId, Rect};
use crate::dom::environment::Environment;
use crate::error::{DomError, LayoutSkip};

/// Stylesheet shared by every control on the page.
pub const STYLESHEET: &str = r#"
.racco-enhance-btn {
  margin-left: 8px;
  padding: 4px 8px;
  border: 1px solid #4285f4;
  border-radius: 4px;
  background: #4285f4;
  color: white;
  font-size: 12px;
  font-weight: 500;
  cursor: pointer;
  transition: all 0.2s ease;
  white-space: nowrap;
}
.racco-enhance-btn:hover {
  background: #3367d6;
  border-color: #3367d6;
}
.racco-enhance-btn:disabled {
  background: #ccc;
  border-color: #ccc;
  cursor: not-allowed;
}
.racco-wrapper {
  display: inline-flex;
  align-items: flex-start;
  width: 100%;
  gap: 8px;
}
.racco-wrapper textarea,
.racco-wrapper input[type="text"] {
  flex: 1;
}
"#;

/// Overlay when a wrapper would fight the existing layout: the parent is a
/// flex/grid container, or the element is absolutely/fixed positioned.
pub fn decide_layout(env: &dyn Environment, node: NodeId) -> Result<LayoutMode, LayoutSkip> {
    let own = env.computed_style(node)?;
    let parent = env.parent(node)?.ok_or(LayoutSkip::NoParent)?;
    let parent_style = env.computed_style(parent)?;

    let mode = if parent_style.display.is_layout_container() || own.position.is_out_of_flow() {
        LayoutMode::Overlay
    } else {
        LayoutMode::Inline
    };
    debug!(?node, ?mode, parent_display = ?parent_style.display, position = ?own.position, "layout decided");
    Ok(mode)
}

/// Create an idle control button (not yet placed).
pub fn create_button(env: &dyn Environment) -> Result<NodeId, DomError> {
    let button = env.create_element("button");
    env.set_attribute(button, "type", "button")?;
    env.set_attribute(button, "class", CONTROL_CLASS)?;
    env.set_attribute(button, "title", CONTROL_TITLE)?;
    env.set_text_content(button, IDLE_LABEL)?;
    Ok(button)
}

/// Where an overlay button goes for an element at `rect`: (left, top).
pub fn overlay_position(rect: &Rect) -> (f64, f64) {
    (rect.right() - OVERLAY_OFFSET_X, rect.top)
}

fn px(value: f64) -> String {
    format!("{}px", value)
}

/// Wrap `node` and `button` in a flex container that keeps the element's width.
/// Returns the wrapper.
pub fn mount_inline(env: &dyn Environment, node: NodeId, button: NodeId) -> Result<NodeId, LayoutSkip> {
    let parent = env.parent(node)?.ok_or(LayoutSkip::NoParent)?;
    let width = match env.inline_style(node, "width")? {
        Some(w) if !w.is_empty() => w,
        _ => px(env.bounding_rect(node)?.width.round()),
    };

    let wrapper = env.create_element("div");
    env.set_attribute(wrapper, "class", WRAPPER_CLASS)?;
    env.set_style(wrapper, "display", "inline-flex")?;
    env.set_style(wrapper, "align-items", "flex-start")?;
    env.set_style(wrapper, "width", &width)?;

    env.insert_before(parent, wrapper, node)?;
    let moved = env
        .append_child(wrapper, node)
        .and_then(|_| env.append_child(wrapper, button));
    if let Err(e) = moved {
        // Put the element back where it was and drop the wrapper.
        let _ = env.insert_before(parent, node, wrapper);
        let _ = env.remove(wrapper);
        return Err(e.into());
    }
    Ok(wrapper)
}

/// Float `button` over the page at the element's top-right corner.
pub fn mount_overlay(env: &dyn Environment, node: NodeId, button: NodeId) -> Result<(), LayoutSkip> {
    let rect = env.bounding_rect(node)?;

    env.set_style(button, "position", "absolute")?;
    env.set_style(button, "z-index", "10000")?;
    env.set_style(button, "font-size", "10px")?;
    env.set_style(button, "padding", "2px 4px")?;
    place(env, button, &rect)?;

    env.append_child(env.body(), button)?;
    Ok(())
}

/// Re-measure `node` and move its overlay `button` to match.
pub fn reposition(env: &dyn Environment, node: NodeId, button: NodeId) -> Result<(), DomError> {
    let rect = env.bounding_rect(node)?;
    place(env, button, &rect)
}

fn place(env: &dyn Environment, button: NodeId, rect: &Rect) -> Result<(), DomError> {
    let (left, top) = overlay_position(rect);
    env.set_style(button, "left", &px(left))?;
    env.set_style(button, "top", &px(top))
}
