use std::rc::Rc;

use crate::dom::dom_model::{
    ComputedStyle, ElementInfo, MutationRecord, NodeId, Notification, Rect, TextAccessor,
    ViewportEvent,
};
use crate::error::DomError;

pub type MutationCallback = Rc<dyn Fn(&[MutationRecord])>;
pub type ViewportCallback = Rc<dyn Fn(ViewportEvent)>;
pub type ClickCallback = Rc<dyn Fn()>;

/// Everything the scanner and controller are allowed to do to a page.
///
/// Implementations are single-threaded and event driven. Callbacks run on
/// later turns of the page's event loop, never while the environment holds
/// internal borrows: a callback may call straight back into the environment.
pub trait Environment {
    // ---- Query ----

    fn document_root(&self) -> NodeId;

    fn body(&self) -> NodeId;

    fn element(&self, node: NodeId) -> Result<ElementInfo, DomError>;

    /// Descendants of `root` (excluding `root`) matching `selector`, in document order.
    fn query(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>, DomError>;

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DomError>;

    fn is_connected(&self, node: NodeId) -> bool;

    fn computed_style(&self, node: NodeId) -> Result<ComputedStyle, DomError>;

    /// Value of an inline `style` property, if the page set one.
    fn inline_style(&self, node: NodeId, property: &str) -> Result<Option<String>, DomError>;

    fn data_attribute(&self, node: NodeId, key: &str) -> Result<Option<String>, DomError>;

    fn set_data_attribute(&self, node: NodeId, key: &str, value: &str) -> Result<(), DomError>;

    fn remove_data_attribute(&self, node: NodeId, key: &str) -> Result<(), DomError>;

    // ---- Observe / listen ----

    /// Report node insertions and removals anywhere under `root`.
    fn observe_mutations(&self, root: NodeId, callback: MutationCallback);

    /// Document-wide scroll and resize notifications.
    fn listen_viewport(&self, callback: ViewportCallback);

    fn listen_click(&self, node: NodeId, callback: ClickCallback) -> Result<(), DomError>;

    // ---- Measure ----

    fn bounding_rect(&self, node: NodeId) -> Result<Rect, DomError>;

    // ---- Create / mutate ----

    fn create_element(&self, tag: &str) -> NodeId;

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError>;

    fn set_style(&self, node: NodeId, property: &str, value: &str) -> Result<(), DomError>;

    fn set_text_content(&self, node: NodeId, text: &str) -> Result<(), DomError>;

    fn set_disabled(&self, node: NodeId, disabled: bool) -> Result<(), DomError>;

    /// Insert `node` into `parent` before `reference`, moving it if already placed.
    fn insert_before(&self, parent: NodeId, node: NodeId, reference: NodeId)
    -> Result<(), DomError>;

    fn append_child(&self, parent: NodeId, node: NodeId) -> Result<(), DomError>;

    /// Take `node` out of its parent. A node without a parent is left alone.
    fn remove(&self, node: NodeId) -> Result<(), DomError>;

    fn inject_stylesheet(&self, css: &str);

    // ---- Text access ----

    fn read_text(&self, node: NodeId, accessor: TextAccessor) -> Result<String, DomError>;

    fn write_text(&self, node: NodeId, accessor: TextAccessor, text: &str)
    -> Result<(), DomError>;

    // ---- Notify ----

    fn dispatch(&self, node: NodeId, notification: Notification) -> Result<(), DomError>;

    /// Blocking user-visible notice.
    fn alert(&self, message: &str);
}
