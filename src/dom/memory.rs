use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use crate::dom::dom_model::{
    ComputedStyle, ElementInfo, MutationRecord, NodeId, Notification, Rect, TextAccessor,
    ViewportEvent,
};
use crate::dom::environment::{ClickCallback, Environment, MutationCallback, ViewportCallback};
use crate::dom::selector::{ElementFragment, parse_selector};
use crate::error::DomError;

/// Upper bound on observation cycles run by `settle()`.
const MAX_SETTLE_CYCLES: usize = 32;

#[derive(Debug, Default)]
struct NodeData {
    info: ElementInfo,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    inline_style: BTreeMap<String, String>,
    computed: ComputedStyle,
    rect: Rect,
    value: String,
    text: String,
    disabled: bool,
}

struct Observer {
    root: NodeId,
    callback: MutationCallback,
    pending: Vec<MutationRecord>,
}

#[derive(Default)]
struct DocState {
    nodes: Vec<NodeData>,
    observers: Vec<Observer>,
    viewport_listeners: Vec<ViewportCallback>,
    click_listeners: HashMap<NodeId, Vec<ClickCallback>>,
    notifications: Vec<(NodeId, Notification)>,
    alerts: Vec<String>,
    stylesheets: Vec<String>,
}

impl DocState {
    fn node(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.nodes
            .get(id.0 as usize)
            .ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        self.nodes
            .get_mut(id.0 as usize)
            .ok_or(DomError::UnknownNode(id))
    }

    fn create(&mut self, info: ElementInfo) -> NodeId {
        let id = NodeId(self.nodes.len() as u64);
        self.nodes.push(NodeData {
            info,
            ..NodeData::default()
        });
        id
    }

    /// True when `node` is `ancestor` or sits below it.
    fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id.0 as usize).and_then(|n| n.parent);
        }
        false
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.is_within(node, MemoryDocument::ROOT)
    }

    fn connected(&self, node: NodeId) -> Result<&NodeData, DomError> {
        let data = self.node(node)?;
        if self.is_connected(node) {
            Ok(data)
        } else {
            Err(DomError::Detached(node))
        }
    }

    fn detach(&mut self, node: NodeId) -> Result<(), DomError> {
        if let Some(parent) = self.node(node)?.parent {
            self.node_mut(parent)?.children.retain(|c| *c != node);
            self.node_mut(node)?.parent = None;
        }
        Ok(())
    }

    fn insert_at(
        &mut self,
        parent: NodeId,
        node: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.node(parent)?;
        self.node(node)?;
        if self.is_within(parent, node) {
            return Err(DomError::InvalidOperation(format!(
                "cannot insert {:?} into its own subtree",
                node
            )));
        }

        self.detach(node)?;
        let children = &mut self.node_mut(parent)?.children;
        let index = match before {
            Some(reference) => children
                .iter()
                .position(|c| *c == reference)
                .ok_or_else(|| {
                    DomError::InvalidOperation(format!(
                        "{:?} is not a child of {:?}",
                        reference, parent
                    ))
                })?,
            None => children.len(),
        };
        children.insert(index, node);
        self.node_mut(node)?.parent = Some(parent);

        self.queue_record(
            parent,
            MutationRecord {
                added_nodes: vec![node],
                ..MutationRecord::default()
            },
        );
        Ok(())
    }

    /// Take `node` out of its parent and tell observers of that parent.
    fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        let Some(parent) = self.node(node)?.parent else {
            return Ok(());
        };
        self.detach(node)?;
        self.queue_record(
            parent,
            MutationRecord {
                removed_nodes: vec![node],
                ..MutationRecord::default()
            },
        );
        Ok(())
    }

    /// Queue `record` for every observer whose root is `parent` or above it.
    fn queue_record(&mut self, parent: NodeId, record: MutationRecord) {
        let mut ancestors = Vec::new();
        let mut current = Some(parent);
        while let Some(id) = current {
            ancestors.push(id);
            current = self.nodes.get(id.0 as usize).and_then(|n| n.parent);
        }
        for observer in &mut self.observers {
            if ancestors.contains(&observer.root) {
                observer.pending.push(record.clone());
            }
        }
    }

    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self
            .nodes
            .get(root.0 as usize)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(n) = self.nodes.get(id.0 as usize) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }
}

/// In-memory document implementing `Environment`.
///
/// Stands in for a rendering engine: layout values (computed style and
/// bounding rects) are whatever the caller sets, mutation records queue until
/// `flush_mutations()` and events fire only when the caller triggers them.
pub struct MemoryDocument {
    state: RefCell<DocState>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    pub const ROOT: NodeId = NodeId(0);
    pub const BODY: NodeId = NodeId(1);

    pub fn new() -> Self {
        let mut state = DocState::default();
        let root = state.create(ElementInfo::new("html"));
        let body = state.create(ElementInfo::new("body"));
        state.nodes[body.0 as usize].parent = Some(root);
        state.nodes[root.0 as usize].children.push(body);
        Self {
            state: RefCell::new(state),
        }
    }

    // ---- Page construction ----

    /// Create an element and append it under `parent`.
    pub fn add_element(&self, parent: NodeId, info: ElementInfo) -> Result<NodeId, DomError> {
        let mut state = self.state.borrow_mut();
        let id = state.create(info);
        state.insert_at(parent, id, None)?;
        Ok(id)
    }

    /// Create an element without placing it, for building subtrees off-document.
    pub fn create_detached(&self, info: ElementInfo) -> NodeId {
        self.state.borrow_mut().create(info)
    }

    pub fn set_computed_style(&self, node: NodeId, style: ComputedStyle) -> Result<(), DomError> {
        self.state.borrow_mut().node_mut(node)?.computed = style;
        Ok(())
    }

    pub fn set_rect(&self, node: NodeId, rect: Rect) -> Result<(), DomError> {
        self.state.borrow_mut().node_mut(node)?.rect = rect;
        Ok(())
    }

    pub fn set_value(&self, node: NodeId, value: &str) -> Result<(), DomError> {
        self.state.borrow_mut().node_mut(node)?.value = value.to_string();
        Ok(())
    }

    pub fn set_text(&self, node: NodeId, text: &str) -> Result<(), DomError> {
        self.state.borrow_mut().node_mut(node)?.text = text.to_string();
        Ok(())
    }

    // ---- Event loop ----

    /// Deliver queued mutation records: one observation cycle.
    /// Returns how many records were delivered.
    pub fn flush_mutations(&self) -> usize {
        let batches: Vec<(MutationCallback, Vec<MutationRecord>)> = {
            let mut state = self.state.borrow_mut();
            state
                .observers
                .iter_mut()
                .filter(|o| !o.pending.is_empty())
                .map(|o| (o.callback.clone(), std::mem::take(&mut o.pending)))
                .collect()
        };

        let mut delivered = 0;
        for (callback, records) in batches {
            delivered += records.len();
            callback(&records);
        }
        delivered
    }

    /// Run observation cycles until no records remain.
    pub fn settle(&self) -> usize {
        let mut total = 0;
        for _ in 0..MAX_SETTLE_CYCLES {
            let delivered = self.flush_mutations();
            if delivered == 0 {
                break;
            }
            total += delivered;
        }
        total
    }

    /// Shift every node's rect up by `dy` and notify viewport listeners.
    pub fn scroll_by(&self, dy: f64) {
        {
            let mut state = self.state.borrow_mut();
            for node in &mut state.nodes {
                node.rect = node.rect.translate(0.0, -dy);
            }
        }
        self.fire_viewport(ViewportEvent::Scroll);
    }

    pub fn fire_viewport(&self, event: ViewportEvent) {
        let listeners = self.state.borrow().viewport_listeners.clone();
        for listener in listeners {
            listener(event);
        }
    }

    /// User click: ignored on disabled elements, like a browser does.
    pub fn click(&self, node: NodeId) -> bool {
        let listeners = {
            let state = self.state.borrow();
            match state.node(node) {
                Ok(data) if !data.disabled => {
                    state.click_listeners.get(&node).cloned().unwrap_or_default()
                }
                _ => return false,
            }
        };
        for listener in &listeners {
            listener();
        }
        !listeners.is_empty()
    }

    // ---- Inspection ----

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.state
            .borrow()
            .node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn value_of(&self, node: NodeId) -> Option<String> {
        self.state.borrow().node(node).ok().map(|n| n.value.clone())
    }

    pub fn text_of(&self, node: NodeId) -> Option<String> {
        self.state.borrow().node(node).ok().map(|n| n.text.clone())
    }

    pub fn style_of(&self, node: NodeId, property: &str) -> Option<String> {
        self.state
            .borrow()
            .node(node)
            .ok()
            .and_then(|n| n.inline_style.get(property).cloned())
    }

    pub fn attribute_of(&self, node: NodeId, name: &str) -> Option<String> {
        self.state
            .borrow()
            .node(node)
            .ok()
            .and_then(|n| n.info.attribute(name).map(str::to_string))
    }

    pub fn is_disabled(&self, node: NodeId) -> bool {
        self.state
            .borrow()
            .node(node)
            .map(|n| n.disabled)
            .unwrap_or(false)
    }

    /// Nodes carrying `class` among their space-separated classes.
    pub fn find_by_class(&self, class: &str) -> Vec<NodeId> {
        let state = self.state.borrow();
        state
            .descendants(Self::ROOT)
            .into_iter()
            .filter(|id| {
                state.nodes[id.0 as usize]
                    .info
                    .attribute("class")
                    .is_some_and(|c| c.split_whitespace().any(|c| c == class))
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<(NodeId, Notification)> {
        self.state.borrow().notifications.clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.state.borrow().alerts.clone()
    }

    pub fn stylesheets(&self) -> Vec<String> {
        self.state.borrow().stylesheets.clone()
    }

    pub fn viewport_listener_count(&self) -> usize {
        self.state.borrow().viewport_listeners.len()
    }
}

impl Environment for MemoryDocument {
    fn document_root(&self) -> NodeId {
        Self::ROOT
    }

    fn body(&self) -> NodeId {
        Self::BODY
    }

    fn element(&self, node: NodeId) -> Result<ElementInfo, DomError> {
        Ok(self.state.borrow().node(node)?.info.clone())
    }

    fn query(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let selector = parse_selector(selector)?;
        let state = self.state.borrow();
        state.connected(root)?;
        Ok(state
            .descendants(root)
            .into_iter()
            .filter(|id| ElementFragment::new(&state.nodes[id.0 as usize].info).matches(&selector))
            .collect())
    }

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DomError> {
        Ok(self.state.borrow().node(node)?.parent)
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.state.borrow().is_connected(node)
    }

    fn computed_style(&self, node: NodeId) -> Result<ComputedStyle, DomError> {
        Ok(self.state.borrow().connected(node)?.computed)
    }

    fn inline_style(&self, node: NodeId, property: &str) -> Result<Option<String>, DomError> {
        Ok(self
            .state
            .borrow()
            .node(node)?
            .inline_style
            .get(property)
            .cloned())
    }

    fn data_attribute(&self, node: NodeId, key: &str) -> Result<Option<String>, DomError> {
        Ok(self
            .state
            .borrow()
            .node(node)?
            .info
            .attribute(&format!("data-{}", key))
            .map(str::to_string))
    }

    fn set_data_attribute(&self, node: NodeId, key: &str, value: &str) -> Result<(), DomError> {
        self.set_attribute(node, &format!("data-{}", key), value)
    }

    fn remove_data_attribute(&self, node: NodeId, key: &str) -> Result<(), DomError> {
        self.state
            .borrow_mut()
            .node_mut(node)?
            .info
            .attributes
            .remove(&format!("data-{}", key));
        Ok(())
    }

    fn observe_mutations(&self, root: NodeId, callback: MutationCallback) {
        self.state.borrow_mut().observers.push(Observer {
            root,
            callback,
            pending: Vec::new(),
        });
    }

    fn listen_viewport(&self, callback: ViewportCallback) {
        self.state.borrow_mut().viewport_listeners.push(callback);
    }

    fn listen_click(&self, node: NodeId, callback: ClickCallback) -> Result<(), DomError> {
        let mut state = self.state.borrow_mut();
        state.node(node)?;
        state.click_listeners.entry(node).or_default().push(callback);
        Ok(())
    }

    fn bounding_rect(&self, node: NodeId) -> Result<Rect, DomError> {
        Ok(self.state.borrow().connected(node)?.rect)
    }

    fn create_element(&self, tag: &str) -> NodeId {
        self.state.borrow_mut().create(ElementInfo::new(tag))
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.state
            .borrow_mut()
            .node_mut(node)?
            .info
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn set_style(&self, node: NodeId, property: &str, value: &str) -> Result<(), DomError> {
        self.state
            .borrow_mut()
            .node_mut(node)?
            .inline_style
            .insert(property.to_string(), value.to_string());
        Ok(())
    }

    fn set_text_content(&self, node: NodeId, text: &str) -> Result<(), DomError> {
        self.set_text(node, text)
    }

    fn set_disabled(&self, node: NodeId, disabled: bool) -> Result<(), DomError> {
        self.state.borrow_mut().node_mut(node)?.disabled = disabled;
        Ok(())
    }

    fn insert_before(&self, parent: NodeId, node: NodeId, reference: NodeId) -> Result<(), DomError> {
        if node == reference {
            return Err(DomError::InvalidOperation(format!(
                "cannot insert {:?} before itself",
                node
            )));
        }
        self.state
            .borrow_mut()
            .insert_at(parent, node, Some(reference))
    }

    fn append_child(&self, parent: NodeId, node: NodeId) -> Result<(), DomError> {
        self.state.borrow_mut().insert_at(parent, node, None)
    }

    fn remove(&self, node: NodeId) -> Result<(), DomError> {
        self.state.borrow_mut().remove(node)
    }

    fn inject_stylesheet(&self, css: &str) {
        self.state.borrow_mut().stylesheets.push(css.to_string());
    }

    fn read_text(&self, node: NodeId, accessor: TextAccessor) -> Result<String, DomError> {
        let state = self.state.borrow();
        let data = state.connected(node)?;
        Ok(match accessor {
            TextAccessor::Value => data.value.clone(),
            TextAccessor::Content | TextAccessor::PlainText => data.text.clone(),
        })
    }

    fn write_text(&self, node: NodeId, accessor: TextAccessor, text: &str) -> Result<(), DomError> {
        let mut state = self.state.borrow_mut();
        state.connected(node)?;
        let data = state.node_mut(node)?;
        match accessor {
            TextAccessor::Value => data.value = text.to_string(),
            TextAccessor::Content | TextAccessor::PlainText => data.text = text.to_string(),
        }
        Ok(())
    }

    fn dispatch(&self, node: NodeId, notification: Notification) -> Result<(), DomError> {
        let mut state = self.state.borrow_mut();
        state.connected(node)?;
        state.notifications.push((node, notification));
        Ok(())
    }

    fn alert(&self, message: &str) {
        self.state.borrow_mut().alerts.push(message.to_string());
    }
}
