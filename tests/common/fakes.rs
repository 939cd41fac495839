use std::cell::RefCell;
use std::rc::Rc;

use prompt_enhancer::dom::dom_model::{
    ComputedStyle, ElementInfo, NodeId, Notification, Rect, TextAccessor,
};
use prompt_enhancer::dom::environment::{
    ClickCallback, Environment, MutationCallback, ViewportCallback,
};
use prompt_enhancer::dom::memory::MemoryDocument;
use prompt_enhancer::error::{ChannelError, DomError, GatewayError};
use prompt_enhancer::gateway::channel::{EnhancementPort, ReplyCallback};
use prompt_enhancer::gateway::gateway::Gateway;
use prompt_enhancer::gateway::message::{BackgroundMessage, EnhanceReply};

/// Appends " [ENHANCED]" to whatever it is given.
pub struct SuffixGateway;

impl Gateway for SuffixGateway {
    fn name(&self) -> &str {
        "suffix"
    }

    fn enhance(&self, text: &str) -> Result<String, GatewayError> {
        Ok(format!("{} [ENHANCED]", text))
    }
}

/// Always fails with the given reason.
pub struct FailingGateway(pub &'static str);

impl Gateway for FailingGateway {
    fn name(&self) -> &str {
        self.0
    }

    fn enhance(&self, _text: &str) -> Result<String, GatewayError> {
        Err(GatewayError::Request {
            target: "stub".into(),
            reason: self.0.into(),
        })
    }
}

/// Succeeds with blank text.
pub struct BlankGateway;

impl Gateway for BlankGateway {
    fn name(&self) -> &str {
        "blank"
    }

    fn enhance(&self, _text: &str) -> Result<String, GatewayError> {
        Ok("  ".into())
    }
}

/// Answers every message immediately with a fixed outcome and records what was sent.
pub struct StaticPort {
    outcome: Result<Option<EnhanceReply>, ChannelError>,
    pub sent: RefCell<Vec<BackgroundMessage>>,
}

impl StaticPort {
    pub fn new(outcome: Result<Option<EnhanceReply>, ChannelError>) -> Self {
        Self {
            outcome,
            sent: RefCell::new(Vec::new()),
        }
    }
}

impl EnhancementPort for StaticPort {
    fn send(&self, message: BackgroundMessage, reply: ReplyCallback) {
        self.sent.borrow_mut().push(message);
        reply(self.outcome.clone());
    }
}

/// A page whose click listeners cannot be registered; everything else is
/// served by the wrapped document.
pub struct NoClickDocument(pub Rc<MemoryDocument>);

impl Environment for NoClickDocument {
    fn document_root(&self) -> NodeId {
        self.0.document_root()
    }

    fn body(&self) -> NodeId {
        self.0.body()
    }

    fn element(&self, node: NodeId) -> Result<ElementInfo, DomError> {
        self.0.element(node)
    }

    fn query(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>, DomError> {
        self.0.query(root, selector)
    }

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DomError> {
        self.0.parent(node)
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.0.is_connected(node)
    }

    fn computed_style(&self, node: NodeId) -> Result<ComputedStyle, DomError> {
        self.0.computed_style(node)
    }

    fn inline_style(&self, node: NodeId, property: &str) -> Result<Option<String>, DomError> {
        self.0.inline_style(node, property)
    }

    fn data_attribute(&self, node: NodeId, key: &str) -> Result<Option<String>, DomError> {
        self.0.data_attribute(node, key)
    }

    fn set_data_attribute(&self, node: NodeId, key: &str, value: &str) -> Result<(), DomError> {
        self.0.set_data_attribute(node, key, value)
    }

    fn remove_data_attribute(&self, node: NodeId, key: &str) -> Result<(), DomError> {
        self.0.remove_data_attribute(node, key)
    }

    fn observe_mutations(&self, root: NodeId, callback: MutationCallback) {
        self.0.observe_mutations(root, callback)
    }

    fn listen_viewport(&self, callback: ViewportCallback) {
        self.0.listen_viewport(callback)
    }

    fn listen_click(&self, _node: NodeId, _callback: ClickCallback) -> Result<(), DomError> {
        Err(DomError::InvalidOperation("click listeners are blocked".into()))
    }

    fn bounding_rect(&self, node: NodeId) -> Result<Rect, DomError> {
        self.0.bounding_rect(node)
    }

    fn create_element(&self, tag: &str) -> NodeId {
        self.0.create_element(tag)
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.0.set_attribute(node, name, value)
    }

    fn set_style(&self, node: NodeId, property: &str, value: &str) -> Result<(), DomError> {
        self.0.set_style(node, property, value)
    }

    fn set_text_content(&self, node: NodeId, text: &str) -> Result<(), DomError> {
        self.0.set_text_content(node, text)
    }

    fn set_disabled(&self, node: NodeId, disabled: bool) -> Result<(), DomError> {
        self.0.set_disabled(node, disabled)
    }

    fn insert_before(&self, parent: NodeId, node: NodeId, reference: NodeId) -> Result<(), DomError> {
        self.0.insert_before(parent, node, reference)
    }

    fn append_child(&self, parent: NodeId, node: NodeId) -> Result<(), DomError> {
        self.0.append_child(parent, node)
    }

    fn remove(&self, node: NodeId) -> Result<(), DomError> {
        self.0.remove(node)
    }

    fn inject_stylesheet(&self, css: &str) {
        self.0.inject_stylesheet(css)
    }

    fn read_text(&self, node: NodeId, accessor: TextAccessor) -> Result<String, DomError> {
        self.0.read_text(node, accessor)
    }

    fn write_text(&self, node: NodeId, accessor: TextAccessor, text: &str) -> Result<(), DomError> {
        self.0.write_text(node, accessor, text)
    }

    fn dispatch(&self, node: NodeId, notification: Notification) -> Result<(), DomError> {
        self.0.dispatch(node, notification)
    }

    fn alert(&self, message: &str) {
        self.0.alert(message)
    }
}
