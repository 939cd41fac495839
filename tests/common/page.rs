use std::rc::Rc;

use prompt_enhancer::control::controller::AttachmentController;
use prompt_enhancer::dom::dom_model::{ComputedStyle, Display, ElementInfo, NodeId, Position, Rect};
use prompt_enhancer::dom::memory::MemoryDocument;
use prompt_enhancer::gateway::channel::{EnhancementPort, QueuedPort};
use prompt_enhancer::gateway::gateway::Gateway;
use prompt_enhancer::trace::logger::TraceLogger;

pub fn textarea(doc: &MemoryDocument, parent: NodeId, value: &str) -> NodeId {
    let node = doc.add_element(parent, ElementInfo::new("textarea")).unwrap();
    doc.set_value(node, value).unwrap();
    doc.set_rect(node, Rect::new(10.0, 100.0, 300.0, 80.0)).unwrap();
    node
}

pub fn text_input(doc: &MemoryDocument, parent: NodeId, value: &str) -> NodeId {
    let info = ElementInfo::new("input").with_attribute("type", "text");
    let node = doc.add_element(parent, info).unwrap();
    doc.set_value(node, value).unwrap();
    node
}

pub fn editable(doc: &MemoryDocument, parent: NodeId, mode: &str, text: &str) -> NodeId {
    let info = ElementInfo::new("div").with_attribute("contenteditable", mode);
    let node = doc.add_element(parent, info).unwrap();
    doc.set_text(node, text).unwrap();
    node
}

pub fn container(doc: &MemoryDocument, parent: NodeId, display: Display) -> NodeId {
    let node = doc.add_element(parent, ElementInfo::new("div")).unwrap();
    doc.set_computed_style(
        node,
        ComputedStyle {
            display,
            position: Position::Static,
        },
    )
    .unwrap();
    node
}

pub fn install_with_port(doc: &Rc<MemoryDocument>, port: Rc<dyn EnhancementPort>) -> Rc<AttachmentController> {
    AttachmentController::install(doc.clone(), port, TraceLogger::disabled())
}

pub fn install_queued(
    doc: &Rc<MemoryDocument>,
    gateway: Box<dyn Gateway>,
) -> (Rc<AttachmentController>, Rc<QueuedPort>) {
    let port = Rc::new(QueuedPort::new(gateway));
    let controller = install_with_port(doc, port.clone());
    (controller, port)
}
