use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, info, warn};

use crate::control::control_model::{BUSY_LABEL, Control, ControlState, IDLE_LABEL, LayoutMode};
use crate::control::layout::{
    STYLESHEET, create_button, decide_layout, mount_inline, mount_overlay, reposition,
};
use crate::dom::dom_model::{MutationRecord, NodeId, Notification, ViewportEvent};
use crate::dom::environment::Environment;
use crate::error::{ChannelError, DomError, EmptyResult, EnhanceError, LayoutSkip};
use crate::gateway::channel::EnhancementPort;
use crate::gateway::message::{BackgroundMessage, EnhanceReply};
use crate::scanner::eligibility::{ATTACHED_MARKER, EligibleElement};
use crate::scanner::scanner::Scanner;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{TraceEvent, TraceKind};

/// Classify what came back over the channel.
pub fn interpret_reply(
    result: Result<Option<EnhanceReply>, ChannelError>,
) -> Result<String, EnhanceError> {
    let reply = result
        .map_err(EnhanceError::Transport)?
        .ok_or(EnhanceError::EmptyResult(EmptyResult::NoResponse))?;

    if !reply.ok {
        return Err(EnhanceError::Gateway(
            reply.error.unwrap_or_else(|| "unknown".to_string()),
        ));
    }

    reply
        .enhanced
        .filter(|text| !text.trim().is_empty())
        .ok_or(EnhanceError::EmptyResult(EmptyResult::EmptyText))
}

/// Attaches controls to eligible elements and drives their request lifecycle.
///
/// Every failure stops at the control it belongs to: one broken element or
/// request never affects other controls or the observer loop.
pub struct AttachmentController {
    env: Rc<dyn Environment>,
    port: Rc<dyn EnhancementPort>,
    tracer: TraceLogger,
    controls: RefCell<Vec<Rc<Control>>>,
    tracking_viewport: Cell<bool>,
    weak_self: Weak<AttachmentController>,
}

impl AttachmentController {
    pub fn new(
        env: Rc<dyn Environment>,
        port: Rc<dyn EnhancementPort>,
        tracer: TraceLogger,
    ) -> Rc<Self> {
        Rc::new_cyclic(|weak_self| Self {
            env,
            port,
            tracer,
            controls: RefCell::new(Vec::new()),
            tracking_viewport: Cell::new(false),
            weak_self: weak_self.clone(),
        })
    }

    /// Inject the stylesheet, attach to everything already on the page, keep
    /// attaching as the page inserts new elements and drop controls whose
    /// element the page removed.
    pub fn install(
        env: Rc<dyn Environment>,
        port: Rc<dyn EnhancementPort>,
        tracer: TraceLogger,
    ) -> Rc<Self> {
        let controller = Self::new(env.clone(), port, tracer);
        env.inject_stylesheet(STYLESHEET);

        let scanner = Scanner::new(env.clone());
        let root = env.document_root();
        let attached = controller.attach_all(scanner.scan(root));
        info!(attached, "initial scan complete");

        let weak = Rc::downgrade(&controller);
        scanner.observe(
            root,
            Rc::new(move |found: Vec<EligibleElement>| {
                if let Some(controller) = weak.upgrade() {
                    controller.attach_all(found);
                }
            }),
        );

        let weak = Rc::downgrade(&controller);
        env.observe_mutations(
            root,
            Rc::new(move |_records: &[MutationRecord]| {
                if let Some(controller) = weak.upgrade() {
                    controller.prune_detached();
                }
            }),
        );
        controller
    }

    pub fn controls(&self) -> Vec<Rc<Control>> {
        self.controls.borrow().clone()
    }

    pub fn control_for(&self, node: NodeId) -> Option<Rc<Control>> {
        self.controls
            .borrow()
            .iter()
            .find(|c| c.node() == node)
            .cloned()
    }

    fn control_for_button(&self, button: NodeId) -> Option<Rc<Control>> {
        self.controls
            .borrow()
            .iter()
            .find(|c| c.button == button)
            .cloned()
    }

    /// Forget controls whose element left the document, take their button
    /// (or wrapper) out of the page and clear the element's marker so a later
    /// re-insertion attaches again. Returns how many controls were dropped.
    pub fn prune_detached(&self) -> usize {
        let (kept, gone): (Vec<_>, Vec<_>) = self
            .controls
            .take()
            .into_iter()
            .partition(|c| self.env.is_connected(c.node()));
        self.controls.replace(kept);

        for control in &gone {
            let ours = control.wrapper.unwrap_or(control.button);
            if self.env.is_connected(ours) {
                if let Err(e) = self.env.remove(ours) {
                    debug!(node = ?ours, error = %e, "control node not removed");
                }
            }
            if let Err(e) = self.env.remove_data_attribute(control.node(), ATTACHED_MARKER) {
                debug!(node = ?control.node(), error = %e, "marker not cleared");
            }
            self.tracer
                .log(&TraceEvent::for_control(TraceKind::Detached, control));
            debug!(node = ?control.node(), mode = ?control.mode, "control detached");
        }
        gone.len()
    }

    /// Attach to each element; elements that cannot be laid out are skipped.
    /// Returns how many controls were created.
    pub fn attach_all(&self, elements: Vec<EligibleElement>) -> usize {
        elements
            .into_iter()
            .filter(|element| match self.attach(*element) {
                Ok(_) => true,
                Err(skip) => {
                    debug!(node = ?element.node, reason = %skip, "attachment skipped");
                    self.tracer
                        .log(&TraceEvent::now(TraceKind::Skipped, element.node).with_detail(&skip));
                    false
                }
            })
            .count()
    }

    /// Create and place a control for an element the scanner has claimed.
    pub fn attach(&self, element: EligibleElement) -> Result<Rc<Control>, LayoutSkip> {
        if let Some(existing) = self.control_for(element.node) {
            return Ok(existing);
        }

        let env = self.env.as_ref();
        let mode = decide_layout(env, element.node)?;
        let button = create_button(env)?;

        // The button only reaches the page once it has a handler.
        let weak = self.weak_self.clone();
        env.listen_click(
            button,
            Rc::new(move || {
                let Some(controller) = weak.upgrade() else {
                    return;
                };
                if let Some(control) = controller.control_for_button(button) {
                    controller.click(&control);
                }
            }),
        )?;

        let wrapper = match mode {
            LayoutMode::Inline => Some(mount_inline(env, element.node, button)?),
            LayoutMode::Overlay => {
                mount_overlay(env, element.node, button)?;
                None
            }
        };

        let control = Rc::new(Control::new(element, button, mode, wrapper));

        if mode == LayoutMode::Overlay {
            self.track_viewport();
        }

        self.controls.borrow_mut().push(control.clone());
        self.tracer
            .log(&TraceEvent::for_control(TraceKind::Attached, &control));
        info!(node = ?element.node, ?mode, accessor = ?element.accessor, "control attached");
        Ok(control)
    }

    /// One document-wide scroll/resize listener serves every overlay.
    fn track_viewport(&self) {
        if self.tracking_viewport.replace(true) {
            return;
        }
        let weak = self.weak_self.clone();
        self.env.listen_viewport(Rc::new(move |event: ViewportEvent| {
            if let Some(controller) = weak.upgrade() {
                debug!(?event, "viewport changed");
                controller.reposition_overlays();
            }
        }));
    }

    /// Move every overlay to its element's current rectangle, after dropping
    /// controls whose element left the document.
    pub fn reposition_overlays(&self) {
        self.prune_detached();
        for control in self.controls() {
            if control.mode != LayoutMode::Overlay {
                continue;
            }
            if let Err(e) = reposition(self.env.as_ref(), control.node(), control.button) {
                debug!(node = ?control.node(), error = %e, "overlay not repositioned");
            }
        }
    }

    /// Idle → Busy: read the element, lock the control and ask the gateway.
    /// Ignored unless the control is idle and its element is still in the page.
    pub fn click(&self, control: &Rc<Control>) {
        if control.state() != ControlState::Idle {
            debug!(node = ?control.node(), state = ?control.state(), "click ignored, control busy");
            return;
        }
        if !self.env.is_connected(control.node()) {
            debug!(node = ?control.node(), "click ignored, element detached");
            return;
        }

        let text = match self.env.read_text(control.node(), control.accessor()) {
            Ok(text) => text,
            Err(e) => {
                debug!(node = ?control.node(), error = %e, "could not read element text");
                return;
            }
        };

        control.state.set(ControlState::Busy);
        self.set_button(control, true, BUSY_LABEL);
        self.tracer.log(
            &TraceEvent::for_control(TraceKind::Clicked, control).with_text_len(text.chars().count()),
        );
        info!(node = ?control.node(), "enhancement requested");

        let Some(controller) = self.weak_self.upgrade() else {
            return;
        };
        let control = control.clone();
        self.port.send(
            BackgroundMessage::enhance(&text),
            Box::new(move |result: Result<Option<EnhanceReply>, ChannelError>| {
                controller.complete(&control, result)
            }),
        );
    }

    /// Busy → Idle (possibly through Error) once the gateway answers.
    pub fn complete(&self, control: &Control, result: Result<Option<EnhanceReply>, ChannelError>) {
        match interpret_reply(result) {
            Ok(enhanced) => {
                match self.write_back(control, &enhanced) {
                    Ok(()) => info!(node = ?control.node(), "enhancement applied"),
                    Err(e) => debug!(node = ?control.node(), error = %e, "element gone, result dropped"),
                }
                self.tracer.log(
                    &TraceEvent::for_control(TraceKind::Completed, control)
                        .with_text_len(enhanced.chars().count()),
                );
            }
            Err(err) => {
                control.state.set(ControlState::Error);
                warn!(node = ?control.node(), error = %err, "enhancement failed");
                self.env.alert(&err.to_string());
                self.tracer
                    .log(&TraceEvent::for_control(TraceKind::Failed, control).with_detail(&err));
            }
        }

        control.state.set(ControlState::Idle);
        self.set_button(control, false, IDLE_LABEL);
    }

    fn write_back(&self, control: &Control, text: &str) -> Result<(), DomError> {
        let node = control.node();
        self.env.write_text(node, control.accessor(), text)?;
        self.env.dispatch(node, Notification::input())?;
        if control.accessor().is_value_bearing() {
            self.env.dispatch(node, Notification::change())?;
        }
        Ok(())
    }

    fn set_button(&self, control: &Control, disabled: bool, label: &str) {
        let button = control.button;
        let result = self
            .env
            .set_disabled(button, disabled)
            .and_then(|_| self.env.set_text_content(button, label));
        if let Err(e) = result {
            debug!(?button, error = %e, "control button not updated");
        }
    }
}
