use std::rc::Rc;

use crate::{
    control::controller::AttachmentController,
    dom::environment::Environment,
    gateway::channel::EnhancementPort,
    trace::logger::TraceLogger,
};

pub mod cli;
pub mod control;
pub mod dom;
pub mod error;
pub mod gateway;
pub mod page;
pub mod scanner;
pub mod trace;

/// Content-script entry point: attach controls to every eligible element on
/// the page now and as it changes, sending requests through `port`.
pub fn run_content_script(
    env: Rc<dyn Environment>,
    port: Rc<dyn EnhancementPort>,
    tracer: TraceLogger,
) -> Rc<AttachmentController> {
    AttachmentController::install(env, port, tracer)
}
