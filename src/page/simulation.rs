use std::rc::Rc;

use serde::Serialize;

use crate::control::control_model::{ControlState, LayoutMode};
use crate::control::controller::AttachmentController;
use crate::dom::dom_model::TextAccessor;
use crate::dom::environment::Environment;
use crate::dom::memory::MemoryDocument;
use crate::error::FixtureError;
use crate::gateway::channel::QueuedPort;
use crate::gateway::gateway::Gateway;
use crate::page::fixture::{PageFixture, PageHandles};
use crate::trace::logger::TraceLogger;

#[derive(Debug, Clone, Copy)]
pub struct SimulationOptions {
    /// Pixels to scroll after attaching; 0 skips scrolling
    pub scroll: f64,
    pub click: bool,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            scroll: 0.0,
            click: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ControlReport {
    pub name: Option<String>,
    pub node: u64,
    pub accessor: TextAccessor,
    pub mode: LayoutMode,
    pub state: ControlState,
    pub before: String,
    pub after: String,
    /// Overlay position as (left, top) style values
    pub overlay: Option<(String, String)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub title: String,
    pub initial_controls: usize,
    pub inserted_controls: usize,
    pub controls: Vec<ControlReport>,
    pub alerts: Vec<String>,
}

/// Run a page fixture through the full attach → click → write-back cycle.
pub fn simulate(
    fixture: &PageFixture,
    gateway: Box<dyn Gateway>,
    options: SimulationOptions,
    tracer: TraceLogger,
) -> Result<SimulationReport, FixtureError> {
    let doc = Rc::new(MemoryDocument::new());
    let mut handles = PageHandles::default();
    fixture.build(&doc, &mut handles)?;

    let port = Rc::new(QueuedPort::new(gateway));
    let controller = AttachmentController::install(doc.clone(), port.clone(), tracer);
    let initial_controls = controller.controls().len();

    fixture.insert_later(&doc, &mut handles)?;
    doc.settle();
    let inserted_controls = controller.controls().len() - initial_controls;

    if options.scroll != 0.0 {
        doc.scroll_by(options.scroll);
    }

    let controls = controller.controls();
    let before: Vec<String> = controls
        .iter()
        .map(|c| doc.read_text(c.node(), c.accessor()).unwrap_or_default())
        .collect();

    if options.click {
        for control in &controls {
            doc.click(control.button);
        }
        port.pump();
    }

    let reports = controls
        .iter()
        .zip(before)
        .map(|(control, before)| ControlReport {
            name: handles.name_of(control.node()).map(str::to_string),
            node: control.node().0,
            accessor: control.accessor(),
            mode: control.mode,
            state: control.state(),
            before,
            after: doc
                .read_text(control.node(), control.accessor())
                .unwrap_or_default(),
            overlay: match control.mode {
                LayoutMode::Overlay => Some((
                    doc.style_of(control.button, "left").unwrap_or_default(),
                    doc.style_of(control.button, "top").unwrap_or_default(),
                )),
                LayoutMode::Inline => None,
            },
        })
        .collect();

    Ok(SimulationReport {
        title: fixture.title.clone(),
        initial_controls,
        inserted_controls,
        controls: reports,
        alerts: doc.alerts(),
    })
}
