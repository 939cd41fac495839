use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::control::control_model::{Control, LayoutMode};
use crate::dom::dom_model::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    Attached,
    Skipped,
    Clicked,
    Completed,
    Failed,
    Detached,
}

/// One line of the JSONL lifecycle trace.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub kind: TraceKind,
    pub node: u64,

    pub accessor: Option<String>,
    pub layout: Option<LayoutMode>,

    pub text_len: Option<usize>,
    pub detail: Option<String>,
}

impl TraceEvent {
    pub fn now(kind: TraceKind, node: NodeId) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            kind,
            node: node.0,
            accessor: None,
            layout: None,
            text_len: None,
            detail: None,
        }
    }

    pub fn for_control(kind: TraceKind, control: &Control) -> Self {
        let mut event = Self::now(kind, control.node());
        event.accessor = Some(format!("{:?}", control.accessor()));
        event.layout = Some(control.mode);
        event
    }

    pub fn with_text_len(mut self, len: usize) -> Self {
        self.text_len = Some(len);
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}
