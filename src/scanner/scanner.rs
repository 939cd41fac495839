use std::rc::Rc;

use tracing::debug;

use crate::dom::dom_model::{MutationRecord, NodeId};
use crate::dom::environment::Environment;
use crate::scanner::eligibility::{ATTACHED_MARKER, ELIGIBLE_SELECTOR, EligibleElement, classify};

pub type AddedCallback = Rc<dyn Fn(Vec<EligibleElement>)>;

/// Finds eligible elements and claims each exactly once.
///
/// Claiming checks and sets the attachment marker within one call, so a
/// node reported twice (directly and as a descendant of another added node,
/// or in two mutation batches) is only ever handed out once.
#[derive(Clone)]
pub struct Scanner {
    env: Rc<dyn Environment>,
}

impl Scanner {
    pub fn new(env: Rc<dyn Environment>) -> Self {
        Self { env }
    }

    /// Claim every unmarked eligible descendant of `root`.
    /// A root that cannot be queried yields nothing.
    pub fn scan(&self, root: NodeId) -> Vec<EligibleElement> {
        match self.env.query(root, ELIGIBLE_SELECTOR) {
            Ok(nodes) => nodes.into_iter().filter_map(|n| self.claim(n)).collect(),
            Err(e) => {
                debug!(?root, error = %e, "skipping unqueryable scan root");
                Vec::new()
            }
        }
    }

    /// Claim `node` itself if it is eligible and not yet marked.
    pub fn claim(&self, node: NodeId) -> Option<EligibleElement> {
        let info = self.env.element(node).ok()?;
        let accessor = classify(&info)?;

        match self.env.data_attribute(node, ATTACHED_MARKER) {
            Ok(None) => {}
            Ok(Some(_)) | Err(_) => return None,
        }
        self.env.set_data_attribute(node, ATTACHED_MARKER, "1").ok()?;

        Some(EligibleElement { node, accessor })
    }

    /// Newly claimed elements from one batch of insertions: each added node
    /// itself plus all of its eligible descendants.
    pub fn collect_added(&self, records: &[MutationRecord]) -> Vec<EligibleElement> {
        let mut found = Vec::new();
        for node in records.iter().flat_map(|r| r.added_nodes.iter().copied()) {
            if !self.env.is_connected(node) {
                continue;
            }
            found.extend(self.claim(node));
            found.extend(self.scan(node));
        }
        found
    }

    /// Watch `root` for insertions and report newly claimed elements once per batch.
    pub fn observe(&self, root: NodeId, on_added: AddedCallback) {
        let scanner = self.clone();
        self.env.observe_mutations(
            root,
            Rc::new(move |records: &[MutationRecord]| {
                let found = scanner.collect_added(records);
                if !found.is_empty() {
                    debug!(count = found.len(), "eligible elements inserted");
                    on_added(found);
                }
            }),
        );
    }
}
