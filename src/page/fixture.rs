use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::dom::dom_model::{ComputedStyle, ElementInfo, NodeId, Rect};
use crate::dom::environment::Environment;
use crate::dom::memory::MemoryDocument;
use crate::error::{DomError, FixtureError};

/// A page description: the initial tree plus subtrees the page inserts later.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageFixture {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub nodes: Vec<NodeSpec>,

    /// Appended to the body after controls are installed, as a page script would
    #[serde(default)]
    pub inserted: Vec<NodeSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeSpec {
    pub tag: String,

    /// Fixture-local name used to look the node up afterwards
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    #[serde(default)]
    pub style: ComputedStyle,

    #[serde(default)]
    pub inline_style: BTreeMap<String, String>,

    #[serde(default)]
    pub rect: Option<Rect>,

    #[serde(default)]
    pub value: Option<String>,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

/// Fixture ids resolved to document nodes.
#[derive(Debug, Default, Clone)]
pub struct PageHandles {
    ids: HashMap<String, NodeId>,
}

impl PageHandles {
    pub fn get(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    /// Fixture id of `node`, if it had one.
    pub fn name_of(&self, node: NodeId) -> Option<&str> {
        self.ids
            .iter()
            .find(|(_, n)| **n == node)
            .map(|(name, _)| name.as_str())
    }
}

impl PageFixture {
    pub fn from_yaml(source: &str, path: &str) -> Result<Self, FixtureError> {
        serde_yaml::from_str(source).map_err(|e| FixtureError::Parse {
            path: path.to_string(),
            source: e,
        })
    }

    pub fn load(path: &str) -> Result<Self, FixtureError> {
        let source = std::fs::read_to_string(path).map_err(|e| FixtureError::Read {
            path: path.to_string(),
            source: e,
        })?;
        Self::from_yaml(&source, path)
    }

    /// Build `nodes` under the body.
    pub fn build(&self, doc: &MemoryDocument, handles: &mut PageHandles) -> Result<(), FixtureError> {
        for spec in &self.nodes {
            build_node(doc, doc.body(), spec, handles)?;
        }
        Ok(())
    }

    /// Insert each `inserted` subtree under the body in one step, so the
    /// whole subtree arrives in a single mutation record.
    pub fn insert_later(&self, doc: &MemoryDocument, handles: &mut PageHandles) -> Result<(), FixtureError> {
        for spec in &self.inserted {
            let root = build_detached(doc, spec, handles)?;
            doc.append_child(doc.body(), root)?;
        }
        Ok(())
    }
}

fn configure(doc: &MemoryDocument, node: NodeId, spec: &NodeSpec, handles: &mut PageHandles) -> Result<(), DomError> {
    doc.set_computed_style(node, spec.style)?;
    if let Some(rect) = spec.rect {
        doc.set_rect(node, rect)?;
    }
    if let Some(value) = &spec.value {
        doc.set_value(node, value)?;
    }
    if let Some(text) = &spec.text {
        doc.set_text(node, text)?;
    }
    for (property, value) in &spec.inline_style {
        doc.set_style(node, property, value)?;
    }
    if let Some(id) = &spec.id {
        handles.ids.insert(id.clone(), node);
    }
    Ok(())
}

fn element_info(spec: &NodeSpec) -> ElementInfo {
    let mut info = ElementInfo::new(&spec.tag);
    info.attributes = spec.attributes.clone();
    info
}

fn build_node(
    doc: &MemoryDocument,
    parent: NodeId,
    spec: &NodeSpec,
    handles: &mut PageHandles,
) -> Result<NodeId, FixtureError> {
    let node = doc.add_element(parent, element_info(spec))?;
    configure(doc, node, spec, handles)?;
    for child in &spec.children {
        build_node(doc, node, child, handles)?;
    }
    Ok(node)
}

fn build_detached(doc: &MemoryDocument, spec: &NodeSpec, handles: &mut PageHandles) -> Result<NodeId, FixtureError> {
    let node = doc.create_detached(element_info(spec));
    configure(doc, node, spec, handles)?;
    for child in &spec.children {
        let child_node = build_detached(doc, child, handles)?;
        doc.append_child(node, child_node)?;
    }
    Ok(node)
}
