use std::cell::RefCell;
use std::rc::Rc;

use prompt_enhancer::{
    dom::{
        dom_model::{ElementInfo, MutationRecord, TextAccessor},
        environment::Environment,
        memory::MemoryDocument,
    },
    scanner::{
        eligibility::{ATTACHED_MARKER, EligibleElement, classify},
        scanner::Scanner,
    },
};

use crate::common::page::{editable, text_input, textarea};

mod common;

fn scanner_for(doc: &Rc<MemoryDocument>) -> Scanner {
    Scanner::new(doc.clone())
}

// =========================================================================
// Eligibility
// =========================================================================

#[test]
fn classify_resolves_accessor_per_kind() {
    assert_eq!(classify(&ElementInfo::new("textarea")), Some(TextAccessor::Value));
    assert_eq!(
        classify(&ElementInfo::new("input").with_attribute("type", "text")),
        Some(TextAccessor::Value)
    );
    assert_eq!(
        classify(&ElementInfo::new("div").with_attribute("contenteditable", "true")),
        Some(TextAccessor::Content)
    );
    assert_eq!(
        classify(&ElementInfo::new("div").with_attribute("contenteditable", "")),
        Some(TextAccessor::Content)
    );
    assert_eq!(
        classify(&ElementInfo::new("div").with_attribute("contenteditable", "plaintext-only")),
        Some(TextAccessor::PlainText)
    );
}

#[test]
fn classify_accepts_uppercase_type_value() {
    assert_eq!(
        classify(&ElementInfo::new("input").with_attribute("type", "TEXT")),
        Some(TextAccessor::Value)
    );
    assert_eq!(
        classify(&ElementInfo::new("INPUT").with_attribute("type", "Text")),
        Some(TextAccessor::Value)
    );
}

#[test]
fn classify_rejects_non_text_fields() {
    assert_eq!(classify(&ElementInfo::new("input")), None, "input without type attribute");
    assert_eq!(
        classify(&ElementInfo::new("input").with_attribute("type", "password")),
        None
    );
    assert_eq!(
        classify(&ElementInfo::new("div").with_attribute("contenteditable", "false")),
        None
    );
    assert_eq!(classify(&ElementInfo::new("button")), None);
}

// =========================================================================
// scan
// =========================================================================

#[test]
fn scan_finds_every_eligible_descendant_once() {
    let doc = Rc::new(MemoryDocument::new());
    let body = doc.body();
    let a = textarea(&doc, body, "one");
    let b = text_input(&doc, body, "two");
    let c = editable(&doc, body, "plaintext-only", "three");
    doc.add_element(body, ElementInfo::new("p")).unwrap();

    let scanner = scanner_for(&doc);
    let found = scanner.scan(doc.document_root());

    assert_eq!(
        found,
        vec![
            EligibleElement { node: a, accessor: TextAccessor::Value },
            EligibleElement { node: b, accessor: TextAccessor::Value },
            EligibleElement { node: c, accessor: TextAccessor::PlainText },
        ]
    );
    assert!(scanner.scan(doc.document_root()).is_empty(), "second scan claims nothing");
}

#[test]
fn scan_finds_input_with_uppercase_type() {
    let doc = Rc::new(MemoryDocument::new());
    let node = doc
        .add_element(doc.body(), ElementInfo::new("input").with_attribute("type", "TEXT"))
        .unwrap();

    let found = scanner_for(&doc).scan(doc.document_root());

    assert_eq!(found, vec![EligibleElement { node, accessor: TextAccessor::Value }]);
}

#[test]
fn scan_marks_claimed_nodes() {
    let doc = Rc::new(MemoryDocument::new());
    let node = textarea(&doc, doc.body(), "");

    scanner_for(&doc).scan(doc.document_root());

    assert_eq!(doc.attribute_of(node, "data-racco-attached").as_deref(), Some("1"));
    assert_eq!(
        doc.data_attribute(node, ATTACHED_MARKER).unwrap().as_deref(),
        Some("1")
    );
}

#[test]
fn scan_skips_nodes_marked_by_someone_else() {
    let doc = Rc::new(MemoryDocument::new());
    let node = textarea(&doc, doc.body(), "");
    doc.set_data_attribute(node, ATTACHED_MARKER, "1").unwrap();

    assert!(scanner_for(&doc).scan(doc.document_root()).is_empty());
}

#[test]
fn scan_of_detached_root_is_silent() {
    let doc = Rc::new(MemoryDocument::new());
    let detached = doc.create_detached(ElementInfo::new("form"));
    doc.add_element(detached, ElementInfo::new("textarea")).unwrap();

    assert!(scanner_for(&doc).scan(detached).is_empty());
}

#[test]
fn claim_checks_the_node_itself() {
    let doc = Rc::new(MemoryDocument::new());
    let node = textarea(&doc, doc.body(), "");
    let para = doc.add_element(doc.body(), ElementInfo::new("p")).unwrap();
    let scanner = scanner_for(&doc);

    assert!(scanner.claim(para).is_none());
    assert!(scanner.claim(node).is_some());
    assert!(scanner.claim(node).is_none(), "second claim is refused");
}

// =========================================================================
// observe
// =========================================================================

fn observed(doc: &Rc<MemoryDocument>) -> Rc<RefCell<Vec<Vec<EligibleElement>>>> {
    let batches = Rc::new(RefCell::new(Vec::new()));
    let sink = batches.clone();
    scanner_for(doc).observe(
        doc.document_root(),
        Rc::new(move |found: Vec<EligibleElement>| sink.borrow_mut().push(found)),
    );
    batches
}

#[test]
fn observe_reports_directly_inserted_element() {
    let doc = Rc::new(MemoryDocument::new());
    let batches = observed(&doc);

    let node = textarea(&doc, doc.body(), "late");
    doc.flush_mutations();

    let batches = batches.borrow();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0], vec![EligibleElement { node, accessor: TextAccessor::Value }]);
}

#[test]
fn observe_reports_descendants_of_inserted_subtree() {
    let doc = Rc::new(MemoryDocument::new());
    let batches = observed(&doc);

    let form = doc.create_detached(ElementInfo::new("form"));
    let first = doc.add_element(form, ElementInfo::new("textarea")).unwrap();
    let row = doc.add_element(form, ElementInfo::new("div")).unwrap();
    let second = doc
        .add_element(row, ElementInfo::new("input").with_attribute("type", "text"))
        .unwrap();
    doc.append_child(doc.body(), form).unwrap();

    assert_eq!(doc.flush_mutations(), 1, "whole subtree arrives in one record");
    let nodes: Vec<_> = batches.borrow()[0].iter().map(|e| e.node).collect();
    assert_eq!(nodes, vec![first, second]);
}

#[test]
fn observe_ignores_insertions_of_claimed_or_ineligible_nodes() {
    let doc = Rc::new(MemoryDocument::new());
    let node = textarea(&doc, doc.body(), "");
    scanner_for(&doc).scan(doc.document_root());
    let batches = observed(&doc);

    // Moving an already claimed element reports it again as added.
    let holder = doc.add_element(doc.body(), ElementInfo::new("div")).unwrap();
    doc.append_child(holder, node).unwrap();
    doc.add_element(doc.body(), ElementInfo::new("span")).unwrap();
    doc.flush_mutations();

    assert!(batches.borrow().is_empty());
}

#[test]
fn removals_are_reported_to_observers_above_the_parent() {
    let doc = Rc::new(MemoryDocument::new());
    let section = doc.add_element(doc.body(), ElementInfo::new("section")).unwrap();
    let node = textarea(&doc, section, "");
    let removed = Rc::new(RefCell::new(Vec::new()));
    let sink = removed.clone();
    doc.observe_mutations(
        doc.document_root(),
        Rc::new(move |records: &[MutationRecord]| {
            sink.borrow_mut()
                .extend(records.iter().flat_map(|r| r.removed_nodes.iter().copied()));
        }),
    );

    doc.remove(node).unwrap();
    doc.remove(node).unwrap();
    doc.flush_mutations();

    assert_eq!(*removed.borrow(), vec![node], "second removal of a parentless node is silent");
    assert!(!doc.is_connected(node));
}

#[test]
fn element_reported_twice_in_one_batch_is_claimed_once() {
    let doc = Rc::new(MemoryDocument::new());
    let batches = observed(&doc);

    let section = doc.add_element(doc.body(), ElementInfo::new("section")).unwrap();
    let node = textarea(&doc, section, "");
    doc.flush_mutations();

    let batches = batches.borrow();
    let all: Vec<_> = batches.iter().flatten().map(|e| e.node).collect();
    assert_eq!(all, vec![node]);
}
