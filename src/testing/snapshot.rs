//! Snapshot rendering helpers.
//!
//! Functions for turning a DOM subtree into plain-text strings suitable for
//! snapshot testing and assertions. Whitespace-only text nodes are dropped
//! so that indented test markup compares equal to its compact form.

use crate::dom::html::VOID_ELEMENTS;
use crate::dom::{Dom, NodeId, NodeKind};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Serialize the children of `id` as compact markup.
///
/// Template content is included inside its `<template>` tag.
///
/// # Examples
///
/// ```
/// use weft::dom::{Dom, NodeData};
/// use weft::testing::markup_to_string;
///
/// let mut dom = Dom::new();
/// let root = dom.insert(NodeData::element("div"));
/// dom.set_inner_html(root, "<p>\n  <b>x</b>\n</p>").unwrap();
/// assert_eq!(markup_to_string(&dom, root), "<p><b>x</b></p>");
/// ```
pub fn markup_to_string(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    for &child in children(dom, id) {
        write_compact(dom, child, &mut out);
    }
    out
}

/// Render the subtree below `id` as an indented outline, one node per line.
///
/// Elements print as their opening tag; text nodes print quoted. Lines are
/// joined with `'\n'` without a trailing newline.
pub fn outline_to_string(dom: &Dom, id: NodeId) -> String {
    let mut lines = Vec::new();
    for &child in children(dom, id) {
        write_outline(dom, child, 0, &mut lines);
    }
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

fn children(dom: &Dom, id: NodeId) -> &[NodeId] {
    dom.children(dom.content(id).unwrap_or(id))
}

fn is_blank(dom: &Dom, id: NodeId) -> bool {
    dom.get(id)
        .is_some_and(|d| d.kind == NodeKind::Text && d.text.trim().is_empty())
}

fn write_compact(dom: &Dom, id: NodeId, out: &mut String) {
    let Some(data) = dom.get(id) else {
        return;
    };
    match data.kind {
        NodeKind::Text if is_blank(dom, id) => {}
        NodeKind::Text => out.push_str(&data.text),
        NodeKind::Fragment => {
            for &child in dom.children(id) {
                write_compact(dom, child, out);
            }
        }
        NodeKind::Element => {
            out.push_str(&dom.describe(id));
            if VOID_ELEMENTS.contains(&data.tag.as_str()) {
                return;
            }
            for &child in children(dom, id) {
                write_compact(dom, child, out);
            }
            out.push_str("</");
            out.push_str(&data.tag);
            out.push('>');
        }
    }
}

fn write_outline(dom: &Dom, id: NodeId, depth: usize, lines: &mut Vec<String>) {
    let Some(data) = dom.get(id) else {
        return;
    };
    let indent = "  ".repeat(depth);
    match data.kind {
        NodeKind::Text if is_blank(dom, id) => {}
        NodeKind::Text => lines.push(format!("{indent}{:?}", data.text)),
        NodeKind::Fragment => {
            for &child in dom.children(id) {
                write_outline(dom, child, depth, lines);
            }
        }
        NodeKind::Element => {
            lines.push(format!("{indent}{}", dom.describe(id)));
            for &child in children(dom, id) {
                write_outline(dom, child, depth + 1, lines);
            }
        }
    }
}
