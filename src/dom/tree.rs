//! Tree operations: insert, detach, remove, clone, walk, attributes.

use std::collections::VecDeque;

use slotmap::{SecondaryMap, SlotMap};

use super::mutation::MutationRecord;
use super::node::{NodeData, NodeId, NodeKind};
use super::DomError;

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

/// The central DOM tree, backed by a slotmap arena.
///
/// All nodes live in a single `SlotMap`. Parent/child relationships are stored
/// in secondary maps so that node removal is O(subtree size) and lookup is O(1).
///
/// Every structural change and every attribute write appends a
/// [`MutationRecord`] to an internal log, drained with [`Dom::take_records`].
/// Live properties (`value`, `checked`) and text node data are not recorded.
pub struct Dom {
    pub(crate) nodes: SlotMap<NodeId, NodeData>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
    root: Option<NodeId>,
    records: Vec<MutationRecord>,
}

impl Dom {
    /// Create an empty DOM.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            root: None,
            records: Vec::new(),
        }
    }

    /// Allocate a node without attaching it anywhere.
    ///
    /// `<template>` elements get an empty content fragment.
    fn alloc(&mut self, mut data: NodeData) -> NodeId {
        if data.is_template() && data.content.is_none() {
            let content = self.nodes.insert(NodeData::fragment());
            self.children.insert(content, Vec::new());
            data.content = Some(content);
        }
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        id
    }

    /// Insert a root-level node (no parent).
    ///
    /// If no root has been set yet, this node becomes the root.
    pub fn insert(&mut self, data: NodeData) -> NodeId {
        let id = self.alloc(data);
        if self.root.is_none() {
            self.root = Some(id);
        }
        id
    }

    /// Create a detached node. Unlike [`Dom::insert`] it never becomes the root.
    pub fn create(&mut self, data: NodeData) -> NodeId {
        self.alloc(data)
    }

    /// Create a node and append it as the last child of `parent`.
    pub fn insert_child(&mut self, parent: NodeId, data: NodeData) -> Result<NodeId, DomError> {
        if !self.nodes.contains_key(parent) {
            return Err(DomError::MissingNode);
        }
        let id = self.alloc(data);
        self.attach(parent, id, None);
        self.records.push(MutationRecord::ChildList {
            target: parent,
            added: vec![id],
            removed: Vec::new(),
        });
        Ok(id)
    }

    /// Move `child` to become the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Move `child` into `parent`, immediately before `reference`
    /// (or at the end when `reference` is `None`).
    ///
    /// The child keeps its subtree. If it had a parent it is detached first,
    /// producing a removal record on the old parent.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return Err(DomError::MissingNode);
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        if let Some(reference) = reference {
            if reference == child {
                return Ok(());
            }
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild);
            }
        }
        self.detach(child);
        self.attach(parent, child, reference);
        self.records.push(MutationRecord::ChildList {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
        });
        Ok(())
    }

    /// Link `child` under `parent` without recording anything.
    pub(super) fn attach(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        self.parent.insert(child, parent);
        if let Some(siblings) = self.children.get_mut(parent) {
            let position = reference
                .and_then(|r| siblings.iter().position(|&s| s == r))
                .unwrap_or(siblings.len());
            siblings.insert(position, child);
        }
    }

    /// Take a node out of its parent's child list, keeping it alive.
    ///
    /// Returns `true` if the node had a parent.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent_id) = self.parent.remove(id) else {
            return false;
        };
        if let Some(siblings) = self.children.get_mut(parent_id) {
            siblings.retain(|&child| child != id);
        }
        self.records.push(MutationRecord::ChildList {
            target: parent_id,
            added: Vec::new(),
            removed: vec![id],
        });
        true
    }

    /// Remove a node and all its descendants recursively.
    ///
    /// Returns the `NodeData` for the removed node, or `None` if it didn't exist.
    pub fn remove(&mut self, id: NodeId) -> Option<NodeData> {
        if !self.nodes.contains_key(id) {
            return None;
        }

        self.detach(id);

        if self.root == Some(id) {
            self.root = None;
        }

        let mut to_remove = VecDeque::new();
        to_remove.push_back(id);
        let mut removed_root_data = None;

        while let Some(current) = to_remove.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                to_remove.extend(kids);
            }
            self.parent.remove(current);
            let data = self.nodes.remove(current);
            if let Some(content) = data.as_ref().and_then(|d| d.content) {
                to_remove.push_back(content);
            }
            if current == id {
                removed_root_data = data;
            }
        }

        removed_root_data
    }

    /// Remove every child of `id`, recording one child-list change.
    pub fn clear_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let kids = self.children(id).to_vec();
        if kids.is_empty() {
            return kids;
        }
        for &child in &kids {
            self.parent.remove(child);
        }
        if let Some(list) = self.children.get_mut(id) {
            list.clear();
        }
        self.records.push(MutationRecord::ChildList {
            target: id,
            added: Vec::new(),
            removed: kids.clone(),
        });
        for &child in &kids {
            self.remove(child);
        }
        kids
    }

    /// Deep-copy `id` and its subtree (including template content) into a
    /// new detached node.
    pub fn clone_subtree(&mut self, id: NodeId) -> Option<NodeId> {
        let mut data = self.nodes.get(id)?.clone();
        let content = data.content.take();
        let copy = self.nodes.insert(data);
        self.children.insert(copy, Vec::new());

        if let Some(content) = content {
            if let Some(content_copy) = self.clone_subtree(content) {
                if let Some(node) = self.nodes.get_mut(copy) {
                    node.content = Some(content_copy);
                }
            }
        }

        for child in self.children(id).to_vec() {
            if let Some(child_copy) = self.clone_subtree(child) {
                self.attach(copy, child_copy, None);
            }
        }
        Some(copy)
    }

    /// Get the parent of a node, if it has one.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Get the children of a node. Returns an empty slice if the node has no children
    /// or does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Children that are elements, skipping text nodes.
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.get(c).is_some_and(NodeData::is_element))
            .collect()
    }

    /// The sibling immediately before `id`, of any kind.
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let index = siblings.iter().position(|&s| s == id)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    /// The sibling immediately after `id`, of any kind.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let index = siblings.iter().position(|&s| s == id)?;
        siblings.get(index + 1).copied()
    }

    /// Walk from `id` up to the root, collecting ancestor node ids.
    ///
    /// The returned vec does **not** include `id` itself; it starts with the
    /// immediate parent and ends at the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        if !self.nodes.contains_key(node) {
            return false;
        }
        let mut current = Some(node);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.parent(c);
        }
        false
    }

    /// The topmost ancestor of `id` (or `id` itself when detached).
    pub fn tree_root(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().copied().unwrap_or(id)
    }

    /// Content fragment of a `<template>` element.
    pub fn content(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.content
    }

    /// Immutable access to a node's data.
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    /// Mutable access to a node's data. Changes made through this handle
    /// are not recorded.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id)
    }

    /// The current root node, if set.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Explicitly set the root node.
    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// Number of nodes in the DOM.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the DOM is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the DOM contains a node with the given id.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Pre-order depth-first traversal starting from `start`.
    ///
    /// Template content is not part of the tree and is not visited.
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            // Push children in reverse so the first child is visited first.
            let kids = self.children(current);
            for &child in kids.iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    // -----------------------------------------------------------------------
    // Attributes
    // -----------------------------------------------------------------------

    /// Read an attribute.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)?.attribute(&name.to_ascii_lowercase())
    }

    /// Set an attribute, recording the change. Names are lowercased.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let name = name.to_ascii_lowercase();
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if node.kind != NodeKind::Element {
            return;
        }
        let old_value = node.attributes.insert(name.clone(), value.into());
        self.records.push(MutationRecord::Attributes {
            target: id,
            name,
            old_value,
        });
    }

    /// Remove an attribute, recording the change if it existed.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        let old_value = self.nodes.get_mut(id)?.attributes.shift_remove(&name)?;
        self.records.push(MutationRecord::Attributes {
            target: id,
            name,
            old_value: Some(old_value.clone()),
        });
        Some(old_value)
    }

    // -----------------------------------------------------------------------
    // Text
    // -----------------------------------------------------------------------

    /// Concatenated data of every descendant text node.
    pub fn text_content(&self, id: NodeId) -> String {
        self.walk_depth_first(id)
            .into_iter()
            .filter_map(|n| self.get(n))
            .filter(|d| d.is_text())
            .map(|d| d.text.as_str())
            .collect()
    }

    /// Replace every child of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        match self.get(id).map(|d| d.kind) {
            Some(NodeKind::Text) => {
                if let Some(node) = self.nodes.get_mut(id) {
                    node.text = text.to_owned();
                }
            }
            Some(_) => {
                self.clear_children(id);
                if !text.is_empty() {
                    // The parent exists; a failure here is unreachable.
                    let _ = self.insert_child(id, NodeData::text(text));
                }
            }
            None => {}
        }
    }

    // -----------------------------------------------------------------------
    // Mutation log
    // -----------------------------------------------------------------------

    pub(super) fn record(&mut self, record: MutationRecord) {
        self.records.push(record);
    }

    /// Drain the accumulated mutation records.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    /// Records accumulated since the last drain.
    pub fn pending_records(&self) -> &[MutationRecord] {
        &self.records
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a small test tree:
    /// ```text
    ///       root
    ///      /    \
    ///    a        b
    ///   / \
    ///  c   d
    /// ```
    fn build_tree() -> (Dom, NodeId, NodeId, NodeId, NodeId, NodeId) {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::element("div").with_id("root"));
        let a = dom
            .insert_child(root, NodeData::element("section").with_id("a"))
            .unwrap();
        let b = dom
            .insert_child(root, NodeData::element("section").with_id("b"))
            .unwrap();
        let c = dom.insert_child(a, NodeData::element("p").with_id("c")).unwrap();
        let d = dom.insert_child(a, NodeData::element("span").with_id("d")).unwrap();
        dom.take_records();
        (dom, root, a, b, c, d)
    }

    #[test]
    fn insert_sets_root() {
        let mut dom = Dom::new();
        let id = dom.insert(NodeData::element("div"));
        assert_eq!(dom.root(), Some(id));
        let detached = dom.create(NodeData::element("p"));
        assert_eq!(dom.root(), Some(id));
        assert_eq!(dom.parent(detached), None);
    }

    #[test]
    fn insert_child_parent_relationship() {
        let (dom, root, a, _b, c, _d) = build_tree();
        assert_eq!(dom.parent(a), Some(root));
        assert_eq!(dom.parent(c), Some(a));
        assert_eq!(dom.parent(root), None);
    }

    #[test]
    fn insert_child_records_addition() {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::element("div"));
        let child = dom.insert_child(root, NodeData::element("p")).unwrap();
        assert_eq!(
            dom.take_records(),
            vec![MutationRecord::ChildList {
                target: root,
                added: vec![child],
                removed: vec![],
            }]
        );
        assert!(dom.pending_records().is_empty());
    }

    #[test]
    fn children_and_siblings() {
        let (dom, root, a, b, c, d) = build_tree();
        assert_eq!(dom.children(root), &[a, b]);
        assert_eq!(dom.children(a), &[c, d]);
        assert_eq!(dom.next_sibling(c), Some(d));
        assert_eq!(dom.previous_sibling(d), Some(c));
        assert_eq!(dom.previous_sibling(c), None);
        assert_eq!(dom.next_sibling(b), None);
    }

    #[test]
    fn ancestors_and_containment() {
        let (dom, root, a, b, c, _d) = build_tree();
        assert_eq!(dom.ancestors(c), vec![a, root]);
        assert!(dom.is_inclusive_ancestor(root, c));
        assert!(dom.is_inclusive_ancestor(c, c));
        assert!(!dom.is_inclusive_ancestor(b, c));
        assert_eq!(dom.tree_root(c), root);
    }

    #[test]
    fn insert_before_reference() {
        let (mut dom, _root, a, _b, c, d) = build_tree();
        let e = dom.create(NodeData::element("em"));
        dom.insert_before(a, e, Some(d)).unwrap();
        assert_eq!(dom.children(a), &[c, e, d]);
    }

    #[test]
    fn insert_before_moves_between_parents() {
        let (mut dom, _root, a, b, c, d) = build_tree();
        dom.append_child(b, c).unwrap();
        assert_eq!(dom.children(a), &[d]);
        assert_eq!(dom.children(b), &[c]);
        let records = dom.take_records();
        assert_eq!(records.len(), 2);
        assert!(records[0].has_removals());
        assert_eq!(records[1].target(), b);
    }

    #[test]
    fn insert_before_rejects_cycles() {
        let (mut dom, root, a, _b, c, _d) = build_tree();
        assert_eq!(dom.append_child(c, a), Err(DomError::HierarchyRequest));
        assert_eq!(dom.append_child(a, root), Err(DomError::HierarchyRequest));
    }

    #[test]
    fn insert_before_rejects_foreign_reference() {
        let (mut dom, _root, a, b, _c, _d) = build_tree();
        let e = dom.create(NodeData::element("em"));
        assert_eq!(dom.insert_before(a, e, Some(b)), Err(DomError::NotAChild));
    }

    #[test]
    fn detach_keeps_node_alive() {
        let (mut dom, root, a, _b, c, _d) = build_tree();
        assert!(dom.detach(a));
        assert!(dom.contains(a));
        assert!(dom.contains(c));
        assert!(!dom.is_inclusive_ancestor(root, c));
        assert!(!dom.detach(a));
        assert!(dom.take_records()[0].has_removals());
    }

    #[test]
    fn remove_subtree() {
        let (mut dom, root, a, b, c, d) = build_tree();
        dom.remove(a);
        assert!(!dom.contains(a));
        assert!(!dom.contains(c));
        assert!(!dom.contains(d));
        assert!(dom.contains(root));
        assert_eq!(dom.children(root), &[b]);
        assert_eq!(dom.len(), 2);
    }

    #[test]
    fn remove_nonexistent() {
        let mut dom = Dom::new();
        let id = dom.insert(NodeData::element("x"));
        dom.remove(id);
        assert!(dom.remove(id).is_none());
        assert_eq!(dom.root(), None);
    }

    #[test]
    fn template_gets_content_fragment() {
        let mut dom = Dom::new();
        let template = dom.insert(NodeData::element("template"));
        let content = dom.content(template).unwrap();
        dom.insert_child(content, NodeData::element("p")).unwrap();
        assert!(dom.children(template).is_empty());
        assert_eq!(dom.walk_depth_first(template), vec![template]);
        dom.remove(template);
        assert!(!dom.contains(content));
    }

    #[test]
    fn clone_subtree_is_deep_and_detached() {
        let (mut dom, _root, a, _b, c, _d) = build_tree();
        let copy = dom.clone_subtree(a).unwrap();
        assert_ne!(copy, a);
        assert_eq!(dom.parent(copy), None);
        assert_eq!(dom.children(copy).len(), 2);
        let first = dom.children(copy)[0];
        assert_ne!(first, c);
        assert_eq!(dom.get(first).unwrap().id(), Some("c"));
    }

    #[test]
    fn clone_subtree_copies_template_content() {
        let mut dom = Dom::new();
        let template = dom.insert(NodeData::element("template"));
        let content = dom.content(template).unwrap();
        dom.insert_child(content, NodeData::element("p")).unwrap();
        let copy = dom.clone_subtree(template).unwrap();
        let copy_content = dom.content(copy).unwrap();
        assert_ne!(copy_content, content);
        assert_eq!(dom.children(copy_content).len(), 1);
    }

    #[test]
    fn attribute_writes_are_recorded() {
        let (mut dom, _root, a, ..) = build_tree();
        dom.set_attribute(a, "Bind-X", "1");
        assert_eq!(dom.attribute(a, "bind-x"), Some("1"));
        assert_eq!(dom.remove_attribute(a, "bind-x").as_deref(), Some("1"));
        assert!(dom.remove_attribute(a, "bind-x").is_none());
        let records = dom.take_records();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            MutationRecord::Attributes {
                target: a,
                name: "bind-x".into(),
                old_value: None,
            }
        );
    }

    #[test]
    fn text_content_roundtrip() {
        let (mut dom, root, a, _b, c, _d) = build_tree();
        dom.set_text_content(c, "hello");
        dom.insert_child(a, NodeData::text(" world")).unwrap();
        assert_eq!(dom.text_content(a), "hello world");
        assert_eq!(dom.text_content(root), "hello world");
        dom.set_text_content(a, "");
        assert!(dom.children(a).is_empty());
        assert!(!dom.contains(c));
    }

    #[test]
    fn element_children_skip_text() {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::element("div"));
        dom.insert_child(root, NodeData::text(" ")).unwrap();
        let p = dom.insert_child(root, NodeData::element("p")).unwrap();
        assert_eq!(dom.element_children(root), vec![p]);
    }

    #[test]
    fn default_impl() {
        let dom = Dom::default();
        assert!(dom.is_empty());
        assert_eq!(dom.root(), None);
    }
}
