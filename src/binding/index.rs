//! Path index: which nodes render which store paths.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexSet;

use crate::dom::NodeId;
use crate::store::path;

/// A two-way map between dot paths and tracked nodes.
///
/// Paths are kept sorted so that descendant lookups and ordered
/// propagation are range scans.
#[derive(Debug, Default)]
pub struct PathIndex {
    by_path: BTreeMap<String, IndexSet<NodeId>>,
    by_node: HashMap<NodeId, IndexSet<String>>,
}

impl PathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, node: NodeId) {
        self.by_path.entry(path.to_owned()).or_default().insert(node);
        self.by_node.entry(node).or_default().insert(path.to_owned());
    }

    /// Forget `node` under every path. Returns whether it was tracked.
    pub fn remove_node(&mut self, node: NodeId) -> bool {
        let Some(paths) = self.by_node.remove(&node) else {
            return false;
        };
        for p in paths {
            if let Some(nodes) = self.by_path.get_mut(&p) {
                nodes.shift_remove(&node);
                if nodes.is_empty() {
                    self.by_path.remove(&p);
                }
            }
        }
        true
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.by_node.contains_key(&node)
    }

    /// Nodes registered under exactly `path`, in registration order.
    pub fn nodes_at(&self, path: &str) -> Vec<NodeId> {
        self.by_path
            .get(path)
            .map(|nodes| nodes.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Paths a node is registered under.
    pub fn paths_of(&self, node: NodeId) -> Vec<String> {
        self.by_node
            .get(&node)
            .map(|paths| paths.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Indexed paths strictly below `ancestor`, ascending.
    pub fn descendants_of(&self, ancestor: &str) -> Vec<String> {
        let start = if ancestor.is_empty() {
            String::new()
        } else {
            format!("{ancestor}.")
        };
        self.by_path
            .range(start..)
            .map(|(p, _)| p)
            .take_while(|p| ancestor.is_empty() || p.starts_with(ancestor))
            .filter(|p| path::is_descendant(p, ancestor))
            .cloned()
            .collect()
    }

    /// Every tracked node.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.by_node.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.by_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_path.clear();
        self.by_node.clear();
    }
}
