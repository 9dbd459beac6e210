//! DOM queries: by id, tag, attribute; generic predicate matching.

use super::node::{NodeData, NodeId};
use super::tree::Dom;

impl Dom {
    /// Find the first node whose `id` attribute matches the given string.
    ///
    /// Iterates all nodes in the arena, including detached ones.
    pub fn query_by_id(&self, id: &str) -> Option<NodeId> {
        self.iter_nodes()
            .find(|(_, data)| data.id() == Some(id))
            .map(|(node_id, _)| node_id)
    }

    /// Find all nodes matching an arbitrary predicate, anywhere in the arena.
    pub fn query_all(&self, predicate: impl Fn(&NodeData) -> bool) -> Vec<NodeId> {
        self.iter_nodes()
            .filter(|(_, data)| predicate(data))
            .map(|(node_id, _)| node_id)
            .collect()
    }

    /// Find the first element under `scope` (inclusive, tree order) with the given id.
    pub fn find_by_id(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        self.walk_depth_first(scope)
            .into_iter()
            .find(|&n| self.get(n).is_some_and(|d| d.id() == Some(id)))
    }

    /// All elements under `scope` (inclusive, tree order) with the given tag.
    pub fn find_by_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        let tag = tag.to_ascii_lowercase();
        self.find_all(scope, |d| d.is_element() && d.tag == tag)
    }

    /// All elements under `scope` (inclusive, tree order) carrying attribute `name`.
    pub fn find_by_attribute(&self, scope: NodeId, name: &str) -> Vec<NodeId> {
        let name = name.to_ascii_lowercase();
        self.find_all(scope, |d| d.has_attribute(&name))
    }

    /// All nodes under `scope` (inclusive, tree order) matching `predicate`.
    pub fn find_all(&self, scope: NodeId, predicate: impl Fn(&NodeData) -> bool) -> Vec<NodeId> {
        self.walk_depth_first(scope)
            .into_iter()
            .filter(|&n| self.get(n).is_some_and(&predicate))
            .collect()
    }

    /// Iterate over all `(NodeId, &NodeData)` pairs in the arena.
    ///
    /// Iterates in slotmap insertion order, which is deterministic but not tree-order.
    fn iter_nodes(&self) -> impl Iterator<Item = (NodeId, &NodeData)> {
        self.nodes.iter()
    }
}
