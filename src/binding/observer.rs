//! Mutation observer bridge.
//!
//! The DOM appends a record for every structural and attribute change.
//! [`Binding::flush`] drains them as one batch:
//!
//! 1. if anything was removed, nodes that left the container are unindexed;
//! 2. edited `bind-<path>` attributes of tracked elements become store writes;
//! 3. added subtrees are scanned for `bind` elements and loop templates,
//!    whose non-empty `bind-<path>` attributes seed absent store paths;
//! 4. writes apply in ascending path order, then new loops materialize and
//!    new elements render.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, debug_span, warn};

use crate::dom::{MutationRecord, NodeId};
use crate::store::{path, Data};

use super::error::BindingError;
use super::render::DEPENDENCY_PREFIX;
use super::{Binding, SetMode};

/// A store write collected during a batch.
#[derive(Debug, Clone, PartialEq)]
enum Pending {
    /// An edited attribute on a tracked element; always applied.
    Sync(Data),
    /// A cold-cache value or live input state; applied only to absent paths.
    Seed(Data),
}

impl Binding {
    /// Process pending DOM mutation records.
    ///
    /// Every affected element is rendered even when some fail; the first
    /// failure is returned.
    pub fn flush(&mut self) -> Result<(), BindingError> {
        if self.closed {
            return Ok(());
        }
        let records = self.dom.take_records();
        if records.is_empty() {
            return Ok(());
        }
        let _span = debug_span!("flush", records = records.len()).entered();

        if records.iter().any(MutationRecord::has_removals) {
            self.sweep();
        }

        let mut syncs = BTreeMap::new();
        let mut added = Vec::new();
        for record in &records {
            match record {
                MutationRecord::ChildList { added: nodes, .. } => added.extend(nodes.iter().copied()),
                MutationRecord::Attributes { target, name, .. } => {
                    if let Some((dep, data)) = self.attribute_sync(*target, name) {
                        syncs.insert(dep, data);
                    }
                }
            }
        }
        self.integrate(added, syncs)
    }

    /// A store write for an edited `bind-<path>` attribute, if its value
    /// no longer matches the store.
    fn attribute_sync(&self, target: NodeId, name: &str) -> Option<(String, Data)> {
        let dep = path::normalize(name.strip_prefix(DEPENDENCY_PREFIX)?);
        if dep.is_empty() || !self.is_tracked(target) || !self.is_connected(target) {
            return None;
        }
        let current = self.dom.attribute(target, name)?;
        let stored = self.store.lookup(&dep).map(Data::serialize).unwrap_or_default();
        (current != stored).then(|| (dep, Data::from_serialized(current)))
    }

    /// Unindex every node that is gone or no longer inside the container.
    fn sweep(&mut self) {
        let gone: Vec<NodeId> = self
            .elements
            .nodes()
            .into_iter()
            .chain(self.loops.nodes())
            .filter(|&node| !self.is_connected(node))
            .collect();
        for node in &gone {
            self.elements.remove_node(*node);
            self.loops.remove_node(*node);
            self.expressions.release(*node);
        }
        let dom = &self.dom;
        let container = self.container;
        self.inputs
            .prune(|node| dom.is_inclusive_ancestor(container, node));
        if !gone.is_empty() {
            debug!(count = gone.len(), "untracked removed nodes");
        }
    }

    /// Index the bound nodes under `roots`, apply `syncs` and batch seeds,
    /// then materialize and render what was found.
    pub(super) fn integrate(
        &mut self,
        roots: Vec<NodeId>,
        syncs: BTreeMap<String, Data>,
    ) -> Result<(), BindingError> {
        let mut writes: BTreeMap<String, Pending> = BTreeMap::new();
        let mut inputs: BTreeMap<String, Data> = BTreeMap::new();
        let mut new_loops: Vec<(String, NodeId)> = Vec::new();
        let mut new_elements: Vec<(String, NodeId)> = Vec::new();
        let mut seen = HashSet::new();

        for root in roots {
            if !self.is_connected(root) {
                continue;
            }
            for node in self.dom.walk_depth_first(root) {
                if !seen.insert(node) || self.is_tracked(node) {
                    continue;
                }
                let Some(data) = self.dom.get(node) else {
                    continue;
                };
                let Some(bind) = data.attribute("bind").filter(|_| data.is_element()) else {
                    continue;
                };
                let is_loop = data.is_template() && data.has_attribute(&self.config.loop_marker);
                let bind = bind.to_owned();
                for (name, value) in &data.attributes {
                    let Some(dep) = name.strip_prefix(DEPENDENCY_PREFIX) else {
                        continue;
                    };
                    let dep = path::normalize(dep);
                    if !dep.is_empty() && !value.is_empty() {
                        writes.insert(dep, Pending::Seed(Data::from_serialized(value)));
                    }
                }

                if is_loop {
                    let path = path::normalize(&bind);
                    self.loops.insert(&path, node);
                    new_loops.push((path, node));
                    continue;
                }
                let deps = self.dependencies(node);
                if deps.is_empty() {
                    self.elements.insert("", node);
                } else {
                    for dep in &deps {
                        self.elements.insert(dep, node);
                    }
                }
                new_elements.push((deps.into_iter().next().unwrap_or_default(), node));

                self.register_input(node);
                for (dep, data) in self.input_writes(node) {
                    inputs.entry(dep).or_insert(data);
                }
            }
        }

        for (dep, data) in inputs {
            writes.entry(dep).or_insert(Pending::Seed(data));
        }
        for (dep, data) in syncs {
            writes.insert(dep, Pending::Sync(data));
        }

        let mut first = None;
        for (dep, pending) in writes {
            let data = match pending {
                Pending::Sync(data) => data,
                Pending::Seed(data) if !self.store.contains(&dep) => data,
                Pending::Seed(_) => continue,
            };
            if let Err(err) = self.write(&dep, Some(data), SetMode::Default) {
                first.get_or_insert(err);
            }
        }

        new_loops.sort_by(|a, b| a.0.cmp(&b.0));
        for (path, template) in new_loops {
            if !self.loops.contains(template) {
                continue;
            }
            if let Err(err) = self.update_loop(template, &path) {
                warn!(error = %err, path = %path, "loop update failed");
                first.get_or_insert(err);
            }
        }

        new_elements.sort_by(|a, b| a.0.cmp(&b.0));
        for (_, element) in new_elements {
            if !self.elements.contains(element) {
                continue;
            }
            if let Err(err) = self.update_element(element) {
                warn!(error = %err, "render failed");
                first.get_or_insert(err);
            }
        }

        first.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use crate::binding::Binding;
    use crate::config::BindingConfig;
    use crate::dom::{Dom, NodeData};
    use crate::store::Data;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn mount(markup: &str) -> Binding {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::element("div"));
        dom.set_inner_html(root, markup).unwrap();
        Binding::new(dom, root, BindingConfig::default()).unwrap()
    }

    fn text(binding: &Binding, id: &str) -> String {
        let node = binding.dom().query_by_id(id).unwrap();
        binding.dom().text_content(node)
    }

    #[test]
    fn added_elements_are_indexed_and_rendered() {
        let mut binding = mount("");
        binding.set("a", json!({"x": "1"})).unwrap();
        let root = binding.container();
        binding
            .dom_mut()
            .set_inner_html(root, r#"<data-text id="x" bind-a.x bind="a.x"></data-text>"#)
            .unwrap();
        binding.flush().unwrap();
        assert_eq!(text(&binding, "x"), "1");
        binding.set("a.x", "2").unwrap();
        assert_eq!(text(&binding, "x"), "2");
    }

    #[test]
    fn removed_elements_are_forgotten() {
        let mut binding = mount(r#"<data-text id="t" bind-a bind="a"></data-text>"#);
        binding.set("a", "kept").unwrap();
        let t = binding.dom().query_by_id("t").unwrap();
        binding.dom_mut().detach(t);
        binding.dom_mut().set_attribute(t, "bind-a", "ignored");
        binding.flush().unwrap();
        assert!(!binding.is_tracked(t));
        assert_eq!(binding.get(Some("a")).unwrap(), Some(Data::text("kept")));

        binding.set("a", "new").unwrap();
        assert_eq!(binding.dom().text_content(t), "kept");
    }

    #[test]
    fn edited_dependency_attributes_write_back() {
        let mut binding = mount(
            r#"<data-text id="t" bind-a bind="a"></data-text><p id="p" bind-a bind='{"title": "a"}'></p>"#,
        );
        binding.set("a", "one").unwrap();
        binding.flush().unwrap();
        let t = binding.dom().query_by_id("t").unwrap();
        binding.dom_mut().set_attribute(t, "bind-a", "two");
        binding.flush().unwrap();
        assert_eq!(binding.get(Some("a")).unwrap(), Some(Data::text("two")));
        let p = binding.dom().query_by_id("p").unwrap();
        assert_eq!(binding.dom().attribute(p, "title"), Some("two"));
        assert_eq!(binding.dom().attribute(p, "bind-a"), Some("two"));
    }

    #[test]
    fn seeds_apply_in_path_order() {
        let binding = mount(concat!(
            r#"<data-text id="a0" bind-a.0="1" bind="a.0"></data-text>"#,
            r#"<data-text id="a1" bind-a.1="2" bind="a.1"></data-text>"#,
            r#"<data-text id="a" bind-a="data" bind="a"></data-text>"#,
        ));
        assert_eq!(text(&binding, "a"), r#"{"0":"1","1":"2"}"#);
        assert_eq!(text(&binding, "a0"), "1");
        assert_eq!(
            binding.get(None).unwrap().map(|d| d.serialize()),
            Some(r#"{"a":{"0":"1","1":"2"}}"#.into())
        );
    }

    #[test]
    fn seeds_never_override_stored_values() {
        let mut binding = mount("");
        binding.set("t", "stored").unwrap();
        let root = binding.container();
        binding
            .dom_mut()
            .append_html(root, r#"<data-text id="t" bind-t="weak" bind="t"></data-text>"#)
            .unwrap();
        binding.flush().unwrap();
        assert_eq!(text(&binding, "t"), "stored");
        let t = binding.dom().query_by_id("t").unwrap();
        assert_eq!(binding.dom().attribute(t, "bind-t"), Some("stored"));
    }

    #[test]
    fn flush_after_close_is_a_no_op() {
        let mut binding = mount("");
        binding.close();
        let root = binding.container();
        binding
            .dom_mut()
            .append_html(root, r#"<data-text id="t" bind="'x'"></data-text>"#)
            .unwrap();
        binding.flush().unwrap();
        assert_eq!(text(&binding, "t"), "");
    }
}
