//! Loop materialization.
//!
//! A loop template renders one item per key of the store node at its
//! path, as siblings immediately before the template:
//!
//! ```html
//! <template each bind="arr" key="key" value="val">
//!     <li bind-val bind="val"></li>
//! </template>
//! ```
//!
//! Every top-level node of an item carries the item marker (`one`) with
//! its `path.key`. Items of nested loops sit in the same sibling run with
//! longer markers and are grouped under the first key segment.
//!
//! Items whose key survives an update are kept, not re-created. When the
//! surviving keys come back in a different order the kept items are moved
//! so the run always follows the store's key order.

use indexmap::IndexMap;
use tracing::{debug_span, trace};

use crate::dom::NodeId;
use crate::store::path;

use super::error::BindingError;
use super::render::DEPENDENCY_PREFIX;
use super::{scope, Binding};

/// Template attribute naming the key alias.
const KEY_ALIAS: &str = "key";
/// Template attribute naming the value alias.
const VALUE_ALIAS: &str = "value";

/// Whether `key` can be spliced into attribute names and expressions.
pub(crate) fn is_acceptable_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '$'))
}

/// Alias names one loop level substitutes.
#[derive(Debug, Clone, Default)]
struct Aliases {
    key: Option<String>,
    value: Option<String>,
}

impl Aliases {
    fn is_empty(&self) -> bool {
        self.key.is_none() && self.value.is_none()
    }

    /// Drop aliases redeclared by a nested template.
    fn shadowed_by(&self, key: Option<&str>, value: Option<&str>) -> Self {
        let redeclared = |alias: &Option<String>| {
            alias
                .as_deref()
                .is_some_and(|a| key == Some(a) || value == Some(a))
        };
        Self {
            key: self.key.clone().filter(|_| !redeclared(&self.key)),
            value: self.value.clone().filter(|_| !redeclared(&self.value)),
        }
    }
}

/// Replace a leading `alias` segment of a dot path with `item`.
fn rebase(path: &str, alias: &str, item: &str) -> Option<String> {
    if path == alias {
        return Some(item.to_owned());
    }
    path.strip_prefix(alias)
        .filter(|rest| rest.starts_with('.'))
        .map(|rest| format!("{item}{rest}"))
}

impl Binding {
    /// Bring the items of `template` in line with the keys at `path`.
    pub(super) fn update_loop(&mut self, template: NodeId, path: &str) -> Result<(), BindingError> {
        if !self.is_connected(template) {
            return Ok(());
        }
        let Some(parent) = self.dom.parent(template) else {
            return Ok(());
        };
        let _span = debug_span!("loop", path = %path).entered();

        let keys = self
            .store
            .lookup(path)
            .map(|data| data.keys())
            .unwrap_or_default();
        let mut existing = self.loop_items(template, path);

        for (key, nodes) in existing.iter() {
            if keys.contains(key) {
                continue;
            }
            trace!(key = %key, "loop item removed");
            for &node in nodes {
                self.unindex_subtree(node);
                self.dom.remove(node);
            }
        }
        existing.retain(|key, _| keys.contains(key));

        let in_order = existing
            .keys()
            .eq(keys.iter().filter(|key| existing.contains_key(*key)));
        if !in_order {
            trace!("loop items reordered");
        }

        let mut first: Option<BindingError> = None;
        let mut anchor = template;
        for key in keys.iter().rev() {
            if let Some(nodes) = existing.get(key) {
                if in_order {
                    if let Some(&head) = nodes.first() {
                        anchor = head;
                    }
                    continue;
                }
                for &node in nodes.iter().rev() {
                    match self.dom.insert_before(parent, node, Some(anchor)) {
                        Ok(()) => anchor = node,
                        Err(err) => {
                            first.get_or_insert(err.into());
                        }
                    }
                }
                continue;
            }
            match self.materialize(template, parent, anchor, path, key) {
                Ok(Some(head)) => anchor = head,
                Ok(None) => {}
                Err(err) => {
                    first.get_or_insert(err);
                }
            }
        }

        if let Err(err) = self.flush() {
            first.get_or_insert(err);
        }
        self.refresh_template(template);
        first.map_or(Ok(()), Err)
    }

    /// Existing items of the loop at `path`, grouped by key in document order.
    fn loop_items(&self, template: NodeId, path: &str) -> IndexMap<String, Vec<NodeId>> {
        let marker = &self.config.item_marker;
        let prefix = format!("{path}.");
        let mut run = Vec::new();
        let mut cursor = self.dom.previous_sibling(template);
        while let Some(node) = cursor {
            cursor = self.dom.previous_sibling(node);
            let Some(data) = self.dom.get(node) else {
                break;
            };
            if !data.is_element() {
                if data.is_text() {
                    continue;
                }
                break;
            }
            let Some(key) = data
                .attribute(marker)
                .and_then(|m| m.strip_prefix(prefix.as_str()))
                .and_then(|rest| rest.split('.').next())
                .filter(|key| !key.is_empty())
            else {
                break;
            };
            run.push((key.to_owned(), node));
        }

        let mut items: IndexMap<String, Vec<NodeId>> = IndexMap::new();
        for (key, node) in run.into_iter().rev() {
            items.entry(key).or_default().push(node);
        }
        items
    }

    /// Clone the template content for `key` and insert it before `anchor`.
    /// Returns the first inserted node.
    fn materialize(
        &mut self,
        template: NodeId,
        parent: NodeId,
        anchor: NodeId,
        path: &str,
        key: &str,
    ) -> Result<Option<NodeId>, BindingError> {
        if !is_acceptable_key(key) {
            return Err(BindingError::UnacceptableKey(key.to_owned()));
        }
        let Some(content) = self.dom.content(template) else {
            return Ok(None);
        };
        let aliases = Aliases {
            key: self.dom.attribute(template, KEY_ALIAS).map(path::normalize),
            value: self.dom.attribute(template, VALUE_ALIAS).map(path::normalize),
        };
        let item = path::join(path, key);
        let marker = self.config.item_marker.clone();

        let mut clones = Vec::new();
        for child in self.dom.element_children(content) {
            if let Some(clone) = self.dom.clone_subtree(child) {
                self.rewrite_aliases(clone, &aliases, &item, key);
                if let Some(data) = self.dom.get_mut(clone) {
                    data.attributes.insert(marker.clone(), item.clone());
                }
                clones.push(clone);
            }
        }

        let mut inserted = Vec::with_capacity(clones.len());
        for clone in clones.iter().rev() {
            let reference = inserted.last().copied().unwrap_or(anchor);
            self.dom.insert_before(parent, *clone, Some(reference))?;
            inserted.push(*clone);
        }
        trace!(item = %item, nodes = inserted.len(), "loop item added");
        Ok(clones.first().copied())
    }

    /// Substitute loop aliases in a detached clone, including the content
    /// of nested templates.
    fn rewrite_aliases(&mut self, root: NodeId, aliases: &Aliases, item: &str, key: &str) {
        if aliases.is_empty() {
            return;
        }
        let key_literal = format!("'{key}'");
        let loop_marker = self.config.loop_marker.clone();
        let mut stack = vec![(root, aliases.clone())];

        while let Some((node, aliases)) = stack.pop() {
            let children = self.dom.children(node).to_vec();
            let content = self.dom.content(node);
            let Some(data) = self.dom.get_mut(node) else {
                continue;
            };
            let is_loop = data.is_template() && data.has_attribute(&loop_marker);

            let mut attributes = indexmap::IndexMap::with_capacity(data.attributes.len());
            for (name, value) in std::mem::take(&mut data.attributes) {
                let name = match name.strip_prefix(DEPENDENCY_PREFIX) {
                    Some(dep) => {
                        if aliases.key.as_deref() == Some(dep) {
                            continue;
                        }
                        match aliases.value.as_deref().and_then(|alias| rebase(dep, alias, item)) {
                            Some(rebased) => {
                                format!("{DEPENDENCY_PREFIX}{}", path::normalize(&rebased))
                            }
                            None => name,
                        }
                    }
                    None => name,
                };
                attributes.insert(name, value);
            }
            if let Some(bind) = attributes.get_mut("bind") {
                *bind = if is_loop {
                    rewrite_path(bind, &aliases, item, &key_literal)
                } else {
                    rewrite_bind(bind, &aliases, item, &key_literal)
                };
            }
            data.attributes = attributes;

            stack.extend(children.into_iter().map(|c| (c, aliases.clone())));
            if let Some(content) = content {
                let key = data.attribute(KEY_ALIAS).map(path::normalize);
                let value = data.attribute(VALUE_ALIAS).map(path::normalize);
                let inner = aliases.shadowed_by(key.as_deref(), value.as_deref());
                if !inner.is_empty() {
                    stack.push((content, inner));
                }
            }
        }
    }

    /// Unindex `root` and everything below it.
    pub(super) fn unindex_subtree(&mut self, root: NodeId) {
        for node in self.dom.walk_depth_first(root) {
            self.elements.remove_node(node);
            self.loops.remove_node(node);
            self.inputs.remove(node);
            self.expressions.release(node);
        }
    }

    /// Refresh the `bind-<path>` attributes of a loop template.
    fn refresh_template(&mut self, template: NodeId) {
        for dep in self.dependencies(template) {
            let Some(serialized) = self.store.lookup(&dep).map(|data| data.serialize()) else {
                continue;
            };
            let name = format!("{DEPENDENCY_PREFIX}{dep}");
            if self.dom.attribute(template, &name) != Some(serialized.as_str()) {
                self.dom.set_attribute(template, &name, serialized);
            }
        }
    }
}

/// A loop template's `bind` is a path: only the value alias applies.
fn rewrite_path(bind: &str, aliases: &Aliases, item: &str, key_literal: &str) -> String {
    let normalized = path::normalize(bind);
    match aliases.value.as_deref().and_then(|alias| rebase(&normalized, alias, item)) {
        Some(rebased) => rebased,
        None => rewrite_expression(bind, aliases, item, key_literal),
    }
}

/// An element's `bind`: a JSON object of expressions or a bare expression.
fn rewrite_bind(bind: &str, aliases: &Aliases, item: &str, key_literal: &str) -> String {
    if let Ok(mut targets) = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(bind) {
        for value in targets.values_mut() {
            if let serde_json::Value::String(expression) = value {
                *expression = rewrite_expression(expression, aliases, item, key_literal);
            }
        }
        return serde_json::Value::Object(targets).to_string();
    }
    rewrite_expression(bind, aliases, item, key_literal)
}

fn rewrite_expression(expression: &str, aliases: &Aliases, item: &str, key_literal: &str) -> String {
    let mut out = expression.to_owned();
    if let Some(value) = &aliases.value {
        out = scope::replace_identifier(&out, value, item);
    }
    if let Some(key) = &aliases.key {
        out = scope::replace_identifier(&out, key, key_literal);
    }
    out
}
