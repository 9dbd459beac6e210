//! Element and attribute rendering.

use tracing::trace;

use crate::dom::NodeId;
use crate::expr::{self, Value};
use crate::store::path;

use super::error::BindingError;
use super::{scope, Binding};

/// Attribute prefix declaring a dependency path.
pub(crate) const DEPENDENCY_PREFIX: &str = "bind-";

impl Binding {
    pub(super) fn is_connected(&self, node: NodeId) -> bool {
        self.dom.is_inclusive_ancestor(self.container, node)
    }

    /// Dependency paths declared by `bind-<path>` attributes, in
    /// attribute order without duplicates.
    pub(super) fn dependencies(&self, node: NodeId) -> Vec<String> {
        let Some(data) = self.dom.get(node) else {
            return Vec::new();
        };
        let mut deps: Vec<String> = Vec::new();
        for name in data.attributes.keys() {
            if let Some(dep) = name.strip_prefix(DEPENDENCY_PREFIX) {
                let dep = path::normalize(dep);
                if !dep.is_empty() && !deps.contains(&dep) {
                    deps.push(dep);
                }
            }
        }
        deps
    }

    /// Re-render one bound element from the store.
    ///
    /// Detached elements are skipped. The element's `bind-<path>`
    /// attributes are refreshed even when evaluation fails.
    pub(super) fn update_element(&mut self, node: NodeId) -> Result<(), BindingError> {
        if !self.is_connected(node) {
            return Ok(());
        }
        let Some(data) = self.dom.get(node) else {
            return Ok(());
        };
        let Some(bind) = data.attribute("bind").map(str::to_owned) else {
            return Ok(());
        };
        let tag = data.tag.clone();
        let deps = self.dependencies(node);
        trace!(element = %self.dom.describe(node), "render");

        let result = if tag == self.config.text_tag {
            self.evaluate(node, &bind, &deps).map(|value| {
                let display = value.to_display_string();
                if self.dom.text_content(node) != display {
                    self.dom.set_text_content(node, &display);
                }
            })
        } else if tag == self.config.html_tag {
            self.evaluate(node, &bind, &deps).and_then(|value| {
                let display = value.to_display_string();
                if self.dom.inner_html(node) != display {
                    self.dom.set_inner_html(node, &display)?;
                }
                Ok(())
            })
        } else {
            self.render_attributes(node, &bind, &deps)
        };

        self.refresh_dependencies(node, &deps);
        result
    }

    /// Render every target of an attribute binding. A failing target does
    /// not stop the others.
    fn render_attributes(&mut self, node: NodeId, bind: &str, deps: &[String]) -> Result<(), BindingError> {
        let targets: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(bind).map_err(|source| BindingError::MalformedBinding {
                element: self.dom.describe(node),
                source,
            })?;

        let mut first = None;
        for (target, expression) in targets {
            let expression = match expression {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            match self.evaluate(node, &expression, deps) {
                Ok(value) => self.apply_attribute(node, &target.to_ascii_lowercase(), &expression, value),
                Err(err) => {
                    first.get_or_insert(err);
                }
            }
        }
        first.map_or(Ok(()), Err)
    }

    fn apply_attribute(&mut self, node: NodeId, target: &str, expression: &str, value: Value) {
        if self.config.is_style_call(expression) {
            let mut style = self.dom.style(node);
            match value {
                Value::Object(properties) => {
                    for (name, value) in properties {
                        style.set_property(&name, &value.to_display_string());
                    }
                }
                other => style.set_css_text(&other.to_display_string()),
            }
            self.dom.set_style(node, &style);
            return;
        }

        if self.config.is_classes_call(expression) {
            let classes: Vec<String> = match value {
                Value::Object(map) => map
                    .into_iter()
                    .filter(|(_, on)| on.truthy())
                    .map(|(class, _)| class)
                    .collect(),
                Value::Array(items) => items.iter().map(Value::to_display_string).collect(),
                other => other
                    .to_display_string()
                    .split_whitespace()
                    .map(str::to_owned)
                    .collect(),
            };
            self.dom.set_classes(node, classes.iter().map(String::as_str));
            return;
        }

        let removes = matches!(
            &value,
            Value::Undefined | Value::Null | Value::Bool(false)
        ) || matches!(&value, Value::Str(s) if s.is_empty());

        if removes {
            if self.dom.attribute(node, target).is_some() {
                self.dom.remove_attribute(node, target);
            }
            match target {
                "value" => self.dom.set_value(node, ""),
                "checked" => self.dom.set_checked(node, false),
                _ => {}
            }
            return;
        }

        let text = value.to_display_string();
        if self.dom.attribute(node, target) != Some(text.as_str()) {
            self.dom.set_attribute(node, target, text.as_str());
        }
        match target {
            "value" => {
                if self.dom.value(node) != text {
                    self.dom.set_value(node, text);
                }
            }
            "checked" => self.dom.set_checked(node, true),
            _ => {}
        }
    }

    /// Evaluate `expression` against a snapshot of its dependencies.
    pub(super) fn evaluate(&mut self, node: NodeId, expression: &str, deps: &[String]) -> Result<Value, BindingError> {
        let scoped = scope::build(expression, deps, &self.store);
        let parsed = self
            .expressions
            .get_or_parse(node, &scoped.expression, expr::parse)
            .map_err(|source| BindingError::Expression {
                element: self.dom.describe(node),
                source,
            })?;
        expr::evaluate(&parsed, &scoped.scope).map_err(|source| BindingError::Expression {
            element: self.dom.describe(node),
            source,
        })
    }

    /// Write the serialized store value of each dependency back onto the
    /// element, so a remount can seed from it.
    fn refresh_dependencies(&mut self, node: NodeId, deps: &[String]) {
        for dep in deps {
            let Some(serialized) = self.store.lookup(dep).map(|data| data.serialize()) else {
                continue;
            };
            let name = format!("{DEPENDENCY_PREFIX}{dep}");
            if self.dom.attribute(node, &name) != Some(serialized.as_str()) {
                self.dom.set_attribute(node, &name, serialized);
            }
        }
    }
}
