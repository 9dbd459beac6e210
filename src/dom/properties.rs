//! Live element properties: form state, inline style, class list.

use crate::css::StyleDeclaration;

use super::node::NodeId;
use super::tree::Dom;

impl Dom {
    /// Current `value` property of an element (`""` if the node is missing).
    pub fn value(&self, id: NodeId) -> String {
        self.get(id).map(|d| d.current_value()).unwrap_or_default()
    }

    /// Write the `value` property. Not recorded as a mutation.
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) {
        if let Some(node) = self.get_mut(id) {
            node.value = Some(value.into());
        }
    }

    /// Current `checked` property.
    pub fn checked(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|d| d.is_checked())
    }

    /// Write the `checked` property.
    ///
    /// Checking a radio button unchecks every other radio with the same
    /// `name` in the same tree.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        let group = match self.get(id) {
            Some(d) if checked && d.tag == "input" && d.input_type() == "radio" => {
                d.attribute("name").map(str::to_owned)
            }
            Some(_) => None,
            None => return,
        };
        if let Some(name) = group {
            let root = self.tree_root(id);
            let others = self.find_all(root, |d| {
                d.tag == "input" && d.input_type() == "radio" && d.attribute("name") == Some(name.as_str())
            });
            for other in others.into_iter().filter(|&o| o != id) {
                if let Some(node) = self.get_mut(other) {
                    node.checked = Some(false);
                }
            }
        }
        if let Some(node) = self.get_mut(id) {
            node.checked = Some(checked);
        }
    }

    /// The parsed inline style of an element.
    pub fn style(&self, id: NodeId) -> StyleDeclaration {
        self.attribute(id, "style")
            .map(StyleDeclaration::parse)
            .unwrap_or_default()
    }

    /// A single inline style property, `""` when unset.
    pub fn style_property(&self, id: NodeId, name: &str) -> String {
        self.style(id).get_property_value(name).to_owned()
    }

    /// Write an inline style back to the `style` attribute.
    ///
    /// An empty declaration block removes the attribute.
    pub fn set_style(&mut self, id: NodeId, style: &StyleDeclaration) {
        if style.is_empty() {
            if self.attribute(id, "style").is_some() {
                self.remove_attribute(id, "style");
            }
            return;
        }
        let text = style.css_text();
        if self.attribute(id, "style") != Some(text.as_str()) {
            self.set_attribute(id, "style", text);
        }
    }

    /// Replace the class list. An empty list removes the attribute.
    pub fn set_classes<'a>(&mut self, id: NodeId, classes: impl IntoIterator<Item = &'a str>) {
        let mut unique: Vec<&str> = Vec::new();
        for class in classes.into_iter().filter(|c| !c.is_empty()) {
            if !unique.contains(&class) {
                unique.push(class);
            }
        }
        let joined = unique.join(" ");
        let current = self.attribute(id, "class");
        if joined.is_empty() {
            if current.is_some() {
                self.remove_attribute(id, "class");
            }
        } else if current != Some(joined.as_str()) {
            self.set_attribute(id, "class", joined);
        }
    }
}
