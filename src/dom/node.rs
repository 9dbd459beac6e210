//! Node types: NodeId, NodeKind, NodeData.

use indexmap::IndexMap;
use slotmap::new_key_type;

new_key_type! {
    /// Unique identifier for a DOM node. Copy, lightweight (u64).
    pub struct NodeId;
}

/// What kind of node a [`NodeData`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with a tag name and attributes.
    Element,
    /// A text node.
    Text,
    /// A document fragment (template content, parsed markup before insertion).
    Fragment,
}

/// Data associated with a single DOM node.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Node kind.
    pub kind: NodeKind,
    /// Lowercase tag name for elements, `#text` / `#fragment` otherwise.
    pub tag: String,
    /// Attributes in insertion order. Names are lowercase.
    pub attributes: IndexMap<String, String>,
    /// Character data of a text node.
    pub text: String,
    /// Live `value` property. `None` until written, then it no longer
    /// reflects the `value` attribute.
    pub value: Option<String>,
    /// Live `checked` property. `None` until written.
    pub checked: Option<bool>,
    /// Content fragment of a `<template>` element.
    pub content: Option<NodeId>,
}

impl NodeData {
    /// Create element data with the given tag name.
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Element,
            tag: tag.into().to_ascii_lowercase(),
            attributes: IndexMap::new(),
            text: String::new(),
            value: None,
            checked: None,
            content: None,
        }
    }

    /// Create a text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Text,
            tag: "#text".into(),
            text: text.into(),
            ..Self::element("")
        }
    }

    /// Create a document fragment.
    pub fn fragment() -> Self {
        Self {
            kind: NodeKind::Fragment,
            tag: "#fragment".into(),
            ..Self::element("")
        }
    }

    /// Set an attribute (builder).
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Set the `id` attribute (builder).
    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with_attribute("id", id)
    }

    /// Add a single CSS class (builder).
    pub fn with_class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    /// Whether this is a `<template>` element.
    pub fn is_template(&self) -> bool {
        self.is_element() && self.tag == "template"
    }

    /// Look up an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// The `id` attribute, if any.
    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// The `type` attribute of an input, lowercased. Defaults to `text`.
    pub fn input_type(&self) -> String {
        self.attribute("type")
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "text".into())
    }

    /// Whether this is a checkbox or radio input.
    pub fn is_checkable(&self) -> bool {
        self.tag == "input" && matches!(self.input_type().as_str(), "checkbox" | "radio")
    }

    /// Current value of the live `value` property.
    pub fn current_value(&self) -> String {
        match &self.value {
            Some(value) => value.clone(),
            None => self.attribute("value").unwrap_or_default().to_owned(),
        }
    }

    /// Current state of the live `checked` property.
    pub fn is_checked(&self) -> bool {
        self.checked.unwrap_or_else(|| self.has_attribute("checked"))
    }

    /// CSS classes from the `class` attribute.
    pub fn classes(&self) -> Vec<&str> {
        self.attribute("class")
            .map(|c| c.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    /// Check whether this node has a given CSS class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().contains(&class)
    }

    /// Add a CSS class. No-op if already present.
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let mut classes: Vec<String> = self.classes().into_iter().map(str::to_owned).collect();
        classes.push(class.to_owned());
        self.attributes.insert("class".into(), classes.join(" "));
    }

    /// Remove a CSS class. No-op if not present.
    pub fn remove_class(&mut self, class: &str) {
        if !self.has_class(class) {
            return;
        }
        let classes: Vec<&str> = self.classes().into_iter().filter(|c| *c != class).collect();
        let joined = classes.join(" ");
        self.attributes.insert("class".into(), joined);
    }

    /// Toggle a CSS class: add if absent, remove if present.
    pub fn toggle_class(&mut self, class: &str) {
        if self.has_class(class) {
            self.remove_class(class);
        } else {
            self.add_class(class);
        }
    }
}
