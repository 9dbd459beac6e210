//! Binding configuration: the markup conventions a [`Binding`](crate::binding::Binding)
//! recognizes and the input debounce delay.

use std::time::Duration;

// ---------------------------------------------------------------------------
// BindingConfig
// ---------------------------------------------------------------------------

/// Markup conventions and timing for a binding context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingConfig {
    /// Tag whose bound expression renders as text content.
    pub text_tag: String,
    /// Tag whose bound expression renders as parsed markup.
    pub html_tag: String,
    /// Attribute marking a `<template>` as a loop.
    pub loop_marker: String,
    /// Attribute tagging a materialized loop item with its `path.key`.
    pub item_marker: String,
    /// Call prefix recognized as the inline-style marker.
    pub style_marker: String,
    /// Call prefix recognized as the class-list marker.
    pub classes_marker: String,
    /// Delay between the last `input` event and the store write.
    pub input_debounce: Duration,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            text_tag: "data-text".into(),
            html_tag: "data-html".into(),
            loop_marker: "each".into(),
            item_marker: "one".into(),
            style_marker: "pug.style".into(),
            classes_marker: "pug.classes".into(),
            input_debounce: Duration::ZERO,
        }
    }
}

impl BindingConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the text binding tag (builder).
    pub fn with_text_tag(mut self, tag: impl Into<String>) -> Self {
        self.text_tag = tag.into().to_ascii_lowercase();
        self
    }

    /// Set the markup binding tag (builder).
    pub fn with_html_tag(mut self, tag: impl Into<String>) -> Self {
        self.html_tag = tag.into().to_ascii_lowercase();
        self
    }

    /// Set the loop marker attribute (builder).
    pub fn with_loop_marker(mut self, name: impl Into<String>) -> Self {
        self.loop_marker = name.into().to_ascii_lowercase();
        self
    }

    /// Set the loop item marker attribute (builder).
    pub fn with_item_marker(mut self, name: impl Into<String>) -> Self {
        self.item_marker = name.into().to_ascii_lowercase();
        self
    }

    /// Set the style marker call prefix (builder).
    pub fn with_style_marker(mut self, marker: impl Into<String>) -> Self {
        self.style_marker = marker.into();
        self
    }

    /// Set the class-list marker call prefix (builder).
    pub fn with_classes_marker(mut self, marker: impl Into<String>) -> Self {
        self.classes_marker = marker.into();
        self
    }

    /// Set the input debounce delay (builder).
    pub fn with_input_debounce(mut self, delay: Duration) -> Self {
        self.input_debounce = delay;
        self
    }

    /// Whether `expression` is wrapped in the style marker.
    pub(crate) fn is_style_call(&self, expression: &str) -> bool {
        is_call_of(expression, &self.style_marker)
    }

    /// Whether `expression` is wrapped in the class-list marker.
    pub(crate) fn is_classes_call(&self, expression: &str) -> bool {
        is_call_of(expression, &self.classes_marker)
    }
}

fn is_call_of(expression: &str, marker: &str) -> bool {
    expression
        .trim_start()
        .strip_prefix(marker)
        .is_some_and(|rest| rest.trim_start().starts_with('('))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_config_defaults() {
        let config = BindingConfig::default();
        assert_eq!(config.text_tag, "data-text");
        assert_eq!(config.html_tag, "data-html");
        assert_eq!(config.loop_marker, "each");
        assert_eq!(config.item_marker, "one");
        assert_eq!(config.input_debounce, Duration::ZERO);
    }

    #[test]
    fn binding_config_builder() {
        let config = BindingConfig::new()
            .with_text_tag("X-Text")
            .with_item_marker("item")
            .with_input_debounce(Duration::from_millis(50));
        assert_eq!(config.text_tag, "x-text");
        assert_eq!(config.item_marker, "item");
        assert_eq!(config.input_debounce, Duration::from_millis(50));
        assert_eq!(config.html_tag, "data-html");
    }

    #[test]
    fn marker_calls_are_prefix_matched() {
        let config = BindingConfig::default();
        assert!(config.is_style_call("pug.style({color: c})"));
        assert!(config.is_style_call(" pug.style ('a')"));
        assert!(!config.is_style_call("pug.styles(x)"));
        assert!(!config.is_style_call("x + pug.style(y)"));
        assert!(config.is_classes_call("pug.classes(['a'])"));
    }
}
