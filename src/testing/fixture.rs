//! Fixture: a bound container over test markup.
//!
//! The `Fixture` parses markup into a fresh DOM under a `<div>` container,
//! binds it, and provides id-based helpers to simulate user input and read
//! rendered output. It derefs to the underlying [`Binding`], so every
//! binding operation is available directly.

use std::ops::{Deref, DerefMut};

use crate::binding::{Binding, BindingError};
use crate::config::BindingConfig;
use crate::dom::{Dom, NodeData, NodeId};

use super::snapshot::markup_to_string;

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// A headless binding driver for tests.
///
/// # Examples
///
/// ```
/// use weft::testing::Fixture;
///
/// let mut fx = Fixture::new(r#"<data-text id="t" bind-name bind="name"></data-text>"#);
/// fx.set("name", "Ada").unwrap();
/// assert_eq!(fx.text("t"), "Ada");
/// ```
#[derive(Debug)]
pub struct Fixture {
    binding: Binding,
}

impl Fixture {
    /// Bind `markup` with the default config.
    ///
    /// # Panics
    ///
    /// Panics if the markup cannot be parsed.
    pub fn new(markup: &str) -> Self {
        Self::with_config(markup, BindingConfig::default())
    }

    /// Bind `markup` with a custom config.
    ///
    /// # Panics
    ///
    /// Panics if the markup cannot be parsed.
    pub fn with_config(markup: &str, config: BindingConfig) -> Self {
        match Self::try_new(markup, config) {
            Ok(fixture) => fixture,
            Err(err) => panic!("fixture markup rejected: {err}"),
        }
    }

    /// Bind `markup`, returning parse failures instead of panicking.
    pub fn try_new(markup: &str, config: BindingConfig) -> Result<Self, BindingError> {
        let mut dom = Dom::new();
        let container = dom.insert(NodeData::element("div"));
        dom.set_inner_html(container, markup)?;
        Ok(Self {
            binding: Binding::new(dom, container, config)?,
        })
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn into_binding(self) -> Binding {
        self.binding
    }

    // ── Lookup ───────────────────────────────────────────────────────

    /// The node whose `id` attribute is `id`.
    ///
    /// # Panics
    ///
    /// Panics if there is no such node.
    /// Nodes inside the container win over detached ones.
    pub fn element(&self, id: &str) -> NodeId {
        let dom = self.binding.dom();
        match dom
            .find_by_id(self.binding.container(), id)
            .or_else(|| dom.query_by_id(id))
        {
            Some(node) => node,
            None => panic!("no element with id {id:?}"),
        }
    }

    /// Number of elements below the container whose attribute `name`
    /// equals `value`.
    pub fn count_attr(&self, name: &str, value: &str) -> usize {
        let dom = self.binding.dom();
        dom.find_by_attribute(self.binding.container(), name)
            .into_iter()
            .filter(|&node| dom.attribute(node, name) == Some(value))
            .count()
    }

    /// Whether a node with `id` is currently inside the container.
    pub fn exists(&self, id: &str) -> bool {
        let dom = self.binding.dom();
        dom.find_by_id(self.binding.container(), id).is_some()
    }

    /// Text content of the element `id`.
    pub fn text(&self, id: &str) -> String {
        self.binding.dom().text_content(self.element(id))
    }

    /// Inner markup of the element `id`.
    pub fn html(&self, id: &str) -> String {
        self.binding.dom().inner_html(self.element(id))
    }

    /// Attribute `name` of the element `id`.
    pub fn attr(&self, id: &str, name: &str) -> Option<String> {
        self.binding
            .dom()
            .attribute(self.element(id), name)
            .map(str::to_owned)
    }

    /// Live `value` property of the element `id`.
    pub fn value(&self, id: &str) -> String {
        self.binding.dom().value(self.element(id))
    }

    /// Live `checked` property of the element `id`.
    pub fn checked(&self, id: &str) -> bool {
        self.binding.dom().checked(self.element(id))
    }

    /// Number of elements with `tag` below the container.
    pub fn count_tag(&self, tag: &str) -> usize {
        let container = self.binding.container();
        self.binding
            .dom()
            .find_by_tag(container, tag)
            .into_iter()
            .filter(|&node| node != container)
            .count()
    }

    /// Compact markup of the whole container.
    pub fn markup(&self) -> String {
        markup_to_string(self.binding.dom(), self.binding.container())
    }

    // ── Input simulation ─────────────────────────────────────────────

    /// Overwrite the `value` of `id` and fire an `input` event on it.
    pub fn type_into(&mut self, id: &str, value: &str) -> bool {
        let node = self.element(id);
        self.binding.dom_mut().set_value(node, value);
        self.binding.dispatch_input(node)
    }

    /// Check or uncheck `id` and fire an `input` event on it.
    pub fn set_checked(&mut self, id: &str, checked: bool) -> bool {
        let node = self.element(id);
        self.binding.dom_mut().set_checked(node, checked);
        self.binding.dispatch_input(node)
    }

    // ── Markup edits ─────────────────────────────────────────────────

    /// Replace the container's children with `markup`, then flush.
    pub fn remount(&mut self, markup: &str) -> Result<(), BindingError> {
        let container = self.binding.container();
        self.binding.dom_mut().set_inner_html(container, markup)?;
        self.binding.flush()
    }

    /// Append `markup` to the container, then flush.
    pub fn append(&mut self, markup: &str) -> Result<(), BindingError> {
        let container = self.binding.container();
        self.binding.dom_mut().append_html(container, markup)?;
        self.binding.flush()
    }

    /// Set attribute `name` on `id`, then flush.
    pub fn edit_attr(&mut self, id: &str, name: &str, value: &str) -> Result<(), BindingError> {
        let node = self.element(id);
        self.binding.dom_mut().set_attribute(node, name, value);
        self.binding.flush()
    }

    /// Remove the element `id` from the tree, then flush.
    pub fn remove(&mut self, id: &str) -> Result<(), BindingError> {
        let node = self.element(id);
        self.binding.dom_mut().detach(node);
        self.binding.flush()
    }
}

impl Deref for Fixture {
    type Target = Binding;

    fn deref(&self) -> &Binding {
        &self.binding
    }
}

impl DerefMut for Fixture {
    fn deref_mut(&mut self) -> &mut Binding {
        &mut self.binding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Data;

    #[test]
    fn new_binds_the_container() {
        let mut fx = Fixture::new(r#"<data-text id="t" bind-a bind="a"></data-text>"#);
        assert!(fx.is_tracked(fx.element("t")));
        fx.set("a", "x").unwrap();
        assert_eq!(fx.text("t"), "x");
        assert_eq!(fx.attr("t", "bind-a").as_deref(), Some("x"));
    }

    #[test]
    fn remount_replaces_content() {
        let mut fx = Fixture::new(r#"<p id="old"></p>"#);
        fx.remount(r#"<data-text id="new" bind-a="seed" bind="a"></data-text>"#)
            .unwrap();
        assert!(!fx.exists("old"));
        assert_eq!(fx.text("new"), "seed");
        assert_eq!(fx.markup(), r#"<data-text id="new" bind-a="seed" bind="a">seed</data-text>"#);
    }

    #[test]
    fn typing_syncs_on_tick() {
        let mut fx = Fixture::new(r#"<input id="i" bind-q bind='{"value": "q"}'>"#);
        assert!(fx.type_into("i", "hello"));
        fx.tick().unwrap();
        assert_eq!(fx.get(Some("q")).unwrap(), Some(Data::text("hello")));
    }

    #[test]
    fn count_tag_scopes_to_container() {
        let fx = Fixture::new("<li></li><li></li><ul><li></li></ul>");
        assert_eq!(fx.count_tag("li"), 3);
        assert_eq!(fx.count_tag("ol"), 0);
        assert_eq!(fx.count_tag("div"), 0);
    }

    #[test]
    #[should_panic(expected = "no element with id")]
    fn missing_element_panics() {
        let fx = Fixture::new("");
        fx.element("nope");
    }

    #[test]
    fn try_new_reports_markup_errors() {
        let err = Fixture::try_new("<!-- open", BindingConfig::default()).unwrap_err();
        assert!(matches!(err, BindingError::Markup(_)));
    }
}
