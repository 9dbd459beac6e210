//! Input synchronization: native form edits written back to the store.
//!
//! An input bound through `{"value": expr}` or `{"checked": expr}` is
//! inverted textually: the live value is substituted for each dependency
//! in turn, and only dependencies whose substitution changes the
//! expression are written. `input` events are debounced; a new event
//! restarts the delay.

use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use tokio::time::Instant;
use tracing::{debug_span, trace};

use crate::dom::NodeId;
use crate::store::{make_data, Data};

use super::error::BindingError;
use super::{scope, Binding, SetMode};

/// Which live property an input binding reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTarget {
    Value,
    Checked,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct InputBinding {
    pub target: InputTarget,
    pub expression: String,
}

/// Bound inputs, their event sources and pending syncs.
#[derive(Debug, Default)]
pub(crate) struct InputRegistry {
    bound: IndexMap<NodeId, InputBinding>,
    /// Event source -> bound inputs to sync when it fires.
    listeners: HashMap<NodeId, IndexSet<NodeId>>,
    pending: IndexSet<NodeId>,
    deadline: Option<Instant>,
}

impl InputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, input: NodeId, binding: InputBinding, sources: impl IntoIterator<Item = NodeId>) {
        self.bound.insert(input, binding);
        for source in sources {
            self.listeners.entry(source).or_default().insert(input);
        }
    }

    pub fn contains(&self, input: NodeId) -> bool {
        self.bound.contains_key(&input)
    }

    pub fn binding(&self, input: NodeId) -> Option<&InputBinding> {
        self.bound.get(&input)
    }

    /// Forget `node` both as a bound input and as an event source.
    pub fn remove(&mut self, node: NodeId) {
        self.bound.shift_remove(&node);
        self.pending.shift_remove(&node);
        self.listeners.remove(&node);
        self.listeners.retain(|_, inputs| {
            inputs.shift_remove(&node);
            !inputs.is_empty()
        });
    }

    /// Drop bound inputs and event sources for which `keep` is false.
    pub fn prune(&mut self, keep: impl Fn(NodeId) -> bool) {
        self.bound.retain(|&node, _| keep(node));
        self.pending.retain(|&node| keep(node));
        let bound = &self.bound;
        self.listeners.retain(|&source, inputs| {
            inputs.retain(|input| bound.contains_key(input));
            keep(source) && !inputs.is_empty()
        });
    }

    /// Queue the inputs listening on `source`. Returns whether any were.
    pub fn schedule(&mut self, source: NodeId, deadline: Instant) -> bool {
        let Some(inputs) = self.listeners.get(&source) else {
            return false;
        };
        self.pending.extend(inputs.iter().copied());
        self.deadline = Some(deadline);
        true
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Take the queued inputs if the debounce delay has passed.
    pub fn take_due(&mut self, now: Instant) -> Vec<NodeId> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                self.pending.drain(..).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.bound.clear();
        self.listeners.clear();
        self.pending.clear();
        self.deadline = None;
    }
}

impl Binding {
    /// Register `node` if its `bind` object targets `value` or `checked`.
    pub(super) fn register_input(&mut self, node: NodeId) {
        let Some(data) = self.dom.get(node) else {
            return;
        };
        if !matches!(data.tag.as_str(), "input" | "textarea" | "select") {
            return;
        }
        let Some(targets) = data
            .attribute("bind")
            .and_then(|bind| serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(bind).ok())
        else {
            return;
        };
        let lookup = |name: &str| {
            targets
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .and_then(|(_, v)| v.as_str())
                .map(str::to_owned)
        };
        let checkable = data.is_checkable();
        let binding = match (lookup("checked"), lookup("value")) {
            (Some(expression), _) if checkable => InputBinding {
                target: InputTarget::Checked,
                expression,
            },
            (_, Some(expression)) => InputBinding {
                target: InputTarget::Value,
                expression,
            },
            (Some(expression), None) => InputBinding {
                target: InputTarget::Checked,
                expression,
            },
            (None, None) => return,
        };

        let group = (data.input_type() == "radio")
            .then(|| data.attribute("name").map(str::to_owned))
            .flatten();
        let sources = match group {
            Some(name) => self.dom.find_all(self.container, |d| {
                d.tag == "input" && d.input_type() == "radio" && d.attribute("name") == Some(name.as_str())
            }),
            None => vec![node],
        };
        trace!(element = %self.dom.describe(node), target = ?binding.target, "input registered");
        self.inputs.register(node, binding, sources);
    }

    /// Store writes implied by the current live state of `input`.
    pub(super) fn input_writes(&self, input: NodeId) -> Vec<(String, Data)> {
        let Some(binding) = self.inputs.binding(input) else {
            return Vec::new();
        };
        let (literal, data) = match binding.target {
            InputTarget::Checked => {
                let checked = self.dom.checked(input);
                (checked.to_string(), make_data(&serde_json::Value::Bool(checked)))
            }
            InputTarget::Value => {
                let value = self.dom.value(input);
                let literal = serde_json::Value::String(value.clone()).to_string();
                (literal, Data::Text(value))
            }
        };
        self.dependencies(input)
            .into_iter()
            .filter(|dep| scope::replace_identifier(&binding.expression, dep, &literal) != binding.expression)
            .map(|dep| (dep, data.clone()))
            .collect()
    }

    /// Native `input` event on `node`. Schedules a debounced sync of every
    /// bound input listening on it and returns whether there was one.
    pub fn dispatch_input(&mut self, node: NodeId) -> bool {
        if self.closed {
            return false;
        }
        let deadline = Instant::now() + self.config.input_debounce;
        self.inputs.schedule(node, deadline)
    }

    /// Apply resolved deferred writes, run due input syncs, then flush.
    pub fn tick(&mut self) -> Result<(), BindingError> {
        if self.closed {
            return Ok(());
        }
        let _span = debug_span!("tick").entered();
        let mut first = None;

        for resolved in self.deferred.drain() {
            if let Err(err) = self.set_with_mode(&resolved.path, Some(resolved.value), resolved.mode) {
                first.get_or_insert(err);
            }
        }

        for input in self.inputs.take_due(Instant::now()) {
            if !self.is_connected(input) {
                continue;
            }
            for (dep, data) in self.input_writes(input) {
                if let Err(err) = self.write(&dep, Some(data), SetMode::Default) {
                    first.get_or_insert(err);
                }
            }
        }

        if let Err(err) = self.flush() {
            first.get_or_insert(err);
        }
        first.map_or(Ok(()), Err)
    }

    /// Wait for pending debounce deadlines and deferred writes, then tick.
    pub async fn settle(&mut self) -> Result<(), BindingError> {
        if let Some(deadline) = self.inputs.deadline() {
            tokio::time::sleep_until(deadline).await;
        }
        self.deferred.wait().await;
        tokio::task::yield_now().await;
        self.tick()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BindingConfig;
    use crate::dom::{Dom, NodeData};
    use std::time::Duration;

    fn mount(markup: &str, config: BindingConfig) -> Binding {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::element("div"));
        dom.set_inner_html(root, markup).unwrap();
        Binding::new(dom, root, config).unwrap()
    }

    fn node(binding: &Binding, id: &str) -> NodeId {
        binding.dom().query_by_id(id).unwrap()
    }

    #[test]
    fn registry_schedule_and_take() {
        let mut dom = Dom::new();
        let a = dom.create(NodeData::element("input"));
        let b = dom.create(NodeData::element("input"));
        let mut registry = InputRegistry::new();
        let binding = InputBinding {
            target: InputTarget::Value,
            expression: "x".into(),
        };
        registry.register(a, binding, [a, b]);

        let now = Instant::now();
        assert!(registry.schedule(b, now));
        assert!(!registry.schedule(NodeId::default(), now));
        assert_eq!(registry.take_due(now), vec![a]);
        assert!(registry.take_due(now).is_empty());

        registry.remove(a);
        assert!(!registry.contains(a));
        assert!(!registry.schedule(b, now));
    }

    #[test]
    fn writes_follow_textual_substitution() {
        let mut binding = mount(
            r#"<input id="i" bind-a bind-b bind='{"value": "a + b.length"}'>"#,
            BindingConfig::default(),
        );
        let i = node(&binding, "i");
        binding.dom_mut().set_value(i, "typed");
        let writes = binding.input_writes(i);
        assert_eq!(writes, vec![("a".to_string(), Data::text("typed")), ("b".to_string(), Data::text("typed"))]);

        let mut binding = mount(
            r#"<input id="c" type="checkbox" bind-flag bind-other bind='{"checked": "!!flag"}'>"#,
            BindingConfig::default(),
        );
        let c = node(&binding, "c");
        binding.dom_mut().set_checked(c, true);
        assert_eq!(binding.input_writes(c), vec![("flag".to_string(), Data::text("true"))]);
    }

    #[test]
    fn checkbox_input_updates_the_store() {
        let mut binding = mount(
            r#"<input id="c" type="checkbox" bind-flag bind='{"checked": "!!flag"}'>"#,
            BindingConfig::default(),
        );
        let c = node(&binding, "c");
        binding.dom_mut().set_checked(c, true);
        assert!(binding.dispatch_input(c));
        binding.tick().unwrap();
        assert_eq!(binding.get(Some("flag")).unwrap(), Some(Data::text("true")));
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_collapses_rapid_edits() {
        let config = BindingConfig::default().with_input_debounce(Duration::from_millis(50));
        let mut binding = mount(
            r#"<input id="i" bind-q bind='{"value": "q"}'><data-text id="t" bind-q bind="q"></data-text>"#,
            config,
        );
        let i = node(&binding, "i");
        binding.dom_mut().set_value(i, "h");
        binding.dispatch_input(i);
        binding.tick().unwrap();
        assert_eq!(binding.get(Some("q")).unwrap(), Some(Data::text("")));

        binding.dom_mut().set_value(i, "hello");
        binding.dispatch_input(i);
        binding.settle().await.unwrap();
        assert_eq!(binding.get(Some("q")).unwrap(), Some(Data::text("hello")));
        let t = node(&binding, "t");
        assert_eq!(binding.dom().text_content(t), "hello");
    }
}
