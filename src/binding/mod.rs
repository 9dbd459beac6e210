//! The binding engine.
//!
//! A [`Binding`] owns a [`Dom`] and keeps one container subtree of it in
//! sync with a [`Store`]. Elements declare what they render through the
//! `bind` attribute and which store paths they read through `bind-<path>`
//! attributes; `<template>` loops materialize one item per entry of an
//! iterable store node.
//!
//! Changes flow in both directions:
//!
//! - [`Binding::set`] writes the store and re-renders every element indexed
//!   under the path, its indexed descendants and its ancestors.
//! - [`Binding::flush`] drains the DOM mutation log: added subtrees are
//!   indexed and rendered, removed ones are forgotten, and edited
//!   `bind-<path>` attributes are written back to the store.
//! - [`Binding::dispatch_input`] feeds native input edits back through the
//!   element's own bind expression.

mod cache;
mod deferred;
mod error;
mod index;
mod input;
mod looping;
mod observer;
mod render;
pub mod scope;

use std::collections::{BTreeSet, HashSet};
use std::future::Future;

use tracing::{debug_span, warn};

use crate::config::BindingConfig;
use crate::dom::{Dom, NodeId};
use crate::store::{make_data, path, Data, Store};

pub use error::BindingError;
pub use input::InputTarget;

use cache::ExpressionCache;
use deferred::Deferred;
use index::PathIndex;
use input::InputRegistry;

/// How a write propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetMode {
    /// Skip when the normalized value equals the stored one.
    #[default]
    Default,
    /// Propagate even when nothing changed.
    Force,
    /// Re-render the path only; no descent into descendants, no bubbling.
    Clear,
}

/// A live binding context over one container.
pub struct Binding {
    dom: Dom,
    container: NodeId,
    config: BindingConfig,
    store: Store,
    /// Bound elements by dependency path.
    elements: PathIndex,
    /// Loop templates by iterable path.
    loops: PathIndex,
    inputs: InputRegistry,
    deferred: Deferred,
    /// Parsed expressions, released with the elements using them.
    expressions: ExpressionCache,
    /// Paths whose propagation is on the current call stack.
    propagating: HashSet<String>,
    closed: bool,
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("container", &self.container)
            .field("elements", &self.elements.len())
            .field("loops", &self.loops.len())
            .field("expressions", &self.expressions.len())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Binding {
    /// Bind `container` and index everything already inside it.
    ///
    /// Records queued on the DOM before this call are discarded. Render
    /// failures of individual elements are logged; the context is still
    /// returned.
    pub fn new(mut dom: Dom, container: NodeId, config: BindingConfig) -> Result<Self, BindingError> {
        if !dom.contains(container) {
            return Err(BindingError::MissingContainer(format!("{container:?}")));
        }
        dom.take_records();
        let mut binding = Self {
            dom,
            container,
            config,
            store: Store::new(),
            elements: PathIndex::new(),
            loops: PathIndex::new(),
            inputs: InputRegistry::new(),
            deferred: Deferred::new(),
            expressions: ExpressionCache::new(),
            propagating: HashSet::new(),
            closed: false,
        };
        if let Err(err) = binding.integrate(vec![container], Default::default()) {
            warn!(error = %err, "initial render failed");
        }
        Ok(binding)
    }

    /// Bind the element with the given `id` attribute.
    pub fn attach(dom: Dom, id: &str, config: BindingConfig) -> Result<Self, BindingError> {
        let container = dom
            .query_by_id(id)
            .ok_or_else(|| BindingError::MissingContainer(id.to_owned()))?;
        Self::new(dom, container, config)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    /// Mutable DOM access. Structural and attribute edits are picked up by
    /// the next [`flush`](Self::flush).
    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether `node` is currently indexed as a bound element or loop.
    pub fn is_tracked(&self, node: NodeId) -> bool {
        self.elements.contains(node) || self.loops.contains(node)
    }

    /// Give the DOM back, closing the context.
    pub fn into_dom(mut self) -> Dom {
        self.close();
        std::mem::take(&mut self.dom)
    }

    // -----------------------------------------------------------------------
    // Store access
    // -----------------------------------------------------------------------

    /// Read the store. `None` reads the whole tree.
    ///
    /// Descending into a string is an error; an absent path is `Ok(None)`.
    pub fn get(&self, path: Option<&str>) -> Result<Option<Data>, BindingError> {
        match path {
            None => Ok(Some(self.store.root().clone())),
            Some(p) => Ok(self.store.get(p)?.cloned()),
        }
    }

    /// Write `value` at `path` and propagate if it changed.
    ///
    /// Returns whether anything was propagated.
    pub fn set(&mut self, path: &str, value: impl Into<serde_json::Value>) -> Result<bool, BindingError> {
        self.set_with_mode(path, Some(value.into()), SetMode::Default)
    }

    /// Re-propagate the current value at `path`.
    pub fn refresh(&mut self, path: &str) -> Result<bool, BindingError> {
        self.set_with_mode(path, None, SetMode::Force)
    }

    /// Write with an explicit mode. `None` keeps the stored value.
    pub fn set_with_mode(
        &mut self,
        path: &str,
        value: Option<serde_json::Value>,
        mode: SetMode,
    ) -> Result<bool, BindingError> {
        let data = value.as_ref().map(make_data);
        self.write(path, data, mode)
    }

    /// Write the output of `future` at `path` once it resolves.
    ///
    /// Nothing changes until a later [`tick`](Self::tick) or
    /// [`settle`](Self::settle) applies it. Overlapping writes to one path
    /// apply in the order they resolve.
    pub fn set_deferred<F>(&mut self, path: &str, future: F) -> Result<(), BindingError>
    where
        F: Future + Send + 'static,
        F::Output: Into<serde_json::Value> + Send,
    {
        if self.closed {
            return Err(BindingError::Closed);
        }
        self.deferred
            .spawn(path::normalize(path), SetMode::Default, future)
    }

    /// Deferred writes that have not resolved yet.
    pub fn pending_deferred(&self) -> usize {
        self.deferred.pending()
    }

    // -----------------------------------------------------------------------
    // Propagation
    // -----------------------------------------------------------------------

    pub(crate) fn write(&mut self, path: &str, data: Option<Data>, mode: SetMode) -> Result<bool, BindingError> {
        if self.closed {
            return Err(BindingError::Closed);
        }
        let path = path::normalize(path);
        let _span = debug_span!("set", path = %path, ?mode).entered();

        if self.propagating.contains(&path) {
            return Ok(false);
        }
        if mode == SetMode::Default {
            if let Some(data) = &data {
                let current = self.store.lookup(&path).map(Data::serialize);
                if current.as_deref() == Some(data.serialize().as_str()) {
                    return Ok(false);
                }
            }
        }
        if let Some(data) = data {
            self.store.insert(&path, data);
        }

        self.propagating.insert(path.clone());
        let result = self.propagate(&path, mode);
        self.propagating.remove(&path);
        result.map(|()| true)
    }

    /// Render everything that depends on `path`.
    fn propagate(&mut self, path: &str, mode: SetMode) -> Result<(), BindingError> {
        let mut first = None;

        for template in self.loops.nodes_at(path) {
            if let Err(err) = self.update_loop(template, path) {
                warn!(error = %err, "loop update failed");
                first.get_or_insert(err);
            }
        }
        for element in self.elements.nodes_at(path) {
            if let Err(err) = self.update_element(element) {
                warn!(error = %err, "render failed");
                first.get_or_insert(err);
            }
        }

        if mode != SetMode::Clear {
            let descendants: BTreeSet<String> = self
                .loops
                .descendants_of(path)
                .into_iter()
                .chain(self.elements.descendants_of(path))
                .collect();
            let ancestors = path::ancestors(path).into_iter().map(str::to_owned);
            // Nested writes log their own failures.
            for related in descendants.into_iter().chain(ancestors) {
                if let Err(err) = self.write(&related, None, SetMode::Clear) {
                    first.get_or_insert(err);
                }
            }
        }

        first.map_or(Ok(()), Err)
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Stop observing, forget every index and drop all stored data.
    ///
    /// Afterwards writes fail with [`BindingError::Closed`] and
    /// [`flush`](Self::flush)/[`tick`](Self::tick) do nothing. The DOM is
    /// left as rendered.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.elements.clear();
        self.loops.clear();
        self.inputs.clear();
        self.deferred.abort();
        self.expressions.clear();
        self.store.clear();
        self.dom.take_records();
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        self.deferred.abort();
    }
}
