//! # weft
//!
//! A reactive two-way data-binding engine over a retained DOM.
//!
//! weft binds declarative markup to a hierarchical data store. Elements
//! declare the store paths they depend on with `bind-<path>` attributes and
//! how to render with a `bind` expression; loop templates expand one copy of
//! their content per entry of a collection. Store writes re-render the
//! dependent elements, and DOM changes (added markup, edited dependency
//! attributes, user input) flow back into the store.
//!
//! ## Core Systems
//!
//! - **[`dom`]**: slotmap-backed DOM arena with a mutation log and markup parser
//! - **[`css`]**: inline style tokenizer and declaration blocks
//! - **[`expr`]**: logos-lexed expression language and tree-walking evaluator
//! - **[`store`]**: path-addressed data tree with string leaves
//! - **[`binding`]**: the binding context (rendering, loops, inputs, observer)
//! - **[`component`]**: named components with ordered lifecycle management
//! - **[`config`]**: markup conventions and input timing
//! - **[`testing`]**: headless fixture and snapshot helpers
//!
//! ## Example
//!
//! ```
//! use weft::binding::Binding;
//! use weft::config::BindingConfig;
//! use weft::dom::{Dom, NodeData};
//!
//! let mut dom = Dom::new();
//! let root = dom.insert(NodeData::element("div"));
//! dom.set_inner_html(root, r#"<data-text id="t" bind-user.name bind="'Hi ' + user.name"></data-text>"#)
//!     .unwrap();
//!
//! let mut binding = Binding::new(dom, root, BindingConfig::default()).unwrap();
//! binding.set("user", serde_json::json!({ "name": "Ada" })).unwrap();
//!
//! let t = binding.dom().query_by_id("t").unwrap();
//! assert_eq!(binding.dom().text_content(t), "Hi Ada");
//! ```

// Foundation
pub mod config;

// Core systems
pub mod css;
pub mod dom;
pub mod expr;
pub mod store;

// Binding engine
pub mod binding;

// Application
pub mod component;

// Test support
pub mod testing;

pub use binding::{Binding, BindingError, SetMode};
pub use config::BindingConfig;
