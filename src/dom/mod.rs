//! DOM arena: slotmap-backed element tree with a mutation log, markup
//! parsing and live form properties.

pub mod node;
pub mod tree;
pub mod query;
pub mod mutation;
pub mod properties;
pub mod html;

pub use html::MarkupError;
pub use mutation::MutationRecord;
pub use node::{NodeData, NodeId, NodeKind};
pub use tree::Dom;

/// Errors produced by structural tree operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node does not exist")]
    MissingNode,

    #[error("a node cannot be inserted into itself or its own descendant")]
    HierarchyRequest,

    #[error("reference node is not a child of the parent")]
    NotAChild,
}
