//! Binding error type.

use crate::dom::{DomError, MarkupError};
use crate::expr::ExprError;
use crate::store::StoreError;

/// Errors surfaced by a [`Binding`](super::Binding).
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    /// The `bind` attribute of an attribute-bound element is not a JSON object.
    #[error("Malformed JSON bind expression on {element}: {source}")]
    MalformedBinding {
        element: String,
        #[source]
        source: serde_json::Error,
    },

    /// A loop entry key cannot be spliced into attribute names.
    #[error("{0} is an unacceptable binding key!")]
    UnacceptableKey(String),

    #[error("failed to evaluate bind expression on {element}: {source}")]
    Expression {
        element: String,
        #[source]
        source: ExprError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error("binding is closed")]
    Closed,

    #[error("container {0} does not exist")]
    MissingContainer(String),

    #[error("deferred writes need a running tokio runtime")]
    NoRuntime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            BindingError::UnacceptableKey("a b".into()).to_string(),
            "a b is an unacceptable binding key!"
        );
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = BindingError::MalformedBinding {
            element: "<div>".into(),
            source,
        };
        assert!(err.to_string().starts_with("Malformed JSON bind expression on <div>"));
    }
}
