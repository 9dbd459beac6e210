//! Components: named units with an initialize/close lifecycle, run in
//! kind order by a [`Manager`].

pub mod manager;
pub mod view;

use std::any::Any;
use std::fmt;

use crate::binding::BindingError;

pub use manager::{InitReport, Manager};
pub use view::View;

// ---------------------------------------------------------------------------
// ComponentKind
// ---------------------------------------------------------------------------

/// Initialization tier. Services come up first, controllers last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentKind {
    Service,
    View,
    Controller,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Service => "Services",
            Self::View => "Views",
            Self::Controller => "Controllers",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// ComponentError
// ---------------------------------------------------------------------------

/// Errors raised by component lifecycle hooks.
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    /// The component's container element is not in its DOM.
    #[error("{component} cannot find its container")]
    MissingContainer { component: String },

    #[error("{component} failed: {message}")]
    Failed { component: String, message: String },

    #[error(transparent)]
    Binding(#[from] BindingError),
}

// ---------------------------------------------------------------------------
// Component trait
// ---------------------------------------------------------------------------

/// A managed component.
pub trait Component {
    fn name(&self) -> &str;

    fn kind(&self) -> ComponentKind;

    fn initialize(&mut self) -> Result<(), ComponentError>;

    fn close(&mut self) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Downcast to `&dyn Any` for runtime type inspection.
    fn as_any(&self) -> &dyn Any;

    /// Downcast to `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_order_services_first() {
        let mut kinds = vec![ComponentKind::Controller, ComponentKind::Service, ComponentKind::View];
        kinds.sort();
        assert_eq!(
            kinds,
            vec![ComponentKind::Service, ComponentKind::View, ComponentKind::Controller]
        );
        assert_eq!(ComponentKind::View.to_string(), "Views");
    }

    #[test]
    fn error_messages() {
        let err = ComponentError::MissingContainer {
            component: "Main".into(),
        };
        assert_eq!(err.to_string(), "Main cannot find its container");
        let err: ComponentError = BindingError::Closed.into();
        assert_eq!(err.to_string(), "binding is closed");
    }
}
