//! View: a component that renders markup into a fresh DOM and binds it.

use std::any::Any;

use tracing::debug;

use crate::binding::{Binding, BindingError};
use crate::config::BindingConfig;
use crate::dom::{Dom, NodeData};

use super::{Component, ComponentError, ComponentKind};

/// A bound view over its own markup.
///
/// The markup is parsed under a `<body>` element on
/// [`initialize`](Component::initialize); the element whose `id` equals the
/// container id becomes the binding container.
#[derive(Debug)]
pub struct View {
    name: String,
    markup: String,
    container: String,
    config: BindingConfig,
    binding: Option<Binding>,
}

impl View {
    pub fn new(name: impl Into<String>, markup: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            markup: markup.into(),
            container: container.into(),
            config: BindingConfig::default(),
            binding: None,
        }
    }

    /// Set the binding config (builder).
    pub fn with_config(mut self, config: BindingConfig) -> Self {
        self.config = config;
        self
    }

    /// The live binding, once initialized.
    pub fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    pub fn binding_mut(&mut self) -> Option<&mut Binding> {
        self.binding.as_mut()
    }
}

impl Component for View {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::View
    }

    fn initialize(&mut self) -> Result<(), ComponentError> {
        let mut dom = Dom::new();
        let body = dom.insert(NodeData::element("body"));
        dom.set_inner_html(body, &self.markup).map_err(BindingError::from)?;
        let binding = Binding::attach(dom, &self.container, self.config.clone()).map_err(|err| match err {
            BindingError::MissingContainer(_) => ComponentError::MissingContainer {
                component: self.name.clone(),
            },
            other => ComponentError::Binding(other),
        })?;
        debug!(view = %self.name, container = %self.container, "view bound");
        self.binding = Some(binding);
        Ok(())
    }

    fn close(&mut self) -> Result<(), ComponentError> {
        if let Some(binding) = &mut self.binding {
            binding.close();
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Manager;
    use crate::store::Data;

    const MARKUP: &str = r#"<main id="app"><data-text id="greeting" bind-name bind="'Hello, ' + name"></data-text></main>"#;

    #[test]
    fn initialize_binds_the_container() {
        let mut view = View::new("Main", MARKUP, "app");
        assert!(view.binding().is_none());
        view.initialize().unwrap();

        let binding = view.binding_mut().unwrap();
        binding.set("name", "Ada").unwrap();
        let greeting = binding.dom().query_by_id("greeting").unwrap();
        assert_eq!(binding.dom().text_content(greeting), "Hello, Ada");

        view.close().unwrap();
        assert!(view.binding().unwrap().is_closed());
    }

    #[test]
    fn missing_container_names_the_view() {
        let mut view = View::new("Broken", MARKUP, "nowhere");
        let err = view.initialize().unwrap_err();
        assert!(matches!(err, ComponentError::MissingContainer { ref component } if component == "Broken"));
    }

    #[test]
    fn views_run_under_the_manager() {
        let mut manager = Manager::new(vec![
            Box::new(View::new("Main", MARKUP, "app")),
            Box::new(View::new("Broken", MARKUP, "nowhere")),
        ]);
        let report = manager.initialize();
        assert_eq!(report.initialized, 1);
        assert_eq!(report.failed, 1);

        let main = manager.get_mut::<View>("main").unwrap();
        let binding = main.binding_mut().unwrap();
        binding.set("name", "Grace").unwrap();
        assert_eq!(binding.get(Some("name")).unwrap(), Some(Data::text("Grace")));
    }
}
