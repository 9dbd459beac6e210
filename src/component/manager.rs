//! Component manager: ordered initialization with per-component isolation.

use tracing::{debug, error, info, warn};

use super::{Component, ComponentKind};

/// Outcome of [`Manager::initialize`] or [`Manager::close`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitReport {
    pub initialized: usize,
    pub failed: usize,
}

impl InitReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Owns components and drives their lifecycle in kind order.
#[derive(Default)]
pub struct Manager {
    components: Vec<Box<dyn Component>>,
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.components.iter().map(|c| (c.kind(), c.name().to_owned())))
            .finish()
    }
}

impl Manager {
    /// Take ownership of `components`, ordered Services, Views, Controllers.
    /// Order within a kind is preserved.
    pub fn new(components: Vec<Box<dyn Component>>) -> Self {
        let mut manager = Self { components };
        manager.components.sort_by_key(|c| c.kind());
        manager
    }

    /// Add a component, keeping kind order.
    pub fn add(&mut self, component: Box<dyn Component>) {
        let position = self
            .components
            .iter()
            .position(|c| c.kind() > component.kind())
            .unwrap_or(self.components.len());
        self.components.insert(position, component);
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Names in initialization order.
    pub fn names(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.name()).collect()
    }

    /// Initialize every component. A failure is logged and counted; the
    /// remaining components still run.
    pub fn initialize(&mut self) -> InitReport {
        info!("initialization started");
        let mut report = InitReport::default();
        let mut tier: Option<ComponentKind> = None;
        for component in &mut self.components {
            if tier != Some(component.kind()) {
                tier = Some(component.kind());
                debug!(kind = %component.kind(), "initializing tier");
            }
            match component.initialize() {
                Ok(()) => {
                    debug!(component = component.name(), "initialized");
                    report.initialized += 1;
                }
                Err(err) => {
                    error!(component = component.name(), error = %err, "initialization failed");
                    report.failed += 1;
                }
            }
        }
        if report.is_clean() {
            info!(count = report.initialized, "initialization completed");
        } else {
            warn!(failed = report.failed, "initialization completed with failures");
        }
        report
    }

    /// Close every component with the same isolation as
    /// [`initialize`](Self::initialize).
    pub fn close(&mut self) -> InitReport {
        let mut report = InitReport::default();
        for component in &mut self.components {
            match component.close() {
                Ok(()) => {
                    debug!(component = component.name(), "closed");
                    report.initialized += 1;
                }
                Err(err) => {
                    error!(component = component.name(), error = %err, "close failed");
                    report.failed += 1;
                }
            }
        }
        if !report.is_clean() {
            warn!(failed = report.failed, "stopped with failures");
        }
        report
    }

    /// Look a component up by name, ignoring case.
    pub fn component(&self, name: &str) -> Option<&dyn Component> {
        self.components
            .iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
            .map(|c| c.as_ref())
    }

    pub fn component_mut(&mut self, name: &str) -> Option<&mut (dyn Component + 'static)> {
        self.components
            .iter_mut()
            .find(|c| c.name().eq_ignore_ascii_case(name))
            .map(|c| c.as_mut())
    }

    /// Look a component up by name and downcast it.
    pub fn get<T: Component + 'static>(&self, name: &str) -> Option<&T> {
        self.component(name)?.as_any().downcast_ref::<T>()
    }

    pub fn get_mut<T: Component + 'static>(&mut self, name: &str) -> Option<&mut T> {
        self.component_mut(name)?.as_any_mut().downcast_mut::<T>()
    }
}
