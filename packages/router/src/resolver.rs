//! Service resolution: turning configured names into live service instances.
//!
//! Resolution happens once, while the router is built, so a missing
//! collaborator fails fast as a [`SetupError`] before any exchange is
//! dispatched. The router never performs discovery during dispatch.

use std::sync::Arc;

use switchyard_core::QName;

use crate::registry::{ServiceRegistry, TargetService};

/// Configuration-class errors surfaced at router build time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    /// A route terminal, handler destination, or dead-letter target names a
    /// service nothing provides.
    #[error("no service registered for {0}")]
    MissingService(QName),

    /// Two routes consume from the same service name.
    #[error("duplicate route for {0}")]
    DuplicateRoute(QName),
}

/// Resolves a configured service name to a live instance.
pub trait Resolver: Send + Sync {
    /// Resolve `service` to an instance.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::MissingService`] when nothing provides the name.
    fn resolve(&self, service: &QName) -> Result<Arc<dyn TargetService>, SetupError>;
}

/// [`Resolver`] backed by a [`ServiceRegistry`].
pub struct RegistryResolver {
    registry: Arc<ServiceRegistry>,
}

impl RegistryResolver {
    #[must_use]
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }
}

impl Resolver for RegistryResolver {
    fn resolve(&self, service: &QName) -> Result<Arc<dyn TargetService>, SetupError> {
        self.registry
            .lookup(service)
            .ok_or_else(|| SetupError::MissingService(service.clone()))
    }
}
