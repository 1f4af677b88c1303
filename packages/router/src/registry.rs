//! Target services and the name-keyed registry.
//!
//! A [`TargetService`] is the externally-supplied unit of work a route
//! terminates in: it consumes the routed message and answers with an
//! out-message, a fault, or silent one-way completion — or raises a
//! [`Failure`]. The registry is wired once at startup and read concurrently
//! afterwards.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use switchyard_core::{Failure, Message, QName};

// ---------------------------------------------------------------------------
// TargetService
// ---------------------------------------------------------------------------

/// What a target service produced for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceOutcome {
    /// A response payload (request/response interaction).
    Out(Message),
    /// A business-level fault, delivered successfully.
    Fault(Message),
    /// Silent one-way completion.
    Done,
}

/// An externally-supplied unit of work identified by a qualified name.
#[async_trait]
pub trait TargetService: Send + Sync {
    /// Process one inbound message.
    ///
    /// # Errors
    ///
    /// Returns a [`Failure`] when the invocation fails technically. A
    /// business-level negative result is not an error here; it is a
    /// [`ServiceOutcome::Fault`].
    async fn invoke(&self, input: &Message) -> Result<ServiceOutcome, Failure>;
}

// ---------------------------------------------------------------------------
// ServiceRegistry
// ---------------------------------------------------------------------------

/// Concurrent name → service table.
///
/// Registration happens during setup; dispatch only reads. Registering a
/// name twice replaces the earlier service.
#[derive(Default)]
pub struct ServiceRegistry {
    services: DashMap<QName, Arc<dyn TargetService>>,
}

impl ServiceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under the given name.
    pub fn register<S: TargetService + 'static>(&self, name: QName, service: S) {
        self.register_arc(name, Arc::new(service));
    }

    /// Register an already-shared service under the given name.
    pub fn register_arc(&self, name: QName, service: Arc<dyn TargetService>) {
        self.services.insert(name, service);
    }

    /// Look up a service by name.
    #[must_use]
    pub fn lookup(&self, name: &QName) -> Option<Arc<dyn TargetService>> {
        self.services.get(name).map(|entry| entry.value().clone())
    }

    /// True when a service is registered under the given name.
    #[must_use]
    pub fn contains(&self, name: &QName) -> bool {
        self.services.contains_key(name)
    }

    /// Number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
