//! Route model: composable steps, failure handlers, and the builder DSL.
//!
//! A route consumes exchanges addressed to its `from` service, folds the
//! inbound message through its steps, and terminates in a target-service
//! invocation. Failure handling is configured per route: an ordered list of
//! [`HandlerEntry`] values, an optional [`RedeliveryPolicy`], and an optional
//! dead-letter sink.

use std::sync::Arc;

use async_trait::async_trait;

use switchyard_core::{Failure, FailureKind, Message, QName};

use crate::deadletter::DeadLetterSink;
use crate::retry::RedeliveryPolicy;

// ---------------------------------------------------------------------------
// RouteStep
// ---------------------------------------------------------------------------

/// One composable stage of a route body.
///
/// Steps take the current message and produce the next one, or raise a
/// [`Failure`]. They run before the terminal target-service invocation and
/// are re-run from the beginning on every redelivery.
#[async_trait]
pub trait RouteStep: Send + Sync {
    /// Process the current message into the next one.
    ///
    /// # Errors
    ///
    /// Returns a [`Failure`] to abort this attempt of the route body.
    async fn process(&self, message: Message) -> Result<Message, Failure>;
}

/// Adapter turning a synchronous closure into a [`RouteStep`].
pub struct FnStep<F>(F);

impl<F> FnStep<F>
where
    F: Fn(Message) -> Result<Message, Failure> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> RouteStep for FnStep<F>
where
    F: Fn(Message) -> Result<Message, Failure> + Send + Sync,
{
    async fn process(&self, message: Message) -> Result<Message, Failure> {
        (self.0)(message)
    }
}

// ---------------------------------------------------------------------------
// HandlerEntry
// ---------------------------------------------------------------------------

/// One registered failure handler: a kind to match, a handled flag, and an
/// optional onward destination.
///
/// `handled = true` suppresses the failure: the exchange concludes `Done`
/// with no error attached. `handled = false` (the default) propagates the
/// failure as a terminal `Error` status. Either way, a configured destination
/// receives the exchange's in-message exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerEntry {
    kind: FailureKind,
    handled: bool,
    destination: Option<QName>,
}

impl HandlerEntry {
    /// Handler for failures of `kind` (and its descendants), unhandled and
    /// with no destination until configured otherwise.
    #[must_use]
    pub fn for_kind(kind: FailureKind) -> Self {
        Self {
            kind,
            handled: false,
            destination: None,
        }
    }

    /// Set the handled flag.
    #[must_use]
    pub fn handled(mut self, handled: bool) -> Self {
        self.handled = handled;
        self
    }

    /// Forward matched exchanges' in-messages to `destination`.
    #[must_use]
    pub fn forward_to(mut self, destination: QName) -> Self {
        self.destination = Some(destination);
        self
    }

    #[must_use]
    pub fn kind(&self) -> &FailureKind {
        &self.kind
    }

    #[must_use]
    pub fn is_handled(&self) -> bool {
        self.handled
    }

    #[must_use]
    pub fn destination(&self) -> Option<&QName> {
        self.destination.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

/// A configured route: steps, terminal target, and failure-handling policy.
pub struct Route {
    from: QName,
    to: QName,
    steps: Vec<Arc<dyn RouteStep>>,
    handlers: Vec<HandlerEntry>,
    redelivery: Option<RedeliveryPolicy>,
    dead_letter: Option<Arc<dyn DeadLetterSink>>,
    handle_fault: bool,
}

impl Route {
    /// Start building a route that consumes exchanges addressed to `from`.
    #[must_use]
    pub fn from(from: QName) -> RouteBuilder {
        RouteBuilder {
            from,
            steps: Vec::new(),
            handlers: Vec::new(),
            redelivery: None,
            dead_letter: None,
            handle_fault: false,
        }
    }

    /// The service name this route consumes from.
    #[must_use]
    pub fn from_service(&self) -> &QName {
        &self.from
    }

    /// The terminal target-service name.
    #[must_use]
    pub fn to_service(&self) -> &QName {
        &self.to
    }

    /// The steps executed before the terminal invocation.
    #[must_use]
    pub fn steps(&self) -> &[Arc<dyn RouteStep>] {
        &self.steps
    }

    /// Registered failure handlers, in registration order.
    #[must_use]
    pub fn handlers(&self) -> &[HandlerEntry] {
        &self.handlers
    }

    /// Redelivery policy, if any.
    #[must_use]
    pub fn redelivery(&self) -> Option<&RedeliveryPolicy> {
        self.redelivery.as_ref()
    }

    /// Dead-letter sink, if any.
    #[must_use]
    pub fn dead_letter(&self) -> Option<&Arc<dyn DeadLetterSink>> {
        self.dead_letter.as_ref()
    }

    /// The carried handle-fault toggle. Faults always surface as terminal
    /// errors regardless of this flag; it exists so configurations written
    /// against the original protocol keep their shape.
    #[must_use]
    pub fn handle_fault(&self) -> bool {
        self.handle_fault
    }
}

/// Builder for [`Route`]. Finished by [`RouteBuilder::to`], which fixes the
/// terminal target — a route without a terminal cannot be expressed.
pub struct RouteBuilder {
    from: QName,
    steps: Vec<Arc<dyn RouteStep>>,
    handlers: Vec<HandlerEntry>,
    redelivery: Option<RedeliveryPolicy>,
    dead_letter: Option<Arc<dyn DeadLetterSink>>,
    handle_fault: bool,
}

impl RouteBuilder {
    /// Append a step to the route body.
    #[must_use]
    pub fn step<S: RouteStep + 'static>(mut self, step: S) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    /// Append a closure step to the route body.
    #[must_use]
    pub fn transform<F>(self, f: F) -> Self
    where
        F: Fn(Message) -> Result<Message, Failure> + Send + Sync + 'static,
    {
        self.step(FnStep::new(f))
    }

    /// Register a failure handler. Order matters: among equally specific
    /// matches, the first registered wins.
    #[must_use]
    pub fn on_failure(mut self, entry: HandlerEntry) -> Self {
        self.handlers.push(entry);
        self
    }

    /// Attach a redelivery policy governing technical failures.
    #[must_use]
    pub fn redelivery(mut self, policy: RedeliveryPolicy) -> Self {
        self.redelivery = Some(policy);
        self
    }

    /// Attach a dead-letter sink for unmatched failures and faults.
    #[must_use]
    pub fn dead_letter(mut self, sink: Arc<dyn DeadLetterSink>) -> Self {
        self.dead_letter = Some(sink);
        self
    }

    /// Set the handle-fault toggle (a no-op in the error path; see
    /// [`Route::handle_fault`]).
    #[must_use]
    pub fn handle_fault(mut self, handle_fault: bool) -> Self {
        self.handle_fault = handle_fault;
        self
    }

    /// Fix the terminal target service and finish the route.
    #[must_use]
    pub fn to(self, to: QName) -> Route {
        Route {
            from: self.from,
            to,
            steps: self.steps,
            handlers: self.handlers,
            redelivery: self.redelivery,
            dead_letter: self.dead_letter,
            handle_fault: self.handle_fault,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
