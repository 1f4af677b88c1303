//! The exchange router: drives one exchange from `Active` to a terminal
//! status.
//!
//! Dispatch runs the route body against the inbound message, classifies any
//! raised failure, applies the route's redelivery policy, resolves the
//! matched handler's handled flag into the terminal status, and hands
//! unmatched failures and faults to the dead-letter sink. Everything raised
//! inside route execution is converted into exchange status plus an attached
//! error; nothing escapes to the caller as a raised error. The one exception
//! is addressing a service no route consumes from, which is a
//! configuration-class [`DispatchError`].

use std::collections::HashMap;
use std::sync::Arc;

use switchyard_core::{
    Exchange, ExchangeError, ExchangePattern, Failure, Message, QName,
};

use crate::classify::{HandlerMatcher, HierarchyMatcher};
use crate::deadletter::DeadLetterSink;
use crate::registry::{ServiceOutcome, TargetService};
use crate::resolver::{Resolver, SetupError};
use crate::route::Route;

// ---------------------------------------------------------------------------
// DispatchError
// ---------------------------------------------------------------------------

/// Errors `dispatch` itself can return. Failures raised inside route
/// execution never appear here; they become exchange status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// No route consumes exchanges addressed to this service.
    #[error("no route accepts exchanges for {0}")]
    UnknownRoute(QName),
}

// ---------------------------------------------------------------------------
// CompiledRoute
// ---------------------------------------------------------------------------

/// A route with its terminal target and handler destinations resolved.
struct CompiledRoute {
    definition: Route,
    target: Arc<dyn TargetService>,
    destinations: HashMap<QName, Arc<dyn TargetService>>,
}

// ---------------------------------------------------------------------------
// ExchangeRouterBuilder
// ---------------------------------------------------------------------------

/// Builder collecting routes and the matching strategy before resolution.
pub struct ExchangeRouterBuilder {
    routes: Vec<Route>,
    matcher: Arc<dyn HandlerMatcher>,
}

impl ExchangeRouterBuilder {
    /// Add a route.
    #[must_use]
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Replace the default [`HierarchyMatcher`] strategy.
    #[must_use]
    pub fn matcher<M: HandlerMatcher + 'static>(mut self, matcher: M) -> Self {
        self.matcher = Arc::new(matcher);
        self
    }

    /// Resolve every route terminal and handler destination and build the
    /// router. Resolution happens here, before any dispatch, so missing
    /// collaborators fail fast.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::MissingService`] when a terminal or destination
    /// cannot be resolved, and [`SetupError::DuplicateRoute`] when two routes
    /// consume from the same service.
    pub fn build(self, resolver: &dyn Resolver) -> Result<ExchangeRouter, SetupError> {
        let mut routes = HashMap::with_capacity(self.routes.len());
        for route in self.routes {
            let from = route.from_service().clone();
            if routes.contains_key(&from) {
                return Err(SetupError::DuplicateRoute(from));
            }

            let target = resolver.resolve(route.to_service())?;
            let mut destinations = HashMap::new();
            for entry in route.handlers() {
                if let Some(destination) = entry.destination() {
                    let service = resolver.resolve(destination)?;
                    destinations.insert(destination.clone(), service);
                }
            }

            routes.insert(
                from,
                CompiledRoute {
                    definition: route,
                    target,
                    destinations,
                },
            );
        }
        Ok(ExchangeRouter {
            routes,
            matcher: self.matcher,
        })
    }
}

// ---------------------------------------------------------------------------
// ExchangeRouter
// ---------------------------------------------------------------------------

/// Routes exchanges to their configured route and reconciles the outcome
/// into a terminal exchange status.
pub struct ExchangeRouter {
    routes: HashMap<QName, CompiledRoute>,
    matcher: Arc<dyn HandlerMatcher>,
}

impl ExchangeRouter {
    /// Start building a router.
    #[must_use]
    pub fn builder() -> ExchangeRouterBuilder {
        ExchangeRouterBuilder {
            routes: Vec::new(),
            matcher: Arc::new(HierarchyMatcher),
        }
    }

    /// Drive `exchange` to a terminal status and return it.
    ///
    /// The returned exchange is always `Done` or `Error`. Attempt counters
    /// are local to this call and never shared across exchanges.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownRoute`] when no route consumes from
    /// the exchange's target service.
    pub async fn dispatch(&self, mut exchange: Exchange) -> Result<Exchange, DispatchError> {
        let Some(route) = self.routes.get(exchange.target_service()) else {
            return Err(DispatchError::UnknownRoute(exchange.target_service().clone()));
        };

        tracing::debug!(
            exchange_id = %exchange.id(),
            service = %exchange.target_service(),
            "dispatching exchange"
        );

        match self.run_with_redelivery(route, exchange.in_message()).await {
            Ok(ServiceOutcome::Out(message)) => {
                exchange.set_out_message(message);
                exchange.mark_done();
            }
            Ok(ServiceOutcome::Done) => {
                exchange.mark_done();
            }
            Ok(ServiceOutcome::Fault(fault)) => {
                // Faults are delivered business errors: never retried, never
                // handled, always surfaced as a terminal error. The
                // handle-fault toggle does not alter this path.
                let service = exchange.target_service().clone();
                if exchange.pattern() == ExchangePattern::InOut {
                    exchange.set_fault_message(fault.clone());
                }
                exchange.mark_error(ExchangeError::Fault { service, fault });
                self.send_to_dead_letter(route, &exchange).await;
            }
            Err(failure) => {
                self.conclude_failure(route, &mut exchange, failure).await;
            }
        }

        debug_assert!(exchange.is_terminal());
        Ok(exchange)
    }

    /// Run the route body, redelivering per the route's policy. Bounded by
    /// `max_redeliveries`, so the loop always terminates.
    async fn run_with_redelivery(
        &self,
        route: &CompiledRoute,
        input: &Message,
    ) -> Result<ServiceOutcome, Failure> {
        let mut attempted: u32 = 0;
        loop {
            match self.run_body(route, input).await {
                Ok(outcome) => return Ok(outcome),
                Err(failure) => {
                    let Some(policy) = route.definition.redelivery() else {
                        return Err(failure);
                    };
                    if !policy.should_redeliver(attempted) {
                        return Err(failure);
                    }
                    let delay = policy.delay_for(attempted);
                    tracing::debug!(
                        kind = %failure.kind(),
                        redelivery = attempted + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "redelivering after failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempted += 1;
                }
            }
        }
    }

    /// One attempt of the route body: fold the steps, invoke the terminal
    /// target. Redelivery re-enters here with the original inbound message.
    async fn run_body(
        &self,
        route: &CompiledRoute,
        input: &Message,
    ) -> Result<ServiceOutcome, Failure> {
        let mut message = input.clone();
        for step in route.definition.steps() {
            message = step.process(message).await?;
        }
        route.target.invoke(&message).await
    }

    /// Resolve an exhausted failure into a terminal status via the matched
    /// handler, or down the default dead-letter path when nothing matches.
    async fn conclude_failure(
        &self,
        route: &CompiledRoute,
        exchange: &mut Exchange,
        failure: Failure,
    ) {
        match self.matcher.select(route.definition.handlers(), failure.kind()) {
            Some(entry) => {
                if let Some(destination) = entry.destination() {
                    self.forward(route, destination, exchange.in_message()).await;
                }
                if entry.is_handled() {
                    tracing::debug!(
                        exchange_id = %exchange.id(),
                        kind = %failure.kind(),
                        "failure handled, concluding done"
                    );
                    exchange.mark_done();
                } else {
                    exchange.mark_error(ExchangeError::Failed(failure));
                }
            }
            None => {
                exchange.mark_error(ExchangeError::Failed(failure));
                self.send_to_dead_letter(route, exchange).await;
            }
        }
    }

    /// Forward the in-message to a handler destination, exactly once per
    /// logical exchange. Best-effort: a forwarding failure is logged and
    /// does not change the terminal status.
    async fn forward(&self, route: &CompiledRoute, destination: &QName, message: &Message) {
        match route.destinations.get(destination) {
            Some(service) => {
                if let Err(failure) = service.invoke(message).await {
                    tracing::warn!(
                        destination = %destination,
                        error = %failure,
                        "handler destination failed"
                    );
                }
            }
            None => {
                tracing::warn!(destination = %destination, "handler destination not resolved");
            }
        }
    }

    /// Best-effort hand-off to the route's dead-letter sink.
    async fn send_to_dead_letter(&self, route: &CompiledRoute, exchange: &Exchange) {
        let Some(sink) = route.definition.dead_letter() else {
            tracing::debug!(
                exchange_id = %exchange.id(),
                "no dead-letter sink configured, dropping terminal exchange copy"
            );
            return;
        };
        if let Err(error) = sink.deliver(exchange).await {
            tracing::warn!(
                exchange_id = %exchange.id(),
                error = %error,
                "dead-letter delivery failed"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use switchyard_core::{ExchangeStatus, FailureKind};

    use super::*;
    use crate::deadletter::CollectingSink;
    use crate::registry::ServiceRegistry;
    use crate::resolver::RegistryResolver;
    use crate::retry::RedeliveryPolicy;
    use crate::route::HandlerEntry;

    // ----- Test services -----

    /// Answers every invocation with a business fault, counting invocations.
    struct FaultyService {
        invocations: AtomicU32,
    }

    impl FaultyService {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                invocations: AtomicU32::new(0),
            })
        }

        fn invocations(&self) -> u32 {
            self.invocations.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TargetService for FaultyService {
        async fn invoke(&self, _input: &Message) -> Result<ServiceOutcome, Failure> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            Ok(ServiceOutcome::Fault(Message::new("<fault/>")))
        }
    }

    /// Raises a technical failure of a fixed kind, counting invocations.
    struct FailingService {
        kind: FailureKind,
        invocations: AtomicU32,
    }

    impl FailingService {
        fn new(kind: FailureKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                invocations: AtomicU32::new(0),
            })
        }

        fn invocations(&self) -> u32 {
            self.invocations.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TargetService for FailingService {
        async fn invoke(&self, _input: &Message) -> Result<ServiceOutcome, Failure> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            Err(Failure::new(self.kind.clone(), "service raised"))
        }
    }

    /// Records every delivered message and completes silently.
    struct RecordingService {
        received: Mutex<Vec<Message>>,
    }

    impl RecordingService {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                received: Mutex::new(Vec::new()),
            })
        }

        fn received_count(&self) -> usize {
            self.received.lock().len()
        }
    }

    #[async_trait]
    impl TargetService for RecordingService {
        async fn invoke(&self, input: &Message) -> Result<ServiceOutcome, Failure> {
            self.received.lock().push(input.clone());
            Ok(ServiceOutcome::Done)
        }
    }

    /// Echoes the routed message back as the out-message.
    struct EchoService;

    #[async_trait]
    impl TargetService for EchoService {
        async fn invoke(&self, input: &Message) -> Result<ServiceOutcome, Failure> {
            Ok(ServiceOutcome::Out(input.clone()))
        }
    }

    // ----- Fixture mirroring the original route configuration -----

    const MESSAGE: &str = "<just><a>test</a></just>";

    fn urn(local: &str) -> QName {
        QName::new("urn:test", local)
    }

    struct Fixture {
        router: ExchangeRouter,
        errors: Arc<CollectingSink>,
        receiver: Arc<RecordingService>,
        faulty: Arc<FaultyService>,
        iae: Arc<FailingService>,
        ise: Arc<FailingService>,
        npe: Arc<FailingService>,
    }

    fn policy() -> RedeliveryPolicy {
        RedeliveryPolicy::fixed(1, Duration::from_millis(300))
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(ServiceRegistry::new());
        let errors = Arc::new(CollectingSink::new());
        let receiver = RecordingService::new();
        let faulty = FaultyService::new();
        let iae = FailingService::new(FailureKind::invalid_argument());
        let ise = FailingService::new(FailureKind::invalid_state());
        let npe = FailingService::new(FailureKind::missing_value());

        registry.register_arc(urn("faulty-service"), faulty.clone());
        registry.register_arc(urn("iae-error-service"), iae.clone());
        registry.register_arc(urn("ise-error-service"), ise.clone());
        registry.register_arc(urn("npe-error-service"), npe.clone());
        registry.register_arc(urn("receiver-service"), receiver.clone());

        let handlers = [
            HandlerEntry::for_kind(FailureKind::invalid_state())
                .handled(false)
                .forward_to(urn("receiver-service")),
            HandlerEntry::for_kind(FailureKind::missing_value())
                .handled(true)
                .forward_to(urn("receiver-service")),
        ];

        let route = |from: &str, to: &str, handle_fault: bool| {
            let mut builder = Route::from(urn(from))
                .redelivery(policy())
                .dead_letter(errors.clone())
                .handle_fault(handle_fault);
            for entry in &handlers {
                builder = builder.on_failure(entry.clone());
            }
            builder.to(urn(to))
        };

        let router = ExchangeRouter::builder()
            .route(route("no-handle-fault", "faulty-service", false))
            .route(route("handle-fault", "faulty-service", true))
            .route(route("error-not-handled", "iae-error-service", false))
            .route(route("error-handled-false", "ise-error-service", false))
            .route(route("error-handled-true", "npe-error-service", false))
            .build(&RegistryResolver::new(registry))
            .unwrap();

        Fixture {
            router,
            errors,
            receiver,
            faulty,
            iae,
            ise,
            npe,
        }
    }

    async fn send(fixture: &Fixture, from: &str) -> Exchange {
        let exchange = Exchange::in_only(urn(from), Message::new(MESSAGE));
        fixture.router.dispatch(exchange).await.unwrap()
    }

    // ----- The five observed scenarios -----

    #[tokio::test]
    async fn in_only_fault_without_handle_fault() {
        let fixture = fixture();
        let exchange = send(&fixture, "no-handle-fault").await;

        assert_eq!(exchange.status(), ExchangeStatus::Error);
        assert!(exchange.error().is_some_and(ExchangeError::is_fault));
        assert_eq!(fixture.errors.received_count(), 1);
    }

    #[tokio::test]
    async fn in_only_fault_with_handle_fault() {
        let fixture = fixture();
        let exchange = send(&fixture, "handle-fault").await;

        // The toggle changes nothing on the error path.
        assert_eq!(exchange.status(), ExchangeStatus::Error);
        assert!(exchange.error().is_some_and(ExchangeError::is_fault));
        assert_eq!(fixture.errors.received_count(), 1);
    }

    #[tokio::test]
    async fn in_only_failure_without_matching_handler() {
        let fixture = fixture();
        let exchange = send(&fixture, "error-not-handled").await;

        assert_eq!(exchange.status(), ExchangeStatus::Error);
        assert_eq!(
            exchange.error().and_then(ExchangeError::failure_kind),
            Some(&FailureKind::invalid_argument())
        );
        assert_eq!(fixture.errors.received_count(), 1);
        // First attempt plus one redelivery before giving up.
        assert_eq!(fixture.iae.invocations(), 2);
        assert_eq!(fixture.receiver.received_count(), 0);
    }

    #[tokio::test]
    async fn in_only_failure_handled_false() {
        let fixture = fixture();
        let exchange = send(&fixture, "error-handled-false").await;

        assert_eq!(exchange.status(), ExchangeStatus::Error);
        assert_eq!(
            exchange.error().and_then(ExchangeError::failure_kind),
            Some(&FailureKind::invalid_state())
        );
        // The matched handler's destination took the message; the
        // dead-letter sink did not.
        assert_eq!(fixture.receiver.received_count(), 1);
        assert_eq!(fixture.errors.received_count(), 0);
        assert_eq!(fixture.ise.invocations(), 2);
    }

    #[tokio::test]
    async fn in_only_failure_handled_true() {
        let fixture = fixture();
        let exchange = send(&fixture, "error-handled-true").await;

        assert_eq!(exchange.status(), ExchangeStatus::Done);
        assert!(exchange.error().is_none());
        assert_eq!(fixture.receiver.received_count(), 1);
        assert_eq!(fixture.errors.received_count(), 0);
        assert_eq!(fixture.npe.invocations(), 2);
    }

    // ----- Further properties -----

    #[tokio::test]
    async fn fault_is_never_retried() {
        let fixture = fixture();
        let _ = send(&fixture, "no-handle-fault").await;
        // The route carries a redelivery policy, yet the fault producer is
        // invoked exactly once and dead-lettered exactly once.
        assert_eq!(fixture.faulty.invocations(), 1);
        assert_eq!(fixture.errors.received_count(), 1);
    }

    #[tokio::test]
    async fn unknown_route_is_a_dispatch_error() {
        let fixture = fixture();
        let exchange = Exchange::in_only(urn("unrouted"), Message::new(MESSAGE));
        let err = fixture.router.dispatch(exchange).await.unwrap_err();
        assert_eq!(err, DispatchError::UnknownRoute(urn("unrouted")));
    }

    #[tokio::test]
    async fn in_out_success_carries_out_message() {
        let registry = Arc::new(ServiceRegistry::new());
        registry.register(urn("echo-service"), EchoService);

        let router = ExchangeRouter::builder()
            .route(
                Route::from(urn("echo"))
                    .transform(|msg| {
                        Ok(Message::new(format!("<echoed>{}</echoed>", msg.content())))
                    })
                    .to(urn("echo-service")),
            )
            .build(&RegistryResolver::new(registry))
            .unwrap();

        let exchange = Exchange::in_out(urn("echo"), Message::new("hi"));
        let exchange = router.dispatch(exchange).await.unwrap();

        assert_eq!(exchange.status(), ExchangeStatus::Done);
        assert!(exchange.error().is_none());
        assert_eq!(
            exchange.out_message().map(Message::content),
            Some("<echoed>hi</echoed>")
        );
    }

    #[tokio::test]
    async fn in_out_fault_populates_fault_slot() {
        let registry = Arc::new(ServiceRegistry::new());
        registry.register_arc(urn("faulty-service"), FaultyService::new());

        let router = ExchangeRouter::builder()
            .route(Route::from(urn("ask")).to(urn("faulty-service")))
            .build(&RegistryResolver::new(registry))
            .unwrap();

        let exchange = Exchange::in_out(urn("ask"), Message::new("hi"));
        let exchange = router.dispatch(exchange).await.unwrap();

        assert_eq!(exchange.status(), ExchangeStatus::Error);
        assert!(exchange.error().is_some_and(ExchangeError::is_fault));
        assert_eq!(
            exchange.fault_message().map(Message::content),
            Some("<fault/>")
        );
        assert!(exchange.out_message().is_none());
    }

    #[tokio::test]
    async fn step_failure_is_classified_like_a_service_failure() {
        let registry = Arc::new(ServiceRegistry::new());
        let receiver = RecordingService::new();
        registry.register_arc(urn("receiver-service"), receiver.clone());
        registry.register(urn("echo-service"), EchoService);

        let router = ExchangeRouter::builder()
            .route(
                Route::from(urn("validating"))
                    .transform(|msg| {
                        if msg.content().is_empty() {
                            Err(Failure::new(FailureKind::missing_value(), "empty body"))
                        } else {
                            Ok(msg)
                        }
                    })
                    .on_failure(
                        HandlerEntry::for_kind(FailureKind::missing_value())
                            .handled(true)
                            .forward_to(urn("receiver-service")),
                    )
                    .to(urn("echo-service")),
            )
            .build(&RegistryResolver::new(registry))
            .unwrap();

        let exchange = Exchange::in_only(urn("validating"), Message::new(""));
        let exchange = router.dispatch(exchange).await.unwrap();

        assert_eq!(exchange.status(), ExchangeStatus::Done);
        assert!(exchange.error().is_none());
        assert_eq!(receiver.received_count(), 1);
    }

    #[tokio::test]
    async fn handled_without_destination_concludes_done_silently() {
        let registry = Arc::new(ServiceRegistry::new());
        let failing = FailingService::new(FailureKind::invalid_state());
        registry.register_arc(urn("ise-error-service"), failing.clone());

        let router = ExchangeRouter::builder()
            .route(
                Route::from(urn("quiet"))
                    .on_failure(
                        HandlerEntry::for_kind(FailureKind::technical()).handled(true),
                    )
                    .to(urn("ise-error-service")),
            )
            .build(&RegistryResolver::new(registry))
            .unwrap();

        let exchange = Exchange::in_only(urn("quiet"), Message::new(MESSAGE));
        let exchange = router.dispatch(exchange).await.unwrap();

        assert_eq!(exchange.status(), ExchangeStatus::Done);
        assert!(exchange.error().is_none());
        // No redelivery policy on this route: a single attempt.
        assert_eq!(failing.invocations(), 1);
    }

    #[tokio::test]
    async fn ancestor_handler_catches_descendant_failure() {
        let registry = Arc::new(ServiceRegistry::new());
        let receiver = RecordingService::new();
        let failing = FailingService::new(FailureKind::new("technical.io.timeout"));
        registry.register_arc(urn("receiver-service"), receiver.clone());
        registry.register_arc(urn("flaky-service"), failing);

        let router = ExchangeRouter::builder()
            .route(
                Route::from(urn("flaky"))
                    .on_failure(
                        HandlerEntry::for_kind(FailureKind::technical())
                            .handled(true)
                            .forward_to(urn("receiver-service")),
                    )
                    .to(urn("flaky-service")),
            )
            .build(&RegistryResolver::new(registry))
            .unwrap();

        let exchange = Exchange::in_only(urn("flaky"), Message::new(MESSAGE));
        let exchange = router.dispatch(exchange).await.unwrap();
        assert_eq!(exchange.status(), ExchangeStatus::Done);
        assert_eq!(receiver.received_count(), 1);
    }

    /// Sink whose delivery always fails.
    struct BrokenSink;

    #[async_trait]
    impl crate::deadletter::DeadLetterSink for BrokenSink {
        async fn deliver(&self, _exchange: &Exchange) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("sink target down"))
        }
    }

    #[tokio::test]
    async fn broken_sink_does_not_mask_the_error_status() {
        let registry = Arc::new(ServiceRegistry::new());
        let failing = FailingService::new(FailureKind::invalid_argument());
        registry.register_arc(urn("iae-error-service"), failing);

        // No handlers: the failure goes down the default dead-letter path,
        // into a sink that rejects every delivery.
        let router = ExchangeRouter::builder()
            .route(
                Route::from(urn("error-not-handled"))
                    .dead_letter(Arc::new(BrokenSink))
                    .to(urn("iae-error-service")),
            )
            .build(&RegistryResolver::new(registry))
            .unwrap();

        let exchange = Exchange::in_only(urn("error-not-handled"), Message::new(MESSAGE));
        let exchange = router.dispatch(exchange).await.unwrap();

        assert_eq!(exchange.status(), ExchangeStatus::Error);
        assert_eq!(
            exchange.error().and_then(ExchangeError::failure_kind),
            Some(&FailureKind::invalid_argument())
        );
    }

    #[tokio::test]
    async fn broken_destination_does_not_mask_the_handled_done() {
        let registry = Arc::new(ServiceRegistry::new());
        let failing = FailingService::new(FailureKind::invalid_state());
        let broken = FailingService::new(FailureKind::technical());
        registry.register_arc(urn("ise-error-service"), failing);
        registry.register_arc(urn("receiver-service"), broken.clone());

        let router = ExchangeRouter::builder()
            .route(
                Route::from(urn("error-handled-true"))
                    .on_failure(
                        HandlerEntry::for_kind(FailureKind::invalid_state())
                            .handled(true)
                            .forward_to(urn("receiver-service")),
                    )
                    .to(urn("ise-error-service")),
            )
            .build(&RegistryResolver::new(registry))
            .unwrap();

        let exchange = Exchange::in_only(urn("error-handled-true"), Message::new(MESSAGE));
        let exchange = router.dispatch(exchange).await.unwrap();

        // The destination raised, but the handled flag comes from
        // configuration, not from forwarding success.
        assert_eq!(exchange.status(), ExchangeStatus::Done);
        assert!(exchange.error().is_none());
        assert_eq!(broken.invocations(), 1);
    }

    // ----- Fail-fast setup -----

    #[test]
    fn missing_terminal_service_fails_at_build() {
        let registry = Arc::new(ServiceRegistry::new());
        let result = ExchangeRouter::builder()
            .route(Route::from(urn("in")).to(urn("absent-service")))
            .build(&RegistryResolver::new(registry));
        assert_eq!(
            result.err(),
            Some(SetupError::MissingService(urn("absent-service")))
        );
    }

    #[test]
    fn missing_handler_destination_fails_at_build() {
        let registry = Arc::new(ServiceRegistry::new());
        registry.register(urn("echo-service"), EchoService);
        let result = ExchangeRouter::builder()
            .route(
                Route::from(urn("in"))
                    .on_failure(
                        HandlerEntry::for_kind(FailureKind::technical())
                            .forward_to(urn("absent-receiver")),
                    )
                    .to(urn("echo-service")),
            )
            .build(&RegistryResolver::new(registry));
        assert_eq!(
            result.err(),
            Some(SetupError::MissingService(urn("absent-receiver")))
        );
    }

    #[test]
    fn duplicate_route_fails_at_build() {
        let registry = Arc::new(ServiceRegistry::new());
        registry.register(urn("echo-service"), EchoService);
        let result = ExchangeRouter::builder()
            .route(Route::from(urn("in")).to(urn("echo-service")))
            .route(Route::from(urn("in")).to(urn("echo-service")))
            .build(&RegistryResolver::new(registry));
        assert_eq!(result.err(), Some(SetupError::DuplicateRoute(urn("in"))));
    }
}
