//! Switchyard Router — drives exchanges from `Active` to a terminal status.
//!
//! The engine is assembled from small seams:
//!
//! 1. **Registry/Resolver** (`registry`, `resolver`): target services behind
//!    a name-keyed table, resolved fail-fast at build time
//! 2. **Routes** (`route`): composable steps terminating in a target-service
//!    invocation, plus per-route failure handlers and redelivery policy
//! 3. **Classification** (`classify`): pure most-specific matching of raised
//!    failure kinds to handler entries
//! 4. **Redelivery** (`retry`): bounded, capped backoff arithmetic
//! 5. **Dead-letter** (`deadletter`): best-effort terminal sinks
//! 6. **Dispatch** (`router`, `worker`, `middleware`): the orchestrator, an
//!    mpsc-fed worker, and tower layers around dispatch

pub mod classify;
pub mod config;
pub mod deadletter;
pub mod logging;
pub mod middleware;
pub mod registry;
pub mod resolver;
pub mod retry;
pub mod route;
pub mod router;
pub mod worker;

// Re-export key types for convenient access.
pub use classify::{HandlerMatcher, HierarchyMatcher};
pub use config::RouterConfig;
pub use deadletter::{CollectingSink, DeadLetterSink, JsonLogSink, ServiceSink};
pub use registry::{ServiceOutcome, ServiceRegistry, TargetService};
pub use resolver::{RegistryResolver, Resolver, SetupError};
pub use retry::RedeliveryPolicy;
pub use route::{FnStep, HandlerEntry, Route, RouteBuilder, RouteStep};
pub use router::{DispatchError, ExchangeRouter, ExchangeRouterBuilder};
pub use worker::DispatchWorker;
