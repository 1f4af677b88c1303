//! Tower middleware layers around exchange dispatch.
//!
//! - [`timeout`]: bounds one dispatch; on elapse the exchange concludes with
//!   a cancellation-kind error
//! - [`metrics`]: dispatch timing and terminal status via `tracing` spans
//! - [`pipeline`]: the `tower::Service` adapter over the router and the
//!   composed layer stack

pub mod metrics;
pub mod pipeline;
pub mod timeout;

pub use metrics::MetricsLayer;
pub use pipeline::{build_dispatch_pipeline, RouterService};
pub use timeout::TimeoutLayer;
