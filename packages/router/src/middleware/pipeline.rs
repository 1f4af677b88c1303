//! Pipeline composition: the router as a `tower::Service` plus its layers.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tower::{Service, ServiceBuilder};

use switchyard_core::Exchange;

use crate::config::RouterConfig;
use crate::router::{DispatchError, ExchangeRouter};

use super::metrics::MetricsLayer;
use super::timeout::TimeoutLayer;

// ---------------------------------------------------------------------------
// RouterService
// ---------------------------------------------------------------------------

/// `tower::Service` adapter over an [`ExchangeRouter`].
#[derive(Clone)]
pub struct RouterService {
    router: Arc<ExchangeRouter>,
}

impl RouterService {
    #[must_use]
    pub fn new(router: Arc<ExchangeRouter>) -> Self {
        Self { router }
    }
}

impl Service<Exchange> for RouterService {
    type Response = Exchange;
    type Error = DispatchError;
    type Future = Pin<Box<dyn Future<Output = Result<Exchange, DispatchError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, exchange: Exchange) -> Self::Future {
        let router = self.router.clone();
        Box::pin(async move { router.dispatch(exchange).await })
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Build the dispatch pipeline by wrapping the router with middleware.
///
/// Layer order (outermost to innermost):
/// 1. `TimeoutLayer` -- cancel dispatches that exceed the configured bound
/// 2. `MetricsLayer` -- record timing and terminal status (closest to the
///    actual dispatch)
#[must_use]
pub fn build_dispatch_pipeline(
    router: Arc<ExchangeRouter>,
    config: &RouterConfig,
) -> impl Service<Exchange, Response = Exchange, Error = DispatchError> {
    ServiceBuilder::new()
        .layer(TimeoutLayer::new(Duration::from_millis(
            config.dispatch_timeout_ms,
        )))
        .layer(MetricsLayer)
        .service(RouterService::new(router))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
