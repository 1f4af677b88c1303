//! Timeout middleware for dispatch.
//!
//! A dispatch that exceeds the configured bound is cancelled: the in-flight
//! future (including any redelivery wait) is dropped and the caller receives
//! the exchange marked `Error` with a cancellation-kind error. This is the
//! only cancellation path; the router itself never abandons an exchange.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tower::{Layer, Service};

use switchyard_core::{Exchange, ExchangeError};

use crate::router::DispatchError;

// ---------------------------------------------------------------------------
// TimeoutLayer
// ---------------------------------------------------------------------------

/// Tower layer that bounds each dispatch to a fixed duration.
#[derive(Debug, Clone)]
pub struct TimeoutLayer {
    timeout: Duration,
}

impl TimeoutLayer {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService {
            inner,
            timeout: self.timeout,
        }
    }
}

// ---------------------------------------------------------------------------
// TimeoutService
// ---------------------------------------------------------------------------

/// Service wrapper enforcing the dispatch timeout.
#[derive(Debug, Clone)]
pub struct TimeoutService<S> {
    inner: S,
    timeout: Duration,
}

impl<S> Service<Exchange> for TimeoutService<S>
where
    S: Service<Exchange, Response = Exchange, Error = DispatchError> + Send,
    S::Future: Send + 'static,
{
    type Response = Exchange;
    type Error = DispatchError;
    type Future = Pin<Box<dyn Future<Output = Result<Exchange, DispatchError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, exchange: Exchange) -> Self::Future {
        // The inner future consumes the exchange; keep a pre-dispatch clone
        // to conclude with when the deadline elapses.
        let fallback = exchange.clone();
        let timeout = self.timeout;
        let fut = self.inner.call(exchange);
        Box::pin(async move {
            match tokio::time::timeout(timeout, fut).await {
                Ok(result) => result,
                Err(_elapsed) => {
                    let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                    tracing::warn!(
                        exchange_id = %fallback.id(),
                        service = %fallback.target_service(),
                        timeout_ms,
                        "dispatch cancelled by timeout"
                    );
                    let mut cancelled = fallback;
                    cancelled.mark_error(ExchangeError::Cancelled { timeout_ms });
                    Ok(cancelled)
                }
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
