//! Metrics middleware for dispatch.
//!
//! Records dispatch duration and terminal status using `tracing` spans,
//! not a full metrics crate.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use switchyard_core::{Exchange, ExchangeStatus};

use crate::router::DispatchError;

// ---------------------------------------------------------------------------
// MetricsLayer
// ---------------------------------------------------------------------------

/// Tower layer that instruments dispatches with timing and outcome spans.
#[derive(Debug, Clone)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService { inner }
    }
}

// ---------------------------------------------------------------------------
// MetricsService
// ---------------------------------------------------------------------------

/// Service wrapper that records dispatch duration and terminal status.
#[derive(Debug, Clone)]
pub struct MetricsService<S> {
    inner: S,
}

impl<S> Service<Exchange> for MetricsService<S>
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
        let exchange_id = exchange.id();
        let service = exchange.target_service().clone();

        let span = info_span!(
            "dispatch",
            exchange_id = %exchange_id,
            service = %service,
            duration_ms = tracing::field::Empty,
            status = tracing::field::Empty,
        );

        let fut = self.inner.call(exchange);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = fut.await;
                let duration_ms =
                    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                let status = match &result {
                    Ok(exchange) => match exchange.status() {
                        ExchangeStatus::Done => "done",
                        ExchangeStatus::Error => "error",
                        ExchangeStatus::Active => "active",
                    },
                    Err(_) => "unknown-route",
                };

                tracing::Span::current().record("duration_ms", duration_ms);
                tracing::Span::current().record("status", status);

                tracing::info!(
                    exchange_id = %exchange_id,
                    service = %service,
                    duration_ms,
                    status,
                    "dispatch complete"
                );

                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
