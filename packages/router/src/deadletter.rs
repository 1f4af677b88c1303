//! Dead-letter sinks: terminal destinations for undeliverable exchanges.
//!
//! A sink receives exchanges whose failure matched no handler, or whose
//! target answered with a fault. Delivery is best-effort and fire-and-forget:
//! the router logs a sink failure and never lets it change the status
//! returned to the original caller. No retry is layered on top of a sink.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use switchyard_core::{Exchange, Message, QName};

use crate::registry::TargetService;

/// Terminal destination for exhausted or unmatched exchanges.
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    /// Accept a terminal exchange for out-of-band inspection.
    ///
    /// # Errors
    ///
    /// Implementations may fail; the router treats failure as best-effort
    /// and only logs it.
    async fn deliver(&self, exchange: &Exchange) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// CollectingSink
// ---------------------------------------------------------------------------

/// In-memory sink that keeps every delivered exchange for inspection.
#[derive(Default)]
pub struct CollectingSink {
    received: Mutex<Vec<Exchange>>,
}

impl CollectingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of exchanges delivered so far.
    #[must_use]
    pub fn received_count(&self) -> usize {
        self.received.lock().len()
    }

    /// Snapshot of the delivered exchanges.
    #[must_use]
    pub fn received(&self) -> Vec<Exchange> {
        self.received.lock().clone()
    }
}

#[async_trait]
impl DeadLetterSink for CollectingSink {
    async fn deliver(&self, exchange: &Exchange) -> anyhow::Result<()> {
        self.received.lock().push(exchange.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ServiceSink
// ---------------------------------------------------------------------------

/// Sink that forwards the dead exchange's in-message to a target service.
pub struct ServiceSink {
    destination: QName,
    service: Arc<dyn TargetService>,
}

impl ServiceSink {
    #[must_use]
    pub fn new(destination: QName, service: Arc<dyn TargetService>) -> Self {
        Self {
            destination,
            service,
        }
    }
}

#[async_trait]
impl DeadLetterSink for ServiceSink {
    async fn deliver(&self, exchange: &Exchange) -> anyhow::Result<()> {
        let message: &Message = exchange.in_message();
        self.service.invoke(message).await.map_err(|failure| {
            anyhow::anyhow!(
                "dead-letter forward to {} failed: {failure}",
                self.destination
            )
        })?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JsonLogSink
// ---------------------------------------------------------------------------

/// Sink that serializes the exchange to JSON and emits it via `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLogSink;

#[async_trait]
impl DeadLetterSink for JsonLogSink {
    async fn deliver(&self, exchange: &Exchange) -> anyhow::Result<()> {
        let json = serde_json::to_string(exchange)?;
        tracing::warn!(
            exchange_id = %exchange.id(),
            service = %exchange.target_service(),
            payload = %json,
            "exchange dead-lettered"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
