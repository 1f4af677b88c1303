//! Dispatch worker: asynchronous submission of exchanges over a channel.
//!
//! The synchronous contract (`ExchangeRouter::dispatch`) blocks its caller
//! until the exchange is terminal. The worker offers the asynchronous
//! variant: exchanges are queued on an mpsc channel and each one is processed
//! on its own spawned task, so concurrent exchanges never share mutable
//! state. The reconciliation logic is the router's in both cases.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use switchyard_core::Exchange;

use crate::config::RouterConfig;
use crate::router::{DispatchError, ExchangeRouter};

struct WorkItem {
    exchange: Exchange,
    reply: Option<oneshot::Sender<Result<Exchange, DispatchError>>>,
}

/// Worker that pulls exchanges off a channel and dispatches each on its own
/// task.
pub struct DispatchWorker {
    tx: Option<mpsc::Sender<WorkItem>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl DispatchWorker {
    /// Start the worker over the given router, taking the queue capacity
    /// from the router configuration.
    #[must_use]
    pub fn start_with_config(router: Arc<ExchangeRouter>, config: &RouterConfig) -> Self {
        Self::start(router, config.worker_queue_capacity)
    }

    /// Start the worker over the given router with the given queue capacity.
    #[must_use]
    pub fn start(router: Arc<ExchangeRouter>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<WorkItem>(capacity.max(1));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    item = rx.recv() => {
                        match item {
                            Some(item) => Self::spawn_dispatch(router.clone(), item),
                            None => break, // Channel closed.
                        }
                    }
                    _ = &mut shutdown_rx => {
                        break;
                    }
                }
            }
        });

        Self {
            tx: Some(tx),
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    fn spawn_dispatch(router: Arc<ExchangeRouter>, item: WorkItem) {
        tokio::spawn(async move {
            let result = router.dispatch(item.exchange).await;
            match item.reply {
                Some(reply) => {
                    // The submitter may have stopped waiting; that is fine.
                    let _ = reply.send(result);
                }
                None => match result {
                    Ok(exchange) => tracing::debug!(
                        exchange_id = %exchange.id(),
                        status = ?exchange.status(),
                        "detached dispatch complete"
                    ),
                    Err(error) => {
                        tracing::warn!(error = %error, "detached dispatch failed");
                    }
                },
            }
        });
    }

    /// Queue an exchange fire-and-forget; its terminal status is only logged.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker has been stopped.
    pub async fn submit(&self, exchange: Exchange) -> anyhow::Result<()> {
        self.send(WorkItem {
            exchange,
            reply: None,
        })
        .await
    }

    /// Queue an exchange and await its terminal form.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker has been stopped, and propagates
    /// [`DispatchError`] for exchanges no route accepts.
    pub async fn submit_and_wait(&self, exchange: Exchange) -> anyhow::Result<Exchange> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(WorkItem {
            exchange,
            reply: Some(reply_tx),
        })
        .await?;
        let terminal = reply_rx
            .await
            .map_err(|_| anyhow::anyhow!("worker dropped the reply channel"))??;
        Ok(terminal)
    }

    async fn send(&self, item: WorkItem) -> anyhow::Result<()> {
        match &self.tx {
            Some(tx) => tx
                .send(item)
                .await
                .map_err(|_| anyhow::anyhow!("worker channel closed")),
            None => Err(anyhow::anyhow!("worker not running")),
        }
    }

    /// Stop accepting submissions and wait for the intake loop to finish.
    /// Exchanges already handed to their own task run to completion.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
