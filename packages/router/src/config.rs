/// Router-level configuration for the dispatch pipeline and worker.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Upper bound on one dispatch, enforced by the timeout middleware,
    /// in milliseconds.
    pub dispatch_timeout_ms: u64,
    /// Capacity of the dispatch worker's submission queue.
    pub worker_queue_capacity: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout_ms: 30_000,
            worker_queue_capacity: 256,
        }
    }
}
