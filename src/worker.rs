//! Bounded worker pool.
//!
//! Heavy pack computations run on a shared rayon pool with a hard
//! admission bound: once `queue_depth` computations are in flight, further
//! submissions fail fast with `Overloaded` instead of buffering without
//! limit. Within an admitted computation, the recommendation layer's
//! `par_iter` fan-out also lands on this pool.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::warn;

use crate::config::WorkerConfig;
use crate::error::{PackError, PackResult};

/// Shared, bounded compute pool.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    queue_depth: usize,
    in_flight: Arc<AtomicUsize>,
}

impl WorkerPool {
    /// Build the pool; `threads = 0` uses one thread per hardware thread.
    pub fn new(config: &WorkerConfig) -> PackResult<Self> {
        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|i| format!("fleetpack-worker-{i}"));
        if config.threads > 0 {
            builder = builder.num_threads(config.threads);
        }
        let pool = builder
            .build()
            .map_err(|e| PackError::internal(format!("failed to build worker pool: {e}")))?;
        Ok(Self {
            pool,
            queue_depth: config.queue_depth,
            in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Run a computation on the pool, or fail fast when at capacity.
    pub fn run<T, F>(&self, job: F) -> PackResult<T>
    where
        F: FnOnce() -> T + Send,
        T: Send,
    {
        let admitted = self.in_flight.fetch_add(1, Ordering::SeqCst);
        if admitted >= self.queue_depth {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            warn!(
                in_flight = admitted,
                queue_depth = self.queue_depth,
                "worker pool at capacity, rejecting request"
            );
            return Err(PackError::Overloaded {
                in_flight: admitted,
                queue_depth: self.queue_depth,
            });
        }
        let _guard = InFlightGuard(&self.in_flight);
        Ok(self.pool.install(job))
    }

    /// Computations currently admitted.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Worker threads backing the pool.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

/// Decrements the admission counter even if the job panics.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
