//! Bounded worker pool.
//!
//! The pool spawns one unit (a named OS thread) per task. Before doing any
//! work a unit takes a permit from the shared [`PermitSource`], so at most
//! `capacity` units are ever past the gate at once. The unit then hands its
//! task to a [`Substrate`]: the lightweight one searches in-process, the
//! isolated one ships the task to a child process and decodes the reply.
//! Matches go onto an unbounded channel, so a unit never waits on the reader
//! while holding its permit.
//!
//! `run` returns after every unit has been joined and every sender dropped,
//! which makes the returned [`ResultChannel`] safe to drain to completion.
//!
//! ```rust,ignore
//! let pool = BoundedWorkerPool::new(NonZeroUsize::new(3).unwrap());
//! let channel = pool.run(tasks, &substrate);
//! let results = collect(channel, "needle");
//! ```

pub mod isolated;
pub mod permit;
pub mod sink;
pub mod substrate;

pub use isolated::{serve, IsolatedSubstrate, WorkerRequest};
pub use permit::{Permit, PermitPool, PermitSource};
pub use sink::{result_channel, ResultChannel, ResultSender, ResultSink};
pub use substrate::{LightweightSubstrate, Substrate, SubstrateKind};

use std::num::NonZeroUsize;
use std::thread;
use tracing::{debug, error, info};

use crate::metrics::PoolMetrics;
use crate::search::SearchTask;

/// Runs independent search tasks with at most `capacity` in flight
pub struct BoundedWorkerPool {
    permits: Box<dyn PermitSource>,
    metrics: PoolMetrics,
}

impl BoundedWorkerPool {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self::with_permits(PermitPool::new(capacity))
    }

    /// Uses a custom permit source
    pub fn with_permits(permits: impl PermitSource + 'static) -> Self {
        Self {
            permits: Box::new(permits),
            metrics: PoolMetrics::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.permits.capacity()
    }

    pub fn metrics(&self) -> &PoolMetrics {
        &self.metrics
    }

    /// Runs every task to completion and returns the closed result channel
    pub fn run(&self, tasks: Vec<SearchTask>, substrate: &dyn Substrate) -> ResultChannel {
        let (sender, channel) = result_channel();
        info!(
            "Dispatching {} units on the {} substrate with {} permits",
            tasks.len(),
            substrate.name(),
            self.capacity()
        );

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(tasks.len());
            for (n, task) in tasks.into_iter().enumerate() {
                let path = task.path().to_path_buf();
                let sender = sender.clone();
                let spawned = thread::Builder::new()
                    .name(format!("scan-unit-{n}"))
                    .spawn_scoped(scope, move || self.run_unit(task, substrate, &sender));
                match spawned {
                    Ok(handle) => handles.push((path, handle)),
                    Err(e) => {
                        error!("Failed to start unit for {}: {}", path.display(), e);
                        self.metrics.record_fault();
                    }
                }
            }

            // Join barrier
            for (path, handle) in handles {
                if handle.join().is_err() {
                    error!("Unit for {} terminated abnormally", path.display());
                    self.metrics.record_fault();
                }
            }
        });

        drop(sender);
        self.metrics.log_stats();
        channel
    }

    fn run_unit(&self, task: SearchTask, substrate: &dyn Substrate, sink: &dyn ResultSink) {
        let permit = Permit::acquire(self.permits.as_ref());
        self.metrics
            .record_unit_started(permit.in_use_at_grant() as u64);
        debug!(
            "Unit for {} holds a permit ({} in use)",
            task.path().display(),
            permit.in_use_at_grant()
        );

        match substrate.execute(&task) {
            Ok(outcome) => {
                self.metrics.record_outcome(&outcome);
                if let Some(found) = outcome.into_match() {
                    if let Err(e) = sink.send(found) {
                        error!("Dropping match for {}: {}", task.path().display(), e);
                    }
                }
            }
            Err(e) => {
                error!("Unit for {} failed: {}", task.path().display(), e);
                self.metrics.record_fault();
            }
        }
    }
}

impl std::fmt::Debug for BoundedWorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedWorkerPool")
            .field("capacity", &self.capacity())
            .field("metrics", &self.metrics.get_stats())
            .finish()
    }
}
