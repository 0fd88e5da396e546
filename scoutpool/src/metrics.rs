use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::search::TaskOutcome;

/// Counters for one pool run, shared by every unit
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    units_started: Arc<AtomicU64>,
    matched: Arc<AtomicU64>,
    missed: Arc<AtomicU64>,
    unreadable: Arc<AtomicU64>,
    faulted: Arc<AtomicU64>,
    peak_permits: Arc<AtomicU64>,
}

impl PoolMetrics {
    pub fn new() -> Self {
        Self {
            units_started: Arc::new(AtomicU64::new(0)),
            matched: Arc::new(AtomicU64::new(0)),
            missed: Arc::new(AtomicU64::new(0)),
            unreadable: Arc::new(AtomicU64::new(0)),
            faulted: Arc::new(AtomicU64::new(0)),
            peak_permits: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a unit passing the permit gate with `in_use` permits now taken
    pub fn record_unit_started(&self, in_use: u64) {
        self.units_started.fetch_add(1, Ordering::Relaxed);
        let mut peak = self.peak_permits.load(Ordering::Relaxed);
        while in_use > peak {
            match self.peak_permits.compare_exchange_weak(
                peak,
                in_use,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => peak = current,
            }
        }
    }

    /// Records how a unit ended
    pub fn record_outcome(&self, outcome: &TaskOutcome) {
        let counter = match outcome {
            TaskOutcome::Matched(_) => &self.matched,
            TaskOutcome::Missed { .. } => &self.missed,
            TaskOutcome::Unreadable { .. } => &self.unreadable,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a unit that died without an outcome
    pub fn record_fault(&self) {
        self.faulted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> PoolStats {
        PoolStats {
            units_started: self.units_started.load(Ordering::Relaxed),
            matched: self.matched.load(Ordering::Relaxed),
            missed: self.missed.load(Ordering::Relaxed),
            unreadable: self.unreadable.load(Ordering::Relaxed),
            faulted: self.faulted.load(Ordering::Relaxed),
            peak_permits: self.peak_permits.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        debug!(
            "Pool stats:\n\
             Units started: {}\n\
             Matched/missed/unreadable/faulted: {}/{}/{}/{}\n\
             Peak permits in use: {}",
            stats.units_started,
            stats.matched,
            stats.missed,
            stats.unreadable,
            stats.faulted,
            stats.peak_permits
        );
    }
}

impl Default for PoolMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of [`PoolMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub units_started: u64,
    pub matched: u64,
    pub missed: u64,
    pub unreadable: u64,
    pub faulted: u64,
    pub peak_permits: u64,
}

impl PoolStats {
    /// Units that reached an end state, with or without an outcome
    pub fn units_finished(&self) -> u64 {
        self.matched + self.missed + self.unreadable + self.faulted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::MatchResult;
    use std::path::PathBuf;

    #[test]
    fn test_peak_tracking() {
        let metrics = PoolMetrics::new();
        metrics.record_unit_started(1);
        metrics.record_unit_started(3);
        metrics.record_unit_started(2);
        let stats = metrics.get_stats();
        assert_eq!(stats.units_started, 3);
        assert_eq!(stats.peak_permits, 3);
    }

    #[test]
    fn test_outcome_counters() {
        let metrics = PoolMetrics::new();
        metrics.record_outcome(&TaskOutcome::Matched(MatchResult {
            path: PathBuf::from("a.txt"),
            index: 0,
        }));
        metrics.record_outcome(&TaskOutcome::Missed {
            path: PathBuf::from("b.txt"),
        });
        metrics.record_outcome(&TaskOutcome::Unreadable {
            path: PathBuf::from("c.txt"),
            reason: "gone".to_string(),
        });
        metrics.record_fault();

        let stats = metrics.get_stats();
        assert_eq!(stats.matched, 1);
        assert_eq!(stats.missed, 1);
        assert_eq!(stats.unreadable, 1);
        assert_eq!(stats.faulted, 1);
        assert_eq!(stats.units_finished(), 4);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = PoolMetrics::new();
        let clone = metrics.clone();
        clone.record_fault();
        assert_eq!(metrics.get_stats().faulted, 1);
    }
}
