//! Pool-wide counters.
//!
//! Counters are shared between the coordinator and the unit threads; they
//! hold bookkeeping only, never task data.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct PoolMetrics {
    dispatched: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
    units_spawned: AtomicU64,
    units_retired: AtomicU64,
    units_idle_terminated: AtomicU64,
    peak_live: Mutex<BTreeMap<String, usize>>,
}

/// Point-in-time copy of [`PoolMetrics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct PoolMetricsSnapshot {
    pub dispatched: u64,
    pub completed: u64,
    pub failed: u64,
    /// Tasks answered unrun because their unit was retired first.
    pub rejected: u64,
    pub units_spawned: u64,
    pub units_retired: u64,
    pub units_idle_terminated: u64,
    pub peak_live: BTreeMap<String, usize>,
}

impl PoolMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_dispatch(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_completion(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejection(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retirement(&self) {
        self.units_retired.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_idle_termination(&self) {
        self.units_idle_terminated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_spawn(&self, task_type: &str, live: usize) {
        self.units_spawned.fetch_add(1, Ordering::Relaxed);
        let mut peak = self.peak_live.lock().unwrap_or_else(|e| e.into_inner());
        let entry = peak.entry(task_type.to_owned()).or_insert(0);
        *entry = (*entry).max(live);
    }

    /// Highest number of simultaneously pooled units seen for `task_type`.
    #[must_use]
    pub fn peak_live(&self, task_type: &str) -> usize {
        let peak = self.peak_live.lock().unwrap_or_else(|e| e.into_inner());
        peak.get(task_type).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn snapshot(&self) -> PoolMetricsSnapshot {
        PoolMetricsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            units_spawned: self.units_spawned.load(Ordering::Relaxed),
            units_retired: self.units_retired.load(Ordering::Relaxed),
            units_idle_terminated: self.units_idle_terminated.load(Ordering::Relaxed),
            peak_live: self
                .peak_live
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
        }
    }
}
