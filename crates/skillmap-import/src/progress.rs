//! Throttled progress persistence gate.
//!
//! Bounds checkpoint writes to at most one per N rows or T elapsed,
//! whichever comes first. The orchestrator's final write bypasses the gate.

use std::time::{Duration, Instant};

use skillmap_core::defaults;

/// Count/time gate deciding when a progress snapshot is worth persisting.
#[derive(Debug)]
pub struct ProgressGate {
    every_rows: i64,
    min_interval: Duration,
    last_count: i64,
    last_write: Instant,
}

impl ProgressGate {
    pub fn new() -> Self {
        Self::with_config(
            defaults::PROGRESS_EVERY_ROWS,
            Duration::from_secs(defaults::PROGRESS_EVERY_SECS),
        )
    }

    pub fn with_config(every_rows: i64, min_interval: Duration) -> Self {
        Self {
            every_rows: every_rows.max(1),
            min_interval,
            last_count: 0,
            last_write: Instant::now(),
        }
    }

    /// Whether `processed` rows warrant a checkpoint now. Call
    /// [`ProgressGate::written`] after the write succeeds.
    pub fn should_persist(&self, processed: i64) -> bool {
        processed - self.last_count >= self.every_rows
            || self.last_write.elapsed() >= self.min_interval
    }

    /// Record that a checkpoint at `processed` rows was persisted.
    pub fn written(&mut self, processed: i64) {
        self.last_count = processed;
        self.last_write = Instant::now();
    }
}

impl Default for ProgressGate {
    fn default() -> Self {
        Self::new()
    }
}
