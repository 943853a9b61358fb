use std::sync::Mutex;

use serde::Serialize;

/// Bytes per reported megabyte.
pub const BYTES_PER_MEGABYTE: f64 = 1e6;

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    total_attempts: u64,
    succeeded: u64,
    failed: u64,
    total_megabytes: f64,
}

/// Point-in-time copy of the transfer counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total_attempts: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub total_megabytes: f64,
    /// `succeeded / total_attempts`, or 0 before the first attempt.
    pub success_rate: f64,
}

/// Running transfer counters, process-wide and monotonically growing.
///
/// Only the active drain loop records outcomes. Each record updates every
/// counter under one lock so a snapshot always satisfies
/// `total_attempts == succeeded + failed`.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    counters: Mutex<Counters>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, size_bytes: u64) {
        let mut c = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        c.total_attempts += 1;
        c.succeeded += 1;
        c.total_megabytes += size_bytes as f64 / BYTES_PER_MEGABYTE;
    }

    pub fn record_failure(&self) {
        let mut c = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        c.total_attempts += 1;
        c.failed += 1;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let c = *self.counters.lock().unwrap_or_else(|e| e.into_inner());
        let success_rate = if c.total_attempts == 0 {
            0.0
        } else {
            c.succeeded as f64 / c.total_attempts as f64
        };
        StatsSnapshot {
            total_attempts: c.total_attempts,
            succeeded: c.succeeded,
            failed: c.failed,
            total_megabytes: c.total_megabytes,
            success_rate,
        }
    }
}
