//! Metrics collection and export for tgdrive.
//!
//! Metric names live in one place so dashboards and code agree. Recording goes
//! through the `metrics` crate facade; when the `prometheus` feature is
//! enabled, [`init_metrics`] installs a Prometheus exporter.
//!
//! ```rust,ignore
//! use tgdrive_metrics::{counter, queue};
//!
//! counter!(queue::ITEMS_ENQUEUED_TOTAL).increment(1);
//! ```

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{MetricsRecorderConfig, init_metrics},
};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
