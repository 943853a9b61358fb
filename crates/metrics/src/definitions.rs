//! Metric name definitions.

/// Upload queue and drain loop metrics
pub mod queue {
    /// Total number of items appended to the upload queue
    pub const ITEMS_ENQUEUED_TOTAL: &str = "tgdrive_queue_items_enqueued_total";
    /// Current number of items waiting in the queue
    pub const DEPTH: &str = "tgdrive_queue_depth";
    /// Total number of drain cycles started
    pub const DRAIN_CYCLES_TOTAL: &str = "tgdrive_queue_drain_cycles_total";
    /// Total number of successful transfers
    pub const TRANSFERS_SUCCEEDED_TOTAL: &str = "tgdrive_queue_transfers_succeeded_total";
    /// Total number of failed transfers (fetch or upload)
    pub const TRANSFERS_FAILED_TOTAL: &str = "tgdrive_queue_transfers_failed_total";
    /// Total bytes stored remotely
    pub const BYTES_TRANSFERRED_TOTAL: &str = "tgdrive_queue_bytes_transferred_total";
    /// Time spent on one item, fetch through final notification
    pub const ITEM_DURATION_SECONDS: &str = "tgdrive_queue_item_duration_seconds";
}

/// Telegram front end metrics
pub mod telegram {
    /// Total number of inbound messages handled
    pub const MESSAGES_RECEIVED_TOTAL: &str = "tgdrive_telegram_messages_received_total";
    /// Total number of media items rejected before enqueue
    pub const MEDIA_REJECTED_TOTAL: &str = "tgdrive_telegram_media_rejected_total";
}

/// Histogram bucket boundaries
pub mod buckets {
    /// Per-item duration buckets (in seconds), 100ms to 10 minutes
    pub const ITEM_DURATION: &[f64] = &[
        0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0,
    ];
}
