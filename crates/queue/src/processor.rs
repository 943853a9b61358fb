//! The drain loop: single-flight, strictly ordered processing of the upload
//! queue.

use std::{
    any::Any,
    panic::AssertUnwindSafe,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use {
    futures::FutureExt,
    serde::Serialize,
    tokio::sync::Notify,
    tracing::{debug, error, info, warn},
};

#[cfg(feature = "metrics")]
use tgdrive_metrics::{counter, gauge, histogram, queue as queue_metrics};

use crate::{
    collab::{Notifier, SourceFetcher, TransferClient, TransferReceipt, TransferRequest},
    destination::Destination,
    item::{ConversationRef, QueueItem},
    notice::Notice,
    queue::UploadQueue,
    stats::{StatsAggregator, StatsSnapshot},
};

/// Default pause between two items, as a courtesy to the storage API.
pub const DEFAULT_INTER_ITEM_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Pause after each item before the next one is dequeued.
    pub inter_item_delay: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            inter_item_delay: DEFAULT_INTER_ITEM_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorState {
    Idle,
    Draining,
}

/// Result of one attempted transfer. Consumed right away, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Success(TransferReceipt),
    Failure { reason: String },
}

/// Feedback for the caller of [`QueueProcessor::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enqueued {
    /// 1-based position in the queue at the time of the append.
    pub position: usize,
    /// Whether this submission woke an idle processor.
    pub activated: bool,
}

/// Queue view for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub length: usize,
    /// Display names of the oldest items, in arrival order.
    pub preview: Vec<String>,
    /// Items not covered by `preview`.
    pub remaining: usize,
}

/// Drains an [`UploadQueue`] one item at a time.
///
/// At most one drain loop runs at any moment. [`submit`](Self::submit) is a
/// plain append plus an atomic Idle → Draining transition; only the
/// submission that wins that transition spawns a loop. The loop runs until it
/// observes an empty queue, and no single item can end it early.
pub struct QueueProcessor {
    queue: UploadQueue,
    stats: StatsAggregator,
    destination: Destination,
    fetcher: Arc<dyn SourceFetcher>,
    transfer: Arc<dyn TransferClient>,
    notifier: Arc<dyn Notifier>,
    config: ProcessorConfig,
    draining: AtomicBool,
    drains_started: AtomicU64,
    drains_finished: AtomicU64,
    idle: Notify,
}

impl QueueProcessor {
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        transfer: Arc<dyn TransferClient>,
        notifier: Arc<dyn Notifier>,
        destination: Destination,
        config: ProcessorConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            queue: UploadQueue::new(),
            stats: StatsAggregator::new(),
            destination,
            fetcher,
            transfer,
            notifier,
            config,
            draining: AtomicBool::new(false),
            drains_started: AtomicU64::new(0),
            drains_finished: AtomicU64::new(0),
            idle: Notify::new(),
        })
    }

    /// Append an item and start draining if the processor was idle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(self: &Arc<Self>, item: QueueItem) -> Enqueued {
        let position = self.enqueue(item);
        Enqueued {
            position,
            activated: self.activate(),
        }
    }

    /// Append an item without starting a drain. Returns its 1-based position.
    ///
    /// Pair with [`activate`](Self::activate) when the caller has work to do
    /// (such as acknowledging the item) before processing may begin.
    pub fn enqueue(&self, item: QueueItem) -> usize {
        let name = item.display_name().to_string();
        let position = self.queue.enqueue(item);

        #[cfg(feature = "metrics")]
        {
            counter!(queue_metrics::ITEMS_ENQUEUED_TOTAL).increment(1);
            gauge!(queue_metrics::DEPTH).set(self.queue.len() as f64);
        }

        debug!(item = %name, position, "item enqueued");
        position
    }

    /// Spawn a drain loop if the processor is idle and has pending items.
    /// Returns whether this call started one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn activate(self: &Arc<Self>) -> bool {
        if self.queue.is_empty() || !self.try_activate() {
            return false;
        }
        let this = Arc::clone(self);
        tokio::spawn(async move { this.drain().await });
        true
    }

    pub fn state(&self) -> ProcessorState {
        if self.draining.load(Ordering::Acquire) {
            ProcessorState::Draining
        } else {
            ProcessorState::Idle
        }
    }

    pub fn queue(&self) -> &UploadQueue {
        &self.queue
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Length plus the names of up to `limit` items from the head.
    pub fn status(&self, limit: usize) -> QueueStatus {
        let (length, head) = self.queue.snapshot(limit);
        let preview: Vec<String> = head
            .iter()
            .map(|item| item.display_name().to_string())
            .collect();
        QueueStatus {
            length,
            remaining: length.saturating_sub(preview.len()),
            preview,
        }
    }

    /// Discard every item not yet dequeued. An in-flight item still finishes.
    pub fn clear(&self) -> usize {
        let removed = self.queue.clear();
        #[cfg(feature = "metrics")]
        gauge!(queue_metrics::DEPTH).set(0.0);
        info!(removed, "upload queue cleared");
        removed
    }

    /// Number of drain cycles started and finished so far.
    pub fn drain_cycles(&self) -> (u64, u64) {
        (
            self.drains_started.load(Ordering::Acquire),
            self.drains_finished.load(Ordering::Acquire),
        )
    }

    /// Resolve once the processor is idle with an empty queue. Items added
    /// with [`enqueue`](Self::enqueue) need an [`activate`](Self::activate)
    /// first.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if !self.draining.load(Ordering::Acquire) && self.queue.is_empty() {
                return;
            }
            notified.await;
        }
    }

    fn try_activate(&self) -> bool {
        let won = self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.drains_started.fetch_add(1, Ordering::AcqRel);
            #[cfg(feature = "metrics")]
            counter!(queue_metrics::DRAIN_CYCLES_TOTAL).increment(1);
        }
        won
    }

    async fn drain(self: Arc<Self>) {
        info!("started queue processing");
        loop {
            while let Some(item) = self.queue.dequeue_front() {
                #[cfg(feature = "metrics")]
                gauge!(queue_metrics::DEPTH).set(self.queue.len() as f64);

                self.run_item(item).await;
                if !self.config.inter_item_delay.is_zero() {
                    tokio::time::sleep(self.config.inter_item_delay).await;
                }
            }

            self.drains_finished.fetch_add(1, Ordering::AcqRel);
            self.draining.store(false, Ordering::Release);
            self.idle.notify_waiters();

            // An append that landed between the empty check and the store
            // above saw Draining and did not spawn. Pick it up here unless a
            // newer submission already took over.
            if self.queue.is_empty() || !self.try_activate() {
                break;
            }
            debug!("items arrived while going idle, continuing");
        }
        info!("queue processing completed");
    }

    async fn run_item(&self, item: QueueItem) {
        let name = item.display_name();
        #[cfg(feature = "metrics")]
        let started = std::time::Instant::now();

        let outcome = match AssertUnwindSafe(self.attempt(&item)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let reason = panic_reason(panic.as_ref());
                error!(item = %name, reason, "upload attempt panicked");
                TransferOutcome::Failure { reason }
            },
        };

        match &outcome {
            TransferOutcome::Success(receipt) => {
                self.stats.record_success(receipt.size_bytes);
                info!(
                    item = %name,
                    remote_id = %receipt.remote_id,
                    size_bytes = receipt.size_bytes,
                    "upload succeeded"
                );
                #[cfg(feature = "metrics")]
                {
                    counter!(queue_metrics::TRANSFERS_SUCCEEDED_TOTAL).increment(1);
                    counter!(queue_metrics::BYTES_TRANSFERRED_TOTAL).increment(receipt.size_bytes);
                }
                self.notify(item.conversation(), Notice::Succeeded { receipt })
                    .await;
            },
            TransferOutcome::Failure { reason } => {
                self.stats.record_failure();
                warn!(item = %name, reason, "upload failed");
                #[cfg(feature = "metrics")]
                counter!(queue_metrics::TRANSFERS_FAILED_TOTAL).increment(1);
                self.notify(item.conversation(), Notice::Failed { reason })
                    .await;
            },
        }

        #[cfg(feature = "metrics")]
        histogram!(queue_metrics::ITEM_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
    }

    /// Fetch then upload one item. The payload moves into the transfer
    /// request and is dropped when the upload returns.
    async fn attempt(&self, item: &QueueItem) -> TransferOutcome {
        self.notify(item.conversation(), Notice::Started {
            name: item.display_name(),
        })
        .await;

        let data = match self.fetcher.fetch(item.source()).await {
            Ok(data) => data,
            Err(e) => {
                warn!(item = %item.display_name(), source = %item.source(), error = %e, "fetch failed");
                return TransferOutcome::Failure {
                    reason: e.to_string(),
                };
            },
        };
        debug!(item = %item.display_name(), bytes = data.len(), "fetched source");

        let request = TransferRequest {
            data,
            name: item.display_name().to_string(),
            content_type: item.content_type().to_string(),
            destination: self.destination.get(),
        };
        match self.transfer.upload(request).await {
            Ok(receipt) => TransferOutcome::Success(receipt),
            Err(e) => TransferOutcome::Failure {
                reason: e.to_string(),
            },
        }
    }

    async fn notify(&self, conversation: &ConversationRef, notice: Notice<'_>) {
        let text = notice.to_string();
        match AssertUnwindSafe(self.notifier.send(conversation, &text))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {},
            Ok(Err(e)) => {
                warn!(chat_id = %conversation.chat_id, error = %e, "failed to send notification");
            },
            Err(panic) => {
                warn!(
                    chat_id = %conversation.chat_id,
                    reason = panic_reason(panic.as_ref()),
                    "notifier panicked"
                );
            },
        }
    }
}

fn panic_reason(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected internal error".to_string()
    }
}
