//! Upload queue core for tgdrive.
//!
//! A single-flight, strictly ordered queue that relays media items from a
//! chat front end to a storage backend. The front end, the source fetcher and
//! the storage client plug in through the traits in [`collab`]; this crate
//! owns ordering, the drain loop, failure containment and statistics.

pub mod collab;
pub mod destination;
pub mod error;
pub mod item;
pub mod notice;
pub mod processor;
pub mod queue;
pub mod stats;

pub use {
    collab::{Notifier, SourceFetcher, TransferClient, TransferReceipt, TransferRequest},
    destination::Destination,
    error::{FetchError, NotifyError, TransferError},
    item::{ConversationRef, MediaDescriptor, QueueItem, SourceRef},
    notice::Notice,
    processor::{
        Enqueued, ProcessorConfig, ProcessorState, QueueProcessor, QueueStatus, TransferOutcome,
    },
    queue::UploadQueue,
    stats::{StatsAggregator, StatsSnapshot},
};
