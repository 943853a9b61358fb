//! Contracts for the collaborators the drain loop calls out to.

use {async_trait::async_trait, bytes::Bytes, serde::Serialize};

use crate::{
    error::{FetchError, NotifyError, TransferError},
    item::{ConversationRef, SourceRef},
};

/// Retrieves the raw content behind a [`SourceRef`] into memory.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, source: &SourceRef) -> Result<Bytes, FetchError>;
}

/// One upload handed to a [`TransferClient`]. The client takes ownership of
/// the payload, so it is released as soon as the upload call returns.
#[derive(Debug)]
pub struct TransferRequest {
    pub data: Bytes,
    pub name: String,
    pub content_type: String,
    /// Destination folder/bucket identifier. `None` when unset.
    pub destination: Option<String>,
}

/// What the storage backend reports for a completed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub remote_id: String,
    pub resolved_name: String,
    pub link: String,
    pub size_bytes: u64,
}

/// Uploads a payload to remote storage.
#[async_trait]
pub trait TransferClient: Send + Sync {
    async fn upload(&self, request: TransferRequest) -> Result<TransferReceipt, TransferError>;
}

/// Delivers a status message to a conversation. Best-effort: the processor
/// logs failures and moves on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, conversation: &ConversationRef, text: &str) -> Result<(), NotifyError>;
}
