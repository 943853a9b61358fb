//! Google Drive storage backend.
//!
//! Implements [`TransferClient`](tgdrive_queue::TransferClient) on top of the
//! Drive v3 resumable upload protocol. Token minting is out of scope: a
//! [`TokenSource`] hands over an already valid OAuth access token.

pub mod client;
pub mod token;
mod types;

pub use {
    client::{DEFAULT_API_BASE, DriveClient, DriveClientConfig},
    token::{StaticToken, TokenSource},
};
