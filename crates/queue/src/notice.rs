//! Status messages the drain loop sends back to a conversation.

use std::fmt;

use crate::{collab::TransferReceipt, stats::BYTES_PER_MEGABYTE};

#[derive(Debug, Clone, PartialEq)]
pub enum Notice<'a> {
    Started { name: &'a str },
    Succeeded { receipt: &'a TransferReceipt },
    Failed { reason: &'a str },
}

impl fmt::Display for Notice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { name } => write!(f, "⏳ Uploading {name}..."),
            Self::Succeeded { receipt } => write!(
                f,
                "✅ Upload successful!\n\n📁 File: {}\n🔗 Link: {}\n💾 Size: {:.2} MB",
                receipt.resolved_name,
                receipt.link,
                receipt.size_bytes as f64 / BYTES_PER_MEGABYTE,
            ),
            Self::Failed { reason } => write!(f, "❌ Upload failed: {reason}"),
        }
    }
}
