use std::error::Error as StdError;

/// The source content of a queue item could not be retrieved.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The source reference no longer resolves to downloadable content.
    #[error("source unavailable: {reason}")]
    Unavailable { reason: String },

    /// Wrapped source error from the fetch backend.
    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl FetchError {
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

/// The storage backend rejected or failed an upload.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// The remote API answered with an error. `reason` is shown to the user
    /// verbatim.
    #[error("{reason}")]
    Rejected { status: Option<u16>, reason: String },

    /// Wrapped transport error.
    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl TransferError {
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            status: None,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn with_status(status: u16, reason: impl Into<String>) -> Self {
        Self::Rejected {
            status: Some(status),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

/// A status message could not be delivered. Always swallowed by the
/// processor.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("{message}")]
    Message { message: String },

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl NotifyError {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
