use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

/// Opaque handle to remote content, resolved by a
/// [`SourceFetcher`](crate::SourceFetcher).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRef(String);

impl SourceRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where status messages for an item go back to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRef {
    /// Chat/peer ID to send notifications to.
    pub chat_id: String,
    /// Platform message ID to reply to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

impl ConversationRef {
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            reply_to: None,
        }
    }

    #[must_use]
    pub fn replying_to(mut self, message_id: impl Into<String>) -> Self {
        self.reply_to = Some(message_id.into());
        self
    }
}

/// Media as described by the front end, independent of its original kind
/// (document, photo, voice, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub source: SourceRef,
    pub name: String,
    pub content_type: String,
    /// Size reported by the chat platform, when known.
    pub size_bytes: Option<u64>,
}

/// One pending transfer. Immutable once built; the queue only ever removes
/// items.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    source: SourceRef,
    display_name: String,
    content_type: String,
    conversation: ConversationRef,
    enqueued_at: DateTime<Utc>,
}

impl QueueItem {
    pub fn new(media: MediaDescriptor, conversation: ConversationRef) -> Self {
        Self {
            source: media.source,
            display_name: media.name,
            content_type: media.content_type,
            conversation,
            enqueued_at: Utc::now(),
        }
    }

    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn conversation(&self) -> &ConversationRef {
        &self.conversation
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }
}
