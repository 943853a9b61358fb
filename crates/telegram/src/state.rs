use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use {teloxide::Bot, tokio_util::sync::CancellationToken};

use {tgdrive_config::TelegramConfig, tgdrive_queue::QueueProcessor};

use crate::notifier::TelegramNotifier;

/// Runtime state shared by the polling loop and the handlers.
pub struct BotState {
    pub bot: Bot,
    pub bot_username: Option<String>,
    pub config: TelegramConfig,
    pub processor: Arc<QueueProcessor>,
    pub notifier: TelegramNotifier,
    pub cancel: CancellationToken,
    pub bulk: BulkSessions,
}

/// Chats in bulk collection mode, with the number of items collected so far.
///
/// Plain `std::sync::Mutex`: every operation is a map lookup, never held
/// across `.await`.
#[derive(Debug, Default)]
pub struct BulkSessions {
    chats: Mutex<HashMap<i64, usize>>,
}

impl BulkSessions {
    /// Enter bulk mode. Restarting an active session resets its count.
    pub fn start(&self, chat_id: i64) {
        self.chats
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(chat_id, 0);
    }

    /// Leave bulk mode, returning the collected count if the chat was in it.
    pub fn finish(&self, chat_id: i64) -> Option<usize> {
        self.chats
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&chat_id)
    }

    /// Count one item for the chat. Returns `false` when not in bulk mode.
    pub fn record(&self, chat_id: i64) -> bool {
        let mut chats = self.chats.lock().unwrap_or_else(|e| e.into_inner());
        match chats.get_mut(&chat_id) {
            Some(count) => {
                *count += 1;
                true
            },
            None => false,
        }
    }

    pub fn is_active(&self, chat_id: i64) -> bool {
        self.chats
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&chat_id)
    }
}
