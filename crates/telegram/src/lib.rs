//! Telegram front end for tgdrive.
//!
//! Long-polls the Bot API with teloxide, turns media messages into queue
//! items and answers the bot's slash commands. Also provides the
//! [`TelegramFetcher`] and [`TelegramNotifier`] collaborators the queue
//! processor uses to download files and report progress.

pub mod access;
pub mod bot;
pub mod commands;
pub mod error;
pub mod fetcher;
pub mod handlers;
pub mod media;
pub mod notifier;
pub mod state;

#[cfg(test)]
mod testing;

pub use {
    bot::{build_bot, connect, spawn_polling},
    error::{Error, Result},
    fetcher::TelegramFetcher,
    notifier::TelegramNotifier,
    state::BotState,
};
