use {
    teloxide::types::Message,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use tgdrive_metrics::{counter, telegram as tg_metrics};

use tgdrive_queue::{ConversationRef, MediaDescriptor, Notifier, QueueItem};

use crate::{
    access::{self, Sender},
    commands::{self, Command},
    error::Result,
    media::{self, Attachment},
    state::BotState,
};

/// The Bot API download ceiling is expressed in MiB.
const BYTES_PER_MEBIBYTE: u64 = 1024 * 1024;

/// Handle one inbound message: a command, a media item, or nothing.
pub async fn handle_message(msg: Message, state: &BotState) -> Result<()> {
    #[cfg(feature = "metrics")]
    counter!(tg_metrics::MESSAGES_RECEIVED_TOTAL).increment(1);

    let Some(user) = msg.from.as_ref() else {
        debug!(chat_id = msg.chat.id.0, "ignoring message without sender");
        return Ok(());
    };
    let user_id = user.id.0.to_string();
    let sender = Sender {
        user_id: &user_id,
        username: user.username.as_deref(),
    };

    if let Err(reason) = access::check_access(&state.config, sender) {
        debug!(chat_id = msg.chat.id.0, user_id = %user_id, %reason, "message dropped");
        return Ok(());
    }

    let chat_id = msg.chat.id.0;
    let conversation = ConversationRef::new(chat_id.to_string()).replying_to(msg.id.0.to_string());

    if let Some(cmd) = msg
        .text()
        .and_then(|text| commands::parse(text, state.bot_username.as_deref()))
    {
        debug!(chat_id, user_id = %user_id, command = ?cmd, "telegram command");
        let text = handle_command(cmd, chat_id, sender, &user.first_name, state);
        reply(state, &conversation, &text).await;
        return Ok(());
    }

    match media::describe(&msg) {
        Attachment::Media(descriptor) => {
            handle_media(descriptor, chat_id, &conversation, state).await;
        },
        Attachment::Unsupported(kind) => {
            info!(chat_id, user_id = %user_id, kind, "unsupported attachment");
            #[cfg(feature = "metrics")]
            counter!(tg_metrics::MEDIA_REJECTED_TOTAL, "reason" => "unsupported").increment(1);
            reply(state, &conversation, commands::UNSUPPORTED_MEDIA).await;
        },
        Attachment::None => {
            debug!(chat_id, user_id = %user_id, "ignoring non-media message");
        },
    }
    Ok(())
}

/// Run a command and return the reply text.
pub fn handle_command(
    cmd: Command,
    chat_id: i64,
    sender: Sender<'_>,
    first_name: &str,
    state: &BotState,
) -> String {
    let admin = access::is_admin(&state.config, sender);
    if cmd.admin_only() && !admin {
        return commands::ADMIN_ONLY.to_string();
    }

    let processor = &state.processor;
    match cmd {
        Command::Start => commands::welcome_text(first_name, admin),
        Command::Help => commands::help_text(state.config.max_file_size_mb),
        Command::Queue => commands::queue_text(&processor.status(state.config.preview_limit)),
        Command::Stats => commands::stats_text(&processor.stats(), processor.queue().len()),
        Command::Bulk => {
            state.bulk.start(chat_id);
            info!(chat_id, "bulk mode started");
            commands::bulk_started_text().to_string()
        },
        Command::Done => {
            let collected = state.bulk.finish(chat_id);
            info!(chat_id, ?collected, "bulk mode finished");
            commands::bulk_finished_text(collected)
        },
        Command::ClearQueue => commands::cleared_text(processor.clear()),
        Command::SetFolder(None) => commands::set_folder_text(None),
        Command::SetFolder(Some(folder)) => {
            let previous = processor.destination().set(folder.clone());
            info!(chat_id, folder = %folder, ?previous, "destination folder changed");
            commands::set_folder_text(Some(&folder))
        },
        Command::Folder => commands::folder_text(processor.destination().get().as_deref()),
    }
}

/// Enqueue a media item and acknowledge it, then let the processor start.
///
/// The acknowledgement goes out before activation so the chat sees "Added to
/// queue" ahead of the first progress notice.
pub async fn handle_media(
    descriptor: MediaDescriptor,
    chat_id: i64,
    conversation: &ConversationRef,
    state: &BotState,
) {
    let limit_mb = state.config.max_file_size_mb;
    if let Some(size) = descriptor.size_bytes
        && size > limit_mb.saturating_mul(BYTES_PER_MEBIBYTE)
    {
        info!(chat_id, name = %descriptor.name, size, limit_mb, "media above size limit");
        #[cfg(feature = "metrics")]
        counter!(tg_metrics::MEDIA_REJECTED_TOTAL, "reason" => "too_large").increment(1);
        let text = commands::too_large_text(&descriptor.name, size, limit_mb);
        reply(state, conversation, &text).await;
        return;
    }

    let name = descriptor.name.clone();
    let size = descriptor.size_bytes;
    let position = state
        .processor
        .enqueue(QueueItem::new(descriptor, conversation.clone()));

    if state.bulk.record(chat_id) {
        debug!(chat_id, name = %name, position, "bulk item queued");
    } else {
        let text = commands::enqueued_text(&name, position, size);
        reply(state, conversation, &text).await;
    }
    state.processor.activate();
}

async fn reply(state: &BotState, conversation: &ConversationRef, text: &str) {
    if let Err(e) = state.notifier.send(conversation, text).await {
        warn!(chat_id = %conversation.chat_id, error = %e, "failed to send telegram reply");
    }
}
