use std::{sync::Arc, time::Duration};

use {
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, UpdateKind},
    },
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use {tgdrive_config::TelegramConfig, tgdrive_queue::QueueProcessor};

use crate::{
    commands,
    error::Result,
    handlers,
    notifier::TelegramNotifier,
    state::{BotState, BulkSessions},
};

/// Pause after a failed `getUpdates` call.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Build a bot whose HTTP client outlives the long-polling timeout, so
/// requests are not aborted before Telegram answers.
pub fn build_bot(token: &str, poll_timeout_secs: u32) -> Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(u64::from(poll_timeout_secs) + 15))
        .build()?;
    Ok(Bot::with_client(token, client))
}

/// Verify the token, clear any webhook and register the command list.
pub async fn connect(
    bot: Bot,
    config: TelegramConfig,
    processor: Arc<QueueProcessor>,
) -> Result<Arc<BotState>> {
    let me = bot.get_me().await?;
    let bot_username = me.username.clone();

    // Long polling does not work while a webhook is set.
    bot.delete_webhook().send().await?;

    if let Err(e) = bot.set_my_commands(commands::bot_commands()).await {
        warn!("failed to register bot commands: {e}");
    }

    info!(
        username = ?bot_username,
        admins = config.admins.len(),
        "telegram bot connected (webhook cleared)"
    );

    Ok(Arc::new(BotState {
        notifier: TelegramNotifier::new(bot.clone()),
        bot,
        bot_username,
        config,
        processor,
        cancel: CancellationToken::new(),
        bulk: BulkSessions::default(),
    }))
}

/// Spawn the long-polling loop. It runs until `state.cancel` is cancelled or
/// another instance takes over the token.
pub fn spawn_polling(state: Arc<BotState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("starting telegram polling loop");
        let cancel = state.cancel.clone();
        let timeout = state.config.poll_timeout_secs;
        let mut offset: i32 = 0;

        loop {
            let result = tokio::select! {
                () = cancel.cancelled() => break,
                result = state
                    .bot
                    .get_updates()
                    .offset(offset)
                    .timeout(timeout)
                    .allowed_updates(vec![AllowedUpdate::Message])
                    .send() => result,
            };

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                let chat_id = msg.chat.id.0;
                                if let Err(e) = handlers::handle_message(msg, &state).await {
                                    error!(chat_id, error = %e, "error handling telegram message");
                                }
                            },
                            other => {
                                debug!("ignoring non-message update: {other:?}");
                            },
                        }
                    }
                },
                Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                    warn!(
                        "telegram polling disabled: another instance is already running with this token"
                    );
                    cancel.cancel();
                    break;
                },
                Err(e) => {
                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(POLL_ERROR_BACKOFF) => {},
                    }
                },
            }
        }
        info!("telegram polling stopped");
    })
}
