use std::{future::Future, time::Duration};

use {
    async_trait::async_trait,
    teloxide::{
        RequestError,
        payloads::SendMessageSetters,
        prelude::*,
        types::{MessageId, ReplyParameters},
    },
    tracing::{debug, warn},
};

use tgdrive_queue::{ConversationRef, Notifier, NotifyError};

const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

/// Sends plain-text status messages back to the originating chat.
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, conversation: &ConversationRef, text: &str) -> Result<(), NotifyError> {
        let chat_id = conversation
            .chat_id
            .parse::<i64>()
            .map(ChatId)
            .map_err(|e| NotifyError::external("invalid chat id", e))?;
        let reply = parse_reply_params(conversation.reply_to.as_deref());

        run_with_retry(&conversation.chat_id, "send_message", || {
            let mut req = self.bot.send_message(chat_id, text);
            if let Some(rp) = reply.clone() {
                req = req.reply_parameters(rp);
            }
            async move { req.await }
        })
        .await
        .map_err(|e| NotifyError::external("telegram send_message", e))?;

        debug!(chat_id = %conversation.chat_id, text_len = text.len(), "telegram notice sent");
        Ok(())
    }
}

/// Run a Bot API request, sleeping through `RetryAfter` answers.
pub(crate) async fn run_with_retry<T, F, Fut>(
    chat_id: &str,
    operation: &'static str,
    mut request: F,
) -> Result<T, RequestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RequestError>>,
{
    let mut retries = 0usize;

    loop {
        match request().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let Some(wait) = retry_after_duration(&err) else {
                    return Err(err);
                };

                if retries >= TELEGRAM_RETRY_AFTER_MAX_RETRIES {
                    warn!(
                        chat_id,
                        operation,
                        retries,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limit persisted after retries"
                    );
                    return Err(err);
                }

                retries += 1;
                warn!(
                    chat_id,
                    operation,
                    retries,
                    max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                    retry_after_secs = wait.as_secs(),
                    "telegram rate limited, waiting before retry"
                );
                tokio::time::sleep(wait).await;
            },
        }
    }
}

/// Telegram message IDs are i32; anything else is dropped.
fn parse_reply_params(reply_to: Option<&str>) -> Option<ReplyParameters> {
    reply_to
        .and_then(|id| id.parse::<i32>().ok())
        .map(|id| ReplyParameters::new(MessageId(id)).allow_sending_without_reply())
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use {
        super::*,
        crate::testing::MockTelegramApi,
        teloxide::types::Seconds,
    };

    #[test]
    fn retry_after_duration_extracts_wait() {
        let err = RequestError::RetryAfter(Seconds::from_seconds(42));
        assert_eq!(retry_after_duration(&err), Some(Duration::from_secs(42)));
    }

    #[test]
    fn retry_after_duration_ignores_other_errors() {
        let err = RequestError::Io(std::io::Error::other("boom"));
        assert_eq!(retry_after_duration(&err), None);
    }

    #[test]
    fn reply_params_require_numeric_id() {
        assert!(parse_reply_params(Some("17")).is_some());
        assert!(parse_reply_params(Some("abc")).is_none());
        assert!(parse_reply_params(None).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_rate_limited_requests() {
        let calls = AtomicUsize::new(0);
        let result = run_with_retry("42", "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(RequestError::RetryAfter(Seconds::from_seconds(1)))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = run_with_retry("42", "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(RequestError::RetryAfter(Seconds::from_seconds(1))) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(
            calls.load(Ordering::SeqCst),
            TELEGRAM_RETRY_AFTER_MAX_RETRIES + 1
        );
    }

    #[tokio::test]
    async fn sends_reply_to_originating_message() {
        let api = MockTelegramApi::start().await;
        let notifier = TelegramNotifier::new(api.bot());

        notifier
            .send(&ConversationRef::new("42").replying_to("7"), "⏳ Uploading a.pdf...")
            .await
            .unwrap();

        let sent = api.sent_messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, 42);
        assert_eq!(sent[0].text, "⏳ Uploading a.pdf...");
        assert_eq!(sent[0].reply_to, Some(7));
        assert!(sent[0].parse_mode.is_none());
        api.shutdown().await;
    }

    #[tokio::test]
    async fn invalid_chat_id_is_an_error() {
        let notifier = TelegramNotifier::new(Bot::new("test-token"));
        let err = notifier
            .send(&ConversationRef::new("not-a-chat"), "hi")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid chat id"));
    }
}
