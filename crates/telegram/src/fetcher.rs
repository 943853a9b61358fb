use {
    async_trait::async_trait,
    bytes::Bytes,
    teloxide::{ApiError, RequestError, prelude::*},
    tracing::debug,
};

use tgdrive_queue::{FetchError, SourceFetcher, SourceRef};

/// Downloads Telegram files into memory by file ID.
#[derive(Clone)]
pub struct TelegramFetcher {
    bot: Bot,
    http: reqwest::Client,
}

impl TelegramFetcher {
    pub fn new(bot: Bot) -> Self {
        Self {
            bot,
            http: reqwest::Client::new(),
        }
    }

    /// `{api}/file/bot<token>/<path>`, honoring a custom API URL.
    fn download_url(&self, file_path: &str) -> String {
        let api_url = self.bot.api_url();
        format!(
            "{}/file/bot{}/{}",
            api_url.as_str().trim_end_matches('/'),
            self.bot.token(),
            file_path
        )
    }
}

#[async_trait]
impl SourceFetcher for TelegramFetcher {
    async fn fetch(&self, source: &SourceRef) -> Result<Bytes, FetchError> {
        let file = self
            .bot
            .get_file(source.as_str())
            .await
            .map_err(fetch_error)?;

        let response = self
            .http
            .get(self.download_url(&file.path))
            .send()
            .await
            .map_err(|e| FetchError::external("download telegram file", e))?;
        if !response.status().is_success() {
            return Err(FetchError::unavailable(format!(
                "failed to download file: HTTP {}",
                response.status()
            )));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| FetchError::external("read telegram file", e))?;
        debug!(file_id = %source, bytes = data.len(), "telegram file downloaded");
        Ok(data)
    }
}

fn fetch_error(error: RequestError) -> FetchError {
    match error {
        // "file is too big", expired or unknown file IDs.
        RequestError::Api(ApiError::Unknown(description)) => FetchError::unavailable(description),
        RequestError::Api(api) => FetchError::unavailable(api.to_string()),
        other => FetchError::external("telegram get_file", other),
    }
}
