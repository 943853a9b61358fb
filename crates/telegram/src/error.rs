use thiserror::Error;

/// Failures while connecting to or talking with the Bot API.
#[derive(Debug, Error)]
pub enum Error {
    #[error("telegram api: {0}")]
    Api(#[from] teloxide::RequestError),

    #[error("telegram http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
