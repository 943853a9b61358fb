use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    tgdrive_queue::TransferError,
};

/// Supplies the bearer token for Drive API calls.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<Secret<String>, TransferError>;
}

/// A fixed token taken from configuration.
pub struct StaticToken {
    token: Secret<String>,
}

impl StaticToken {
    pub fn new(token: Secret<String>) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<Secret<String>, TransferError> {
        if self.token.expose_secret().is_empty() {
            return Err(TransferError::rejected("no Drive access token configured"));
        }
        Ok(self.token.clone())
    }
}
