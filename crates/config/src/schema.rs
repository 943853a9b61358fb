//! Config schema types.

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TgDriveConfig {
    pub telegram: TelegramConfig,
    pub drive: DriveConfig,
    pub queue: QueueConfig,
    pub metrics: MetricsConfig,
}

/// Telegram bot front end.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_redacted")]
    pub token: Secret<String>,

    /// Users allowed to run admin commands (numeric IDs or usernames).
    pub admins: Vec<String>,

    /// Users allowed to submit media. Empty means everyone.
    pub allowlist: Vec<String>,

    /// Largest file accepted into the queue, in MiB. The Bot API cannot hand
    /// out files above 20 MiB.
    pub max_file_size_mb: u64,

    /// How many queued names `/queue` lists.
    pub preview_limit: usize,

    /// Long-polling timeout for `getUpdates`, in seconds.
    pub poll_timeout_secs: u32,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("admins", &self.admins)
            .field("allowlist", &self.allowlist)
            .field("max_file_size_mb", &self.max_file_size_mb)
            .finish_non_exhaustive()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            admins: Vec::new(),
            allowlist: Vec::new(),
            max_file_size_mb: 20,
            preview_limit: 10,
            poll_timeout_secs: 30,
        }
    }
}

/// Google Drive storage backend.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// OAuth access token with the `drive.file` scope.
    #[serde(serialize_with = "serialize_redacted")]
    pub access_token: Secret<String>,

    /// Initial destination folder. Empty uploads to the drive root.
    pub folder_id: String,

    /// API origin, overridable for testing.
    pub api_base: String,

    /// Upload chunk size in KiB. Drive requires multiples of 256.
    pub chunk_size_kib: u64,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for DriveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveConfig")
            .field("access_token", &"[REDACTED]")
            .field("folder_id", &self.folder_id)
            .field("api_base", &self.api_base)
            .field("chunk_size_kib", &self.chunk_size_kib)
            .finish_non_exhaustive()
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            access_token: Secret::new(String::new()),
            folder_id: String::new(),
            api_base: "https://www.googleapis.com".into(),
            chunk_size_kib: 1024,
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Pause between two uploads, in milliseconds.
    pub inter_item_delay_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            inter_item_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Address for the Prometheus scrape endpoint, e.g. `127.0.0.1:9464`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,
}

fn serialize_redacted<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    if secret.expose_secret().is_empty() {
        serializer.serialize_str("")
    } else {
        serializer.serialize_str("[REDACTED]")
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = TgDriveConfig::default();
        assert_eq!(cfg.telegram.max_file_size_mb, 20);
        assert_eq!(cfg.telegram.preview_limit, 10);
        assert_eq!(cfg.drive.chunk_size_kib, 1024);
        assert_eq!(cfg.drive.api_base, "https://www.googleapis.com");
        assert_eq!(cfg.queue.inter_item_delay_ms, 1000);
        assert!(!cfg.metrics.enabled);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: TgDriveConfig = toml::from_str(
            r#"
            [telegram]
            token = "123:ABC"
            admins = ["8285783077"]

            [drive]
            folder_id = "folder-xyz"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.telegram.token.expose_secret(), "123:ABC");
        assert_eq!(cfg.telegram.admins, ["8285783077"]);
        assert_eq!(cfg.telegram.poll_timeout_secs, 30);
        assert_eq!(cfg.drive.folder_id, "folder-xyz");
        assert_eq!(cfg.drive.timeout_secs, 300);
    }

    #[test]
    fn secrets_are_redacted_when_serialized() {
        let mut cfg = TgDriveConfig::default();
        cfg.telegram.token = Secret::new("123:ABC".into());
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("123:ABC"));
        assert!(json.contains("[REDACTED]"));
        assert!(!format!("{cfg:?}").contains("123:ABC"));
    }
}
