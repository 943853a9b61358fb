//! Semantic checks on a loaded configuration.

use {secrecy::ExposeSecret, std::net::SocketAddr};

use crate::schema::TgDriveConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "drive.chunk_size_kib"
    pub path: &'static str,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.path, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: &'static str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path,
            message: message.into(),
        });
    }
}

/// Check a config for values that would make the bot unusable.
pub fn validate(config: &TgDriveConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    let token = config.telegram.token.expose_secret();
    if token.is_empty() {
        result.push(Severity::Error, "telegram.token", "bot token is required");
    } else if token.starts_with("${") {
        result.push(
            Severity::Error,
            "telegram.token",
            format!("environment variable {token} is not set"),
        );
    }

    let access = config.drive.access_token.expose_secret();
    if access.is_empty() {
        result.push(
            Severity::Error,
            "drive.access_token",
            "an OAuth access token is required",
        );
    } else if access.starts_with("${") {
        result.push(
            Severity::Error,
            "drive.access_token",
            format!("environment variable {access} is not set"),
        );
    }

    if config.telegram.admins.is_empty() {
        result.push(
            Severity::Warning,
            "telegram.admins",
            "no admins configured; admin commands are disabled",
        );
    }

    if config.telegram.max_file_size_mb > 20 {
        result.push(
            Severity::Warning,
            "telegram.max_file_size_mb",
            "the Bot API cannot download files larger than 20 MiB",
        );
    }

    let chunk = config.drive.chunk_size_kib;
    if chunk == 0 || chunk % 256 != 0 {
        result.push(
            Severity::Error,
            "drive.chunk_size_kib",
            format!("{chunk} is not a positive multiple of 256"),
        );
    }

    if let Some(listen) = &config.metrics.listen
        && listen.parse::<SocketAddr>().is_err()
    {
        result.push(
            Severity::Error,
            "metrics.listen",
            format!("{listen:?} is not a socket address"),
        );
    }
    if config.metrics.enabled && config.metrics.listen.is_none() {
        result.push(
            Severity::Error,
            "metrics.listen",
            "metrics are enabled but no scrape address is set",
        );
    }

    result
}
