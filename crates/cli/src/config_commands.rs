use std::path::Path;

use {anyhow::Result, clap::Subcommand};

use tgdrive_config::{Severity, TgDriveConfig, validate};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors/warnings.
    Check,
    /// Print the effective configuration with secrets redacted.
    Show,
}

pub fn handle_config(action: ConfigAction, config_path: Option<&Path>) -> Result<()> {
    let (config, path) = crate::load(config_path)?;
    match action {
        ConfigAction::Check => check(&config, path.as_deref()),
        ConfigAction::Show => show(&config),
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(config: &TgDriveConfig, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    let result = validate(config);
    for d in &result.diagnostics {
        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
        };
        eprintln!("  {BOLD}{color}{}{RESET} {}: {}", d.severity, d.path, d.message);
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    if !result.diagnostics.is_empty() {
        eprintln!();
    }
    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn show(config: &TgDriveConfig) -> Result<()> {
    print!("{}", render(config)?);
    Ok(())
}

fn render(config: &TgDriveConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::Secret};

    #[test]
    fn rendered_config_hides_secrets() {
        let mut config = TgDriveConfig::default();
        config.telegram.token = Secret::new("123:very-secret".into());
        config.drive.access_token = Secret::new("ya29.secret".into());
        config.drive.folder_id = "folder-1".into();

        let out = render(&config).unwrap();
        assert!(!out.contains("very-secret"));
        assert!(!out.contains("ya29.secret"));
        assert!(out.contains("[REDACTED]"));
        assert!(out.contains("folder-1"));
    }
}
