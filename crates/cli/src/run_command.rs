use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};

use {
    anyhow::{Context, Result, bail},
    secrecy::ExposeSecret,
    tracing::{error, info, warn},
};

use {
    tgdrive_config::{Severity, TgDriveConfig, validate},
    tgdrive_drive::{DriveClient, DriveClientConfig, StaticToken},
    tgdrive_metrics::{MetricsRecorderConfig, init_metrics},
    tgdrive_queue::{Destination, ProcessorConfig, QueueProcessor},
    tgdrive_telegram::{TelegramFetcher, TelegramNotifier},
};

/// Wire everything together and poll Telegram until Ctrl-C.
pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let (config, path) = crate::load(config_path)?;
    match &path {
        Some(path) => info!(path = %path.display(), "config loaded"),
        None => info!("no config file found, using defaults"),
    }

    let result = validate(&config);
    for d in &result.diagnostics {
        match d.severity {
            Severity::Error => error!(path = d.path, "{}", d.message),
            Severity::Warning => warn!(path = d.path, "{}", d.message),
        }
    }
    if result.has_errors() {
        bail!(
            "configuration has {} error(s); run `tgdrive config check` for details",
            result.count(Severity::Error)
        );
    }

    init_metrics(metrics_config(&config)?)?;

    let drive = DriveClient::new(
        drive_config(&config),
        Arc::new(StaticToken::new(config.drive.access_token.clone())),
    )
    .context("building Drive client")?;

    let bot = tgdrive_telegram::build_bot(
        config.telegram.token.expose_secret(),
        config.telegram.poll_timeout_secs,
    )
    .context("building Telegram client")?;

    let processor = QueueProcessor::new(
        Arc::new(TelegramFetcher::new(bot.clone())),
        Arc::new(drive),
        Arc::new(TelegramNotifier::new(bot.clone())),
        Destination::new(config.drive.folder_id.clone()),
        ProcessorConfig {
            inter_item_delay: Duration::from_millis(config.queue.inter_item_delay_ms),
        },
    );

    let state = tgdrive_telegram::connect(bot, config.telegram.clone(), Arc::clone(&processor))
        .await
        .context("connecting to Telegram")?;
    let polling = tgdrive_telegram::spawn_polling(Arc::clone(&state));
    info!(
        destination = ?processor.destination().get(),
        "tgdrive running, press Ctrl-C to stop"
    );

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for Ctrl-C")?;
            info!("shutdown requested");
        },
        () = state.cancel.cancelled() => {
            warn!("telegram polling ended");
        },
    }
    state.cancel.cancel();
    polling.await.context("joining polling task")?;

    let pending = processor.queue().len();
    if pending > 0 {
        warn!(pending, "exiting with items still queued");
    }
    Ok(())
}

fn metrics_config(config: &TgDriveConfig) -> Result<MetricsRecorderConfig> {
    let listen = config
        .metrics
        .listen
        .as_deref()
        .map(str::parse::<SocketAddr>)
        .transpose()
        .context("metrics.listen")?;
    Ok(MetricsRecorderConfig {
        enabled: config.metrics.enabled,
        listen,
    })
}

fn drive_config(config: &TgDriveConfig) -> DriveClientConfig {
    let chunk_kib = usize::try_from(config.drive.chunk_size_kib).unwrap_or(usize::MAX / 1024);
    DriveClientConfig {
        api_base: config.drive.api_base.clone(),
        chunk_size: chunk_kib.saturating_mul(1024),
        timeout: Duration::from_secs(config.drive.timeout_secs),
    }
}
