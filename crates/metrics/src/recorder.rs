//! Metrics recorder initialization and configuration.

use {
    anyhow::{Result, bail},
    std::net::SocketAddr,
    tracing::info,
};

/// Configuration for the metrics system.
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorderConfig {
    pub enabled: bool,
    /// Address of the Prometheus scrape endpoint. Required when enabled.
    pub listen: Option<SocketAddr>,
}

/// Install the Prometheus exporter and its scrape endpoint.
///
/// Call once at startup, from within a tokio runtime. When disabled, or
/// without the `prometheus` feature, every metric goes to the facade's no-op
/// recorder.
///
/// # Errors
///
/// Returns an error if metrics are enabled without a `listen` address, or if
/// the exporter fails to build or bind.
pub fn init_metrics(config: MetricsRecorderConfig) -> Result<()> {
    if !config.enabled {
        info!("metrics collection is disabled");
        return Ok(());
    }
    let Some(addr) = config.listen else {
        bail!("metrics are enabled but no scrape address is configured");
    };

    #[cfg(feature = "prometheus")]
    {
        use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

        PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(crate::queue::ITEM_DURATION_SECONDS.to_string()),
                crate::buckets::ITEM_DURATION,
            )?
            .with_http_listener(addr)
            .install()?;
        info!(%addr, "prometheus scrape endpoint listening");
    }

    #[cfg(not(feature = "prometheus"))]
    info!(%addr, "metrics feature not enabled at compile time");

    Ok(())
}
