//! paperwatch binary: liveness endpoint plus the Discord relay.

use paperwatch::{Relay, RelayConfig, liveness};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("paperwatch {} starting", env!("CARGO_PKG_VERSION"));

    let config = RelayConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        anyhow::anyhow!("invalid configuration: {e}")
    })?;
    tracing::debug!(?config, "configuration loaded");

    let listener = liveness::bind(config.port)
        .await
        .map_err(|e| anyhow::anyhow!("cannot bind liveness port {}: {e}", config.port))?;
    tokio::spawn(async move {
        if let Err(e) = liveness::serve(listener).await {
            tracing::error!("liveness endpoint stopped: {e}");
        }
    });

    let (relay, rest) = Relay::from_config(&config)?;

    tokio::select! {
        _ = relay.run(rest) => {
            tracing::warn!("relay event loop ended");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested");
        }
    }

    tracing::info!("paperwatch shut down cleanly");
    Ok(())
}
