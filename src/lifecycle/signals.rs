//! OS signal handling.
//!
//! # Responsibilities
//! - SIGINT / Ctrl-C and SIGTERM end the watcher
//! - SIGHUP forces an immediate reload of observable sources
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP never shuts down; it only bypasses the reload interval

use crate::config::Config;

/// Serve signals until a shutdown signal arrives.
#[cfg(unix)]
pub async fn run_until_shutdown(config: &Config) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("Interrupt received, shutting down");
                break;
            }
            _ = terminate.recv() => {
                tracing::info!("SIGTERM received, shutting down");
                break;
            }
            _ = hangup.recv() => {
                let rebuilt = config.reload();
                tracing::info!(rebuilt, "SIGHUP received, sources reloaded");
            }
        }
    }
    Ok(())
}

/// Serve signals until a shutdown signal arrives.
#[cfg(not(unix))]
pub async fn run_until_shutdown(_config: &Config) -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received, shutting down");
    Ok(())
}
