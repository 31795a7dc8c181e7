//! OS signal handling.
//!
//! # Responsibilities
//! - SIGINT/SIGTERM → shutdown
//! - SIGHUP → re-read the configuration file and reload rules
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP never shuts down; reload failures are not fatal

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::config::schema::RouterConfig;

/// Work item for the reload loop.
#[derive(Debug)]
pub enum ReloadRequest {
    /// Re-read the configuration file from disk.
    Reread,
    /// Apply an already parsed configuration.
    Apply(Box<RouterConfig>),
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn terminate() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Forward SIGHUP as [`ReloadRequest::Reread`] until shutdown.
#[cfg(unix)]
pub fn spawn_reload_signal(
    requests: mpsc::UnboundedSender<ReloadRequest>,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                received = hangup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    tracing::info!("SIGHUP received, reloading rules");
                    if requests.send(ReloadRequest::Reread).is_err() {
                        break;
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
    }))
}

/// No SIGHUP outside unix; the task just waits for shutdown.
#[cfg(not(unix))]
pub fn spawn_reload_signal(
    _requests: mpsc::UnboundedSender<ReloadRequest>,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        let _ = shutdown.recv().await;
    }))
}
