//! OS signal handling.
//!
//! SIGINT (Ctrl-C) and SIGTERM trigger graceful shutdown. SIGHUP reloads the
//! charset configuration from its source without touching the listener.

use std::sync::Arc;

use crate::charset::CharsetMiddleware;
use crate::lifecycle::shutdown::Shutdown;

/// Wait for Ctrl-C or SIGTERM, then trigger `shutdown`.
pub async fn shutdown_on_signal(shutdown: Shutdown) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Termination signal received");
    shutdown.trigger();
}

/// Reload `charset` from its source on every SIGHUP until shutdown.
#[cfg(unix)]
pub async fn reload_on_hangup(charset: Arc<CharsetMiddleware>, shutdown: Shutdown) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for SIGHUP, reload on signal disabled");
            return;
        }
    };
    let mut stop = shutdown.subscribe();

    loop {
        tokio::select! {
            _ = hangup.recv() => {
                tracing::info!("SIGHUP received, reloading charset configuration");
                if let Err(e) = charset.reload() {
                    tracing::error!("Failed to reload config: {}. Keeping current configuration.", e);
                }
            }
            _ = stop.recv() => break,
        }
    }
}

#[cfg(not(unix))]
pub async fn reload_on_hangup(_charset: Arc<CharsetMiddleware>, _shutdown: Shutdown) {}
