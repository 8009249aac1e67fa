//! Process signals mapped onto the server's cancellation token.

use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Cancel `token` on Ctrl+C or SIGTERM.
///
/// Returns without touching the token when it is cancelled elsewhere first.
/// A handler that cannot be installed is logged and also cancels, so the
/// server never runs without a way to stop it.
pub async fn cancel_on_shutdown(token: CancellationToken) {
    let reason = tokio::select! {
        () = token.cancelled() => return,
        res = signal::ctrl_c() => res.map(|()| "ctrl-c"),
        res = terminate() => res.map(|()| "SIGTERM"),
    };
    match reason {
        Ok(signal) => tracing::info!(signal, "shutdown signal received, draining"),
        Err(e) => tracing::error!(error = %e, "cannot listen for shutdown signals, stopping"),
    }
    token.cancel();
}

#[cfg(unix)]
async fn terminate() -> std::io::Result<()> {
    signal::unix::signal(signal::unix::SignalKind::terminate())?
        .recv()
        .await;
    Ok(())
}

#[cfg(not(unix))]
async fn terminate() -> std::io::Result<()> {
    std::future::pending().await
}
