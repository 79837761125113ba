//! Graceful shutdown for the HTTP server.
//!
//! The server stops accepting connections once the controller fires and
//! drains in-flight requests before [`crate::serve`] returns.

use std::future::Future;

use tokio::signal;
use tokio::sync::broadcast;

/// Fans one shutdown notice out to every listener.
///
/// The daemon hands [`ShutdownController::signalled`] to the server and runs
/// [`ShutdownController::wait_for_signal`] on a separate task. Tests call
/// [`ShutdownController::shutdown`] directly. Firing more than once, or with
/// nobody listening, is a no-op.
pub struct ShutdownController {
    notify: broadcast::Sender<()>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(1);
        Self { notify }
    }

    /// A receiver notified on the next shutdown. Only shutdowns fired after
    /// this call are seen.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.notify.subscribe()
    }

    /// A future that resolves on shutdown, for `with_graceful_shutdown`.
    ///
    /// The subscription is taken eagerly, so a shutdown fired between this
    /// call and the first poll is not missed. Dropping the controller also
    /// resolves it.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.subscribe();
        async move {
            let _ = rx.recv().await;
        }
    }

    pub fn shutdown(&self) {
        let _ = self.notify.send(());
    }

    /// Block until SIGINT (or SIGTERM on unix), then fire.
    pub async fn wait_for_signal(&self) {
        tokio::select! {
            _ = signal::ctrl_c() => tracing::info!("received SIGINT, shutting down"),
            _ = terminate() => tracing::info!("received SIGTERM, shutting down"),
        }
        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves on SIGTERM. If the handler cannot be installed, only SIGINT
/// stops the server.
#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
