use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{Instrument, info, warn};

use crate::config::Config;
use crate::http::connection::{Connection, Settings};

/// Pause after a failed `accept()` before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accept loop handing each connection to its own task.
pub struct Listener {
    listener: TcpListener,
    settings: Arc<Settings>,
    shutdown_grace: Duration,
}

impl Listener {
    pub async fn bind(cfg: &Config) -> anyhow::Result<Self> {
        let settings = Settings::from_config(cfg)?;
        let listener = TcpListener::bind(&cfg.server.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", cfg.server.listen_addr))?;

        info!(
            addr = %listener.local_addr()?,
            root = %settings.resolver.root().display(),
            "Listening"
        );

        Ok(Self {
            listener,
            settings: Arc::new(settings),
            shutdown_grace: cfg.shutdown_grace(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Accepts connections until `shutdown` completes, then stops
    /// listening and waits up to the shutdown grace period for open
    /// connections to end on their own.
    pub async fn run_until(self, shutdown: impl Future) -> anyhow::Result<()> {
        // Every connection task holds a sender; recv() yields None once all are gone.
        let (done_tx, mut done_rx) = mpsc::channel::<()>(1);
        tokio::pin!(shutdown);
        let listener = &self.listener;

        loop {
            tokio::select! {
                (socket, peer) = next_connection(move || listener.accept()) => {
                    info!("Accepted connection from {}", peer);

                    let settings = Arc::clone(&self.settings);
                    let done = done_tx.clone();
                    let span = tracing::info_span!("conn", %peer);
                    tokio::spawn(
                        async move {
                            let mut conn = Connection::new(socket, settings);
                            conn.run().await;
                            tracing::debug!("Connection closed");
                            drop(done);
                        }
                        .instrument(span),
                    );
                }

                _ = &mut shutdown => {
                    info!("No longer accepting connections");
                    break;
                }
            }
        }

        drop(self.listener);
        drop(done_tx);

        if tokio::time::timeout(self.shutdown_grace, done_rx.recv())
            .await
            .is_err()
        {
            warn!(
                grace_ms = self.shutdown_grace.as_millis() as u64,
                "Connections still open after shutdown grace period"
            );
        }

        Ok(())
    }
}

/// Calls `accept` until it yields a connection.
///
/// Failures such as `EMFILE` tend to repeat on every call, so each one is
/// followed by [`ACCEPT_BACKOFF`] instead of an immediate retry.
async fn next_connection<F, Fut, T>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(conn) => return conn,
            Err(e) => {
                warn!(error = %e, "Failed to accept connection");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}
