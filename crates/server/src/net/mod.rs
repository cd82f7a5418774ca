//! TCP front end: accept loop, connection cap, graceful drain.

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{Instrument, error, info, info_span, warn};

pub mod connection;
pub mod metrics;

use atomkv_core::store::Store;

/// Upper bound on simultaneously served clients
const DEFAULT_MAX_CONNECTIONS: usize = 10_000;

/// Seconds an idle client may sit between commands
const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct ServerConfig {
    pub max_connections: usize,
    pub read_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

pub struct Server {
    store: Store,
    config: ServerConfig,
    client_permits: Arc<Semaphore>,
}

impl Server {
    pub fn new(store: Store) -> Self {
        Self::with_config(store, ServerConfig::default())
    }

    pub fn with_config(store: Store, config: ServerConfig) -> Self {
        let client_permits = Arc::new(Semaphore::new(config.max_connections));
        Self {
            store,
            config,
            client_permits,
        }
    }

    /// Run without an external shutdown signal; the channel sender lives
    /// for the whole call so the accept loop never sees a spurious close.
    pub async fn run(&self, addr: &str) -> Result<(), anyhow::Error> {
        let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());
        self.run_with_shutdown(addr, shutdown_rx).await
    }

    /// Accept clients until the shutdown signal fires, then drain the
    /// connections that are still talking.
    pub async fn run_with_shutdown(
        &self,
        addr: &str,
        mut shutdown_rx: watch::Receiver<()>,
    ) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind(addr).await?;
        info!(
            address = %addr,
            max_connections = self.config.max_connections,
            "accepting connections"
        );

        let mut workers: JoinSet<u64> = JoinSet::new();

        loop {
            let (socket, peer_addr) = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        continue;
                    }
                },
                _ = shutdown_rx.changed() => break,
            };

            // At the cap, greeting the client would promise service we
            // cannot give; drop the socket before the banner goes out.
            let permit = match self.client_permits.clone().try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => {
                    warn!(peer = %peer_addr, "connection cap reached, dropping client");
                    continue;
                }
            };

            let store = self.store.clone();
            let read_timeout_secs = self.config.read_timeout_secs;
            let span = info_span!("client", peer = %peer_addr);
            workers.spawn(
                async move {
                    let _permit = permit;
                    let mut conn =
                        connection::Connection::new(socket, peer_addr, store, read_timeout_secs);
                    match conn.handle().await {
                        Ok(requests) => requests,
                        Err(e) => {
                            error!(error = %e, "client handler failed");
                            0
                        }
                    }
                }
                .instrument(span),
            );
        }

        // Let clients mid-command finish; a panicked handler costs only
        // its own connection.
        info!(open = workers.len(), "draining open connections");
        let mut requests_served = 0u64;
        while let Some(finished) = workers.join_next().await {
            match finished {
                Ok(requests) => requests_served += requests,
                Err(e) => error!(error = %e, "client task panicked"),
            }
        }
        info!(requests_served, "all connections drained");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn free_addr() -> std::net::SocketAddr {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }

    #[tokio::test]
    async fn test_server_accepts_connections() {
        let store = Store::new(100);
        let server = Server::new(store);
        let addr = free_addr();

        tokio::spawn(async move {
            if let Err(e) = server.run(&addr.to_string()).await {
                error!(error = %e, "server error");
            }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        let mut buf = [0u8; 64];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"OK AtomKV\n");
    }

    #[tokio::test]
    async fn test_shutdown_stops_accepting() {
        let store = Store::new(100);
        let server = Server::new(store);
        let addr = free_addr();
        let (shutdown_tx, shutdown_rx) = watch::channel(());

        let handle = tokio::spawn(async move {
            server.run_with_shutdown(&addr.to_string(), shutdown_rx).await
        });

        tokio::time::sleep(Duration::from_millis(100)).await;

        // An open connection finishes its exchange before shutdown completes
        let mut client = TcpStream::connect(addr).await.unwrap();
        let mut buf = [0u8; 64];
        let _ = client.read(&mut buf).await.unwrap();

        shutdown_tx.send(()).unwrap();

        client.write_all(b"QUIT\n").await.unwrap();
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"+BYE\n");

        handle.await.unwrap().unwrap();
    }
}
