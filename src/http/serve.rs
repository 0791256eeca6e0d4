//! Bridges [`net::Listener`](crate::net::Listener) into axum's serve loop.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::net::{Connection, Listener};

/// Back-off after an accept error, so a persistent failure does not spin.
const ACCEPT_ERROR_DELAY: Duration = Duration::from_secs(1);

/// Serves any [`Listener`] through `axum::serve`.
#[derive(Debug, Clone)]
pub struct ServingListener {
    inner: Arc<dyn Listener>,
}

impl ServingListener {
    pub fn new(inner: Arc<dyn Listener>) -> Self {
        Self { inner }
    }
}

impl axum::serve::Listener for ServingListener {
    type Io = Connection;
    type Addr = Option<SocketAddr>;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        loop {
            match self.inner.accept().await {
                Ok(conn) => {
                    let peer = conn.peer_addr();
                    return (conn, peer);
                }
                Err(e) if e.kind() == io::ErrorKind::NotConnected => {
                    tracing::info!(address = %self.inner.addr(), "Listener closed, no longer accepting");
                    return std::future::pending().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Accept failed");
                    tokio::time::sleep(ACCEPT_ERROR_DELAY).await;
                }
            }
        }
    }

    fn local_addr(&self) -> io::Result<Self::Addr> {
        Ok(Some(self.inner.addr()))
    }
}
