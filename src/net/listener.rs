//! Listener capability and the real TCP implementation.
//!
//! # Responsibilities
//! - Define the contract secure serving and the HTTP layer rely on
//! - Bind to the configured secure address
//! - Accept incoming TCP connections
//! - Release the socket on close

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::net::connection::{Connection, ConnectionId};

/// Anything secure serving can be wired against.
#[async_trait]
pub trait Listener: Send + Sync + std::fmt::Debug {
    /// Wait for the next connection.
    async fn accept(&self) -> io::Result<Connection>;

    /// Stop listening. A listener can only be closed once.
    fn close(&self) -> io::Result<()>;

    /// Address this listener reports as bound.
    fn addr(&self) -> SocketAddr;
}

fn closed_listener() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "use of closed network listener")
}

/// A listener over a bound TCP socket.
#[derive(Debug)]
pub struct TcpListener {
    inner: Mutex<Option<Arc<tokio::net::TcpListener>>>,
    local_addr: SocketAddr,
}

impl TcpListener {
    /// Bind a new socket.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let listener = Self::from_tokio(listener)?;

        tracing::info!(address = %listener.local_addr, "Secure listener bound");
        Ok(listener)
    }

    /// Wrap a socket the caller already bound.
    pub fn from_tokio(listener: tokio::net::TcpListener) -> io::Result<Self> {
        let local_addr = listener.local_addr()?;
        Ok(Self {
            inner: Mutex::new(Some(Arc::new(listener))),
            local_addr,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<tokio::net::TcpListener>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }
}

#[async_trait]
impl Listener for TcpListener {
    async fn accept(&self) -> io::Result<Connection> {
        let listener = self.lock().clone().ok_or_else(closed_listener)?;
        let (stream, peer_addr) = listener.accept().await?;

        tracing::debug!(
            connection_id = %ConnectionId::new(),
            peer_addr = %peer_addr,
            "Connection accepted"
        );

        Ok(Connection::Tcp(stream))
    }

    fn close(&self) -> io::Result<()> {
        // Dropping the last Arc releases the socket; accepts already in
        // flight hold their own clone until they resolve.
        self.lock().take().map(drop).ok_or_else(closed_listener)
    }

    fn addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn accepts_real_connections() {
        let listener = TcpListener::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let addr = listener.addr();
        assert_ne!(addr.port(), 0);

        let client = tokio::spawn(async move {
            let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
            stream.write_all(b"ping").await.unwrap();
        });

        let mut conn = listener.accept().await.unwrap();
        assert!(!conn.is_pipe());
        assert!(conn.peer_addr().is_some());

        let mut buf = [0u8; 4];
        conn.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");
        client.await.unwrap();
    }

    #[tokio::test]
    async fn close_is_single_shot() {
        let listener = TcpListener::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        listener.close().unwrap();
        assert!(listener.is_closed());
        assert!(listener.close().is_err());
        assert!(listener.accept().await.is_err());
    }
}
