//! In-memory stand-in for a network listener.
//!
//! A [`FakeListener`] owns both ends of an in-memory byte pipe. Handing it to
//! secure-serving apply satisfies the listener contract without binding a
//! socket:
//! - `accept` resolves immediately with the server end
//! - `addr` is a fixed loopback address, nothing is actually bound there
//! - `close` closes the client end, then the server end, stopping at the
//!   first error

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};

use crate::net::connection::Connection;
use crate::net::listener::Listener;

/// Address reported by [`FakeListener::addr`]. Cosmetic only.
pub const FAKE_LISTENER_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), 3000));

/// Buffer size of each pipe direction.
const PIPE_CAPACITY: usize = 64 * 1024;

fn closed_pipe() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "io: read/write on closed pipe")
}

/// Create a connected pipe pair, returned as `(server, client)`.
pub fn pipe() -> (PipeEnd, PipeEnd) {
    let (server, client) = tokio::io::duplex(PIPE_CAPACITY);
    (PipeEnd::new(server), PipeEnd::new(client))
}

/// One end of an in-memory pipe.
///
/// Clones share the same underlying stream, so closing through any clone
/// closes the end for all of them.
#[derive(Debug, Clone)]
pub struct PipeEnd {
    stream: Arc<Mutex<Option<DuplexStream>>>,
}

impl PipeEnd {
    fn new(stream: DuplexStream) -> Self {
        Self {
            stream: Arc::new(Mutex::new(Some(stream))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<DuplexStream>> {
        self.stream.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Close this end. The peer observes EOF on read and a broken pipe on
    /// write. Closing an end that is already closed is an error.
    pub fn close(&self) -> io::Result<()> {
        match self.lock().take() {
            Some(stream) => {
                drop(stream);
                Ok(())
            }
            None => Err(closed_pipe()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }
}

impl AsyncRead for PipeEnd {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.lock().as_mut() {
            Some(stream) => Pin::new(stream).poll_read(cx, buf),
            None => Poll::Ready(Err(closed_pipe())),
        }
    }
}

impl AsyncWrite for PipeEnd {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.lock().as_mut() {
            Some(stream) => Pin::new(stream).poll_write(cx, buf),
            None => Poll::Ready(Err(closed_pipe())),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.lock().as_mut() {
            Some(stream) => Pin::new(stream).poll_flush(cx),
            None => Poll::Ready(Err(closed_pipe())),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.lock().as_mut() {
            Some(stream) => Pin::new(stream).poll_shutdown(cx),
            None => Poll::Ready(Err(closed_pipe())),
        }
    }
}

/// A listener that never listens.
#[derive(Debug, Clone)]
pub struct FakeListener {
    server: PipeEnd,
    client: PipeEnd,
}

impl FakeListener {
    /// Build a listener over a fresh pipe pair.
    pub fn new() -> Self {
        let (server, client) = pipe();
        Self { server, client }
    }

    pub fn server_end(&self) -> &PipeEnd {
        &self.server
    }

    pub fn client_end(&self) -> &PipeEnd {
        &self.client
    }

    /// True once both ends have been closed.
    pub fn is_closed(&self) -> bool {
        self.client.is_closed() && self.server.is_closed()
    }
}

impl Default for FakeListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Listener for FakeListener {
    /// Hands back the pre-established server end. Does not wait for a peer.
    async fn accept(&self) -> io::Result<Connection> {
        if self.server.is_closed() {
            return Err(closed_pipe());
        }
        Ok(Connection::Pipe(self.server.clone()))
    }

    fn close(&self) -> io::Result<()> {
        self.client.close()?;
        self.server.close()
    }

    fn addr(&self) -> SocketAddr {
        FAKE_LISTENER_ADDR
    }
}
