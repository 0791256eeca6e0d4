//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Dev mode:
//!     listener.rs (TcpListener, real socket)
//!     → connection.rs (Connection::Tcp)
//!     → HTTP layer
//!
//! Production:
//!     fake.rs (FakeListener over an in-memory pipe)
//!     → secure-serving apply sees a listener, nothing is bound
//!     → closed before the options are done applying
//! ```
//!
//! # Design Decisions
//! - One `Listener` trait, two variants; the choice is made in exactly one
//!   place (`Options::apply_to`)
//! - The fake never blocks in `accept` and never touches the network
//! - Serving certificates are checked at apply time, not at first handshake

pub mod connection;
pub mod fake;
pub mod listener;
pub mod tls;

pub use connection::{Connection, ConnectionId};
pub use fake::{FakeListener, PipeEnd, FAKE_LISTENER_ADDR};
pub use listener::{Listener, TcpListener};
