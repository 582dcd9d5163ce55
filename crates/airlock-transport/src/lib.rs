//! Transport abstraction layer for airlock.
//!
//! Provides the [`Transport`] and [`Connection`] traits and a TCP
//! implementation that frames messages as newline-terminated lines.

#![allow(async_fn_in_trait)]

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::{LineConnection, TcpLineTransport, MAX_LINE_LEN};

use std::fmt;

/// Opaque identifier for a connection.
///
/// Distinct from the game's `ClientId`: a connection that is turned away
/// because the server is full still gets one of these for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single connection that exchanges whole lines.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one line. The terminator is appended by the transport.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next non-empty line, without its terminator.
    ///
    /// Returns `Ok(None)` when the peer closed the connection. An over-long
    /// line is dropped through its terminator and reported as an error;
    /// the connection stays usable afterwards.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the sending side of the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
