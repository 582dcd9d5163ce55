//! Unified error type for the airlock server.

use airlock_game::GameError;
use airlock_protocol::ProtocolError;
use airlock_transport::TransportError;
use airlock_world::WorldError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum AirlockError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The map failed to load or validate.
    #[error(transparent)]
    World(#[from] WorldError),

    /// The game config doesn't fit the map.
    #[error(transparent)]
    Game(#[from] GameError),
}
