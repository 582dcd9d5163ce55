//! Error types for the game layer.

/// Configuration problems detected when the game context is built.
///
/// Gameplay failures are never errors: they travel back to the client as
/// status codes.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// More tasks per crewmate than the map has.
    #[error("task amount {requested} exceeds the {available} tasks on the map")]
    TaskAmount { requested: usize, available: usize },

    #[error("invalid game config: {0}")]
    Config(&'static str),
}
