//! Error types for the session layer.

/// Errors that can occur during session management.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Every registry slot is taken. The connection must be turned away
    /// before any session state is created for it.
    #[error("server is full ({capacity} clients)")]
    Full { capacity: usize },
}
