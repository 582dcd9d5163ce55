//! Error types for the protocol layer.
//!
//! Each airlock crate defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is the shape of a line on the
//! wire, not the network or the game rules.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a packet into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into an envelope).
    ///
    /// Common causes: malformed JSON, a top-level value that isn't an
    /// object, a missing or non-integer `type`, or `arguments` that
    /// isn't an object.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The envelope parsed, but its `type` is outside the known range.
    #[error("unknown packet type {0}")]
    UnknownPacketType(i64),

    /// The status code is outside the known range.
    #[error("unknown status code {0}")]
    UnknownStatus(i64),
}
