//! Codec trait and the JSON implementation.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The transport hands us one line at a time (without the trailing
//! newline) and we hand it back one encoded packet at a time; framing is
//! the transport's job, not ours.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// - `Send + Sync` → one codec instance is shared by every connection task.
/// - `'static` → it lives as long as the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected shape.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// The wire format is plain JSON text, one object per line, so a human
/// can drive the server with `nc` and read every reply.
///
/// ## Example
///
/// ```rust
/// use airlock_protocol::{Codec, JsonCodec, Packet, PacketType, Status};
///
/// let codec = JsonCodec;
/// let packet = Packet::new(PacketType::Chat, Status::Ok);
///
/// let bytes = codec.encode(&packet).unwrap();
/// assert_eq!(bytes, br#"{"type":4,"status":0}"#);
///
/// let decoded: Packet = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, packet);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        // `to_vec` never emits raw newlines (they are escaped inside
        // strings), so every encoded packet fits on exactly one line.
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
