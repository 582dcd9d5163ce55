//! Wire protocol for airlock.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`Inbound`], [`Packet`], [`PacketType`], [`Status`], etc.) —
//!   the message structures that travel on the wire, one JSON object per line.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw lines) and session
//! (player identity). It doesn't know about connections, rooms or rounds —
//! it only knows how to serialize and deserialize packets.
//!
//! ```text
//! Transport (lines) → Protocol (Inbound / Packet) → Dispatcher (game)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    Arguments, ClientEvent, ClientId, DiscussionReason, DiscussionResult,
    GameStatus, Inbound, Packet,
    PacketType, PresenceEvent, Recipient, RoomId, Status, TaskId,
    PROTOCOL_VERSION,
};
