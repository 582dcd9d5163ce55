//! Core protocol types for airlock's wire format.
//!
//! Every line on the wire is one JSON object:
//!
//! ```text
//! client → server   {"type": 1, "arguments": {"name": "Ann"}}
//! server → client   {"type": 1, "status": 0, "arguments": {"id": 3, "name": "Ann"}}
//! ```
//!
//! Packet types and status codes are small integers so that thin clients
//! (a shell script, a microcontroller) can speak the protocol without
//! string tables.

use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Codec, ProtocolError};

/// Protocol revision announced in the [`PacketType::Info`] greeting.
pub const PROTOCOL_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a connected client.
///
/// Newtype wrapper so a `ClientId` can't be passed where a `RoomId` or
/// `TaskId` is expected. `#[serde(transparent)]` keeps it a plain number
/// on the wire: `ClientId(42)` is `42`, not `{"0": 42}`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a room in the location graph (its index in the map).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub u32);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// Identifier of a task in the task catalog (its index in the map).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct TaskId(pub u32);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// PacketType
// ---------------------------------------------------------------------------

/// The packet type space, shared by both directions.
///
/// `#[serde(into = "u8", try_from = "u8")]` makes serde go through the
/// `From`/`TryFrom` impls below, so the enum travels as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum PacketType {
    /// Server → client greeting: `{id, version}`.
    Info = 0,
    /// Set the display name. Only packet accepted while naming.
    Name = 1,
    /// List the other named clients.
    Clients = 2,
    /// Run a server command (`start_game`, `end_game`).
    Command = 3,
    /// Lobby chat.
    Chat = 4,
    /// Move to an adjacent room.
    Location = 5,
    /// Complete an assigned task.
    Task = 6,
    /// Impostor kills a crewmate in the same room.
    Kill = 7,
    /// Query (or push) the current room: doors and occupants.
    RoomInfo = 8,
    /// Server push: a client joined or left the server.
    ClientInfo = 9,
    /// Server push: round started / ended / server full.
    GameStatus = 10,
    /// Server push: this session's stage, role and liveness.
    State = 11,
    /// Server push: this session's task ledger.
    Tasks = 12,
    /// Server push: someone entered or left the room you're in.
    Presence = 13,
    /// Server push: the static task catalog.
    TaskCatalog = 14,
    /// Server push: the static location graph.
    LocationGraph = 15,
    /// Report a body in your room, opening a discussion.
    Report = 16,
    /// Press the emergency button at the spawn room.
    Meeting = 17,
    /// Cast a ballot during a discussion (`null` skips).
    Vote = 18,
    /// Impostor crawls through a vent to a linked room.
    Vent = 19,
    /// Server push: a discussion opened or was settled.
    Discussion = 20,
    /// Server push: the running ballot count.
    Votes = 21,
}

impl PacketType {
    /// Every packet type, indexed by its wire code.
    pub const ALL: [PacketType; 22] = [
        Self::Info,
        Self::Name,
        Self::Clients,
        Self::Command,
        Self::Chat,
        Self::Location,
        Self::Task,
        Self::Kill,
        Self::RoomInfo,
        Self::ClientInfo,
        Self::GameStatus,
        Self::State,
        Self::Tasks,
        Self::Presence,
        Self::TaskCatalog,
        Self::LocationGraph,
        Self::Report,
        Self::Meeting,
        Self::Vote,
        Self::Vent,
        Self::Discussion,
        Self::Votes,
    ];

    /// Looks up a packet type by wire code. `None` if out of range.
    pub fn from_code(code: i64) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    /// Returns the wire code.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<PacketType> for u8 {
    fn from(kind: PacketType) -> Self {
        kind.code()
    }
}

impl TryFrom<u8> for PacketType {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(i64::from(code))
            .ok_or(ProtocolError::UnknownPacketType(i64::from(code)))
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Result code carried by every outbound packet.
///
/// Semantic failures (bad name, wrong room, wrong stage) are reported
/// with one of these in an otherwise normal reply. They never close the
/// connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Status {
    Ok = 0,
    Invalid = 1,
    Again = 2,
    WrongLength = 3,
    NotInGame = 4,
    WrongRole = 5,
    WrongLocation = 6,
    /// Another client already goes by that name.
    NameTaken = 7,
}

impl Status {
    const ALL: [Status; 8] = [
        Self::Ok,
        Self::Invalid,
        Self::Again,
        Self::WrongLength,
        Self::NotInGame,
        Self::WrongRole,
        Self::WrongLocation,
        Self::NameTaken,
    ];

    /// Returns `true` for [`Status::Ok`].
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        status as u8
    }
}

impl TryFrom<u8> for Status {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(code))
            .copied()
            .ok_or(ProtocolError::UnknownStatus(i64::from(code)))
    }
}

// ---------------------------------------------------------------------------
// Argument vocabularies
// ---------------------------------------------------------------------------

/// Value of `arguments.status` in a [`PacketType::GameStatus`] push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// The server is at capacity; the connection is about to close.
    Full,
    /// A round has started.
    Running,
    ImpostorWin,
    CrewmateWin,
    /// The round was ended without a winner.
    Ended,
}

/// Value of `arguments.event` in a [`PacketType::ClientInfo`] push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientEvent {
    Join,
    Leave,
}

/// Value of `arguments.event` in a [`PacketType::Presence`] push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceEvent {
    Enter,
    Leave,
    VentEnter,
    VentLeave,
}

/// Why a discussion was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscussionReason {
    /// Someone found a body.
    Report,
    /// Someone pressed the emergency button.
    Button,
}

/// How a discussion was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscussionResult {
    /// One player had strictly the most votes and was thrown out.
    Eject,
    /// Skips matched or beat every player.
    Skip,
    /// Two or more players shared the top count.
    Tie,
}

// ---------------------------------------------------------------------------
// Recipient — who should receive a packet?
// ---------------------------------------------------------------------------

/// Specifies who should receive an outbound packet.
///
/// Game operations produce `(Recipient, Packet)` pairs; the server routes
/// them. "Everyone" only ever means sessions that have finished naming —
/// a session still choosing its name only hears replies addressed to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every named session.
    All,

    /// Exactly one session, whatever its stage.
    Client(ClientId),

    /// Every named session except this one (typically the sender).
    AllExcept(ClientId),
}

// ---------------------------------------------------------------------------
// Packet — outbound
// ---------------------------------------------------------------------------

/// An outbound packet: `{type, status, arguments?}`.
///
/// `arguments` is free-form JSON because every packet type carries a
/// different shape (an object for most, an array for client and task
/// lists). It's omitted from the wire when `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    #[serde(rename = "type")]
    pub kind: PacketType,

    pub status: Status,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

impl Packet {
    /// A packet with no arguments.
    pub fn new(kind: PacketType, status: Status) -> Self {
        Self {
            kind,
            status,
            arguments: None,
        }
    }

    /// Attaches arguments (builder style).
    pub fn with_arguments(mut self, arguments: Value) -> Self {
        self.arguments = Some(arguments);
        self
    }
}

// ---------------------------------------------------------------------------
// Inbound — client → server envelope
// ---------------------------------------------------------------------------

/// The `arguments` object of an inbound envelope.
pub type Arguments = Map<String, Value>;

/// The raw envelope exactly as serde sees it. `type` is read as a plain
/// `i64` so an out-of-range code can be reported as such instead of as a
/// generic decode failure.
#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: i64,

    #[serde(default)]
    arguments: Option<Arguments>,
}

/// A well-formed inbound envelope: `{type, arguments?}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    pub kind: PacketType,
    pub arguments: Arguments,
}

impl Inbound {
    /// Creates an envelope directly (used by tests and bots).
    pub fn new(kind: PacketType, arguments: Arguments) -> Self {
        Self { kind, arguments }
    }

    /// Decodes one line into an envelope.
    ///
    /// # Errors
    /// - [`ProtocolError::Decode`] — not JSON, not an object, `type`
    ///   missing or not an integer, `arguments` not an object
    /// - [`ProtocolError::UnknownPacketType`] — `type` out of range
    pub fn decode(
        codec: &impl Codec,
        data: &[u8],
    ) -> Result<Self, ProtocolError> {
        let raw: RawEnvelope = codec.decode(data)?;
        let kind = PacketType::from_code(raw.kind)
            .ok_or(ProtocolError::UnknownPacketType(raw.kind))?;
        Ok(Self {
            kind,
            arguments: raw.arguments.unwrap_or_default(),
        })
    }

    /// Deserializes the arguments object into a handler's argument struct.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if a field has the wrong type.
    pub fn parse_arguments<T: DeserializeOwned>(
        &self,
    ) -> Result<T, ProtocolError> {
        serde_json::from_value(Value::Object(self.arguments.clone()))
            .map_err(ProtocolError::Decode)
    }
}

// =========================================================================
// Tests
// =========================================================================
