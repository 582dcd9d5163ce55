//! Session types: the data structures that represent one connected player.
//!
//! A "session" is the server's record of a connection. It tracks:
//! - WHO the player is (`ClientId`, display name)
//! - WHERE they are in their lifecycle (`Stage`)
//! - WHAT they are doing in the current round (role, room, task ledger)
//! - HOW to reach them (the outbound packet queue)

use airlock_protocol::{ClientId, Packet, RoomId, TaskId};
use serde::Serialize;
use tokio::sync::mpsc;

/// Queue feeding a session's writer task.
///
/// Unbounded so that routing a packet never waits on a slow socket; the
/// writer task drains it at whatever pace the peer reads.
pub type PacketSender = mpsc::UnboundedSender<Packet>;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Limits for the registry and for display names.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum number of simultaneously connected clients.
    pub capacity: usize,

    /// Shortest accepted display name, in characters, after trimming.
    pub name_len_min: usize,

    /// Longest accepted display name, in characters, after trimming.
    pub name_len_max: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            name_len_min: 2,
            name_len_max: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Stage / Role
// ---------------------------------------------------------------------------

/// A session's lifecycle phase. Distinct from the round's own state: a
/// client that names itself while a round is running waits in `Lobby`.
///
/// ```text
///   Naming ──(set name)──→ Lobby ──(round starts)──→ InRound
///                            ↑                           │
///                            └──────(round ends)─────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Naming,
    Lobby,
    InRound,
}

/// A player's role. Only meaningful while [`Stage::InRound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Crewmate,
    Impostor,
}

/// One slot of a task ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSlot {
    pub task: TaskId,
    pub done: bool,
}

impl TaskSlot {
    /// A freshly assigned, not yet completed slot.
    pub fn new(task: TaskId) -> Self {
        Self { task, done: false }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A single player's session on the server.
///
/// Owned by the [`ClientRegistry`](crate::ClientRegistry) from the moment
/// the connection is accepted until it closes.
#[derive(Debug)]
pub struct Session {
    pub id: ClientId,

    /// `None` until the client has picked a name.
    pub name: Option<String>,

    pub stage: Stage,

    /// Cleared when the session is unregistered; nothing is delivered to a
    /// disconnected session.
    pub connected: bool,

    pub alive: bool,

    pub role: Role,

    /// `None` outside of a round.
    pub room: Option<RoomId>,

    /// Assigned tasks in draw order. Empty for the impostor.
    pub ledger: Vec<TaskSlot>,

    /// Rooms moved through since this player's last kill.
    pub moves_since_kill: u32,

    /// Emergency meetings this player may still call this round.
    pub meetings_left: u32,

    sender: PacketSender,
}

impl Session {
    /// Creates a session in the naming stage.
    pub fn new(id: ClientId, sender: PacketSender) -> Self {
        Self {
            id,
            name: None,
            stage: Stage::Naming,
            connected: true,
            alive: true,
            role: Role::Crewmate,
            room: None,
            ledger: Vec::new(),
            moves_since_kill: 0,
            meetings_left: 0,
            sender,
        }
    }

    /// Returns `true` once the client has picked a name.
    pub fn is_named(&self) -> bool {
        self.stage != Stage::Naming
    }

    /// Returns `true` while the client takes part in the running round.
    pub fn in_round(&self) -> bool {
        self.stage == Stage::InRound
    }

    pub fn is_impostor(&self) -> bool {
        self.in_round() && self.role == Role::Impostor
    }

    /// An alive crewmate taking part in the round.
    pub fn is_living_crewmate(&self) -> bool {
        self.in_round() && self.alive && self.role == Role::Crewmate
    }

    /// The display name, or an empty string while naming.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Returns `true` if every ledger slot is done.
    pub fn tasks_done(&self) -> bool {
        self.ledger.iter().all(|slot| slot.done)
    }

    /// Queues a packet for this session's writer task.
    ///
    /// Returns `false` if the session is disconnected or its writer task
    /// has already gone away.
    pub fn send(&self, packet: Packet) -> bool {
        self.connected && self.sender.send(packet).is_ok()
    }

    /// Clears everything that only makes sense during a round.
    pub fn reset_round_state(&mut self) {
        self.role = Role::Crewmate;
        self.alive = true;
        self.room = None;
        self.ledger.clear();
        self.moves_since_kill = 0;
        self.meetings_left = 0;
    }

    /// An alive player taking part in the round.
    pub fn is_living_player(&self) -> bool {
        self.in_round() && self.alive
    }
}

#[cfg(test)]
mod tests {
    use airlock_protocol::{PacketType, Status};

    use super::*;

    fn session() -> (Session, mpsc::UnboundedReceiver<Packet>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Session::new(ClientId(1), tx), rx)
    }

    #[test]
    fn test_new_session_is_naming_and_connected() {
        let (session, _rx) = session();
        assert_eq!(session.stage, Stage::Naming);
        assert!(session.connected);
        assert!(!session.is_named());
        assert_eq!(session.display_name(), "");
    }

    #[test]
    fn test_send_queues_packet() {
        let (session, mut rx) = session();
        assert!(session.send(Packet::new(PacketType::Info, Status::Ok)));
        assert_eq!(rx.try_recv().unwrap().kind, PacketType::Info);
    }

    #[test]
    fn test_send_to_disconnected_session_is_dropped() {
        let (mut session, mut rx) = session();
        session.connected = false;
        assert!(!session.send(Packet::new(PacketType::Info, Status::Ok)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_tasks_done_requires_every_slot() {
        let (mut session, _rx) = session();
        session.ledger = vec![TaskSlot::new(TaskId(1)), TaskSlot::new(TaskId(2))];
        assert!(!session.tasks_done());

        session.ledger[0].done = true;
        assert!(!session.tasks_done());

        session.ledger[1].done = true;
        assert!(session.tasks_done());
    }

    #[test]
    fn test_reset_round_state_clears_round_fields() {
        let (mut session, _rx) = session();
        session.role = Role::Impostor;
        session.alive = false;
        session.room = Some(RoomId(3));
        session.ledger.push(TaskSlot::new(TaskId(0)));
        session.moves_since_kill = 4;
        session.meetings_left = 1;

        session.reset_round_state();

        assert_eq!(session.role, Role::Crewmate);
        assert!(session.alive);
        assert_eq!(session.room, None);
        assert!(session.ledger.is_empty());
        assert_eq!(session.moves_since_kill, 0);
        assert_eq!(session.meetings_left, 0);
    }

    #[test]
    fn test_stage_and_role_serialize_as_snake_case() {
        assert_eq!(serde_json::to_string(&Stage::InRound).unwrap(), r#""in_round""#);
        assert_eq!(serde_json::to_string(&Role::Impostor).unwrap(), r#""impostor""#);
    }
}
