//! The game context: everything a round needs, in one place.

use std::sync::Arc;

use airlock_protocol::{ClientId, Recipient};
use airlock_session::{ClientRegistry, PacketSender, SessionConfig, SessionError};
use airlock_world::GameMap;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::discussion::{Corpse, Discussion};
use crate::{GameConfig, GameError, Outbox, RoundState};

/// The state of the server's one game.
///
/// Owns the client registry alongside the round so that a single lock
/// covers both: a broadcast or a win check always sees a stable set of
/// sessions.
///
/// ## Operations
///
/// | Method | Module | Purpose |
/// |--------|--------|---------|
/// | `set_name`, `list_clients`, `chat`, `disconnect` | lobby | registry-facing |
/// | `start`, `stop`, `check_win`, `end` | round | the state machine |
/// | `move_to`, `vent`, `room_info` | movement | the location graph |
/// | `assign`, `complete`, `all_done` | tasks | the ledger |
/// | `kill` | kill | the impostor's one trick |
/// | `report`, `meeting`, `vote`, `close_discussion` | discussion | voting someone out |
#[derive(Debug)]
pub struct Game {
    pub(crate) registry: ClientRegistry,
    pub(crate) state: RoundState,
    pub(crate) impostor: Option<ClientId>,
    pub(crate) map: Arc<GameMap>,
    pub(crate) config: GameConfig,
    pub(crate) rng: StdRng,
    /// Bodies left by kills since the last discussion.
    pub(crate) corpses: Vec<Corpse>,
    pub(crate) discussion: Option<Discussion>,
    pub(crate) discussion_seq: u64,
}

impl Game {
    /// Creates a game in the lobby, seeded from the OS.
    ///
    /// # Errors
    /// Returns [`GameError`] if `config` doesn't fit `map`.
    pub fn new(
        map: Arc<GameMap>,
        session_config: SessionConfig,
        config: GameConfig,
    ) -> Result<Self, GameError> {
        Self::with_rng(map, session_config, config, StdRng::from_os_rng())
    }

    /// Creates a game with a fixed seed, so impostor picks and task draws
    /// are reproducible.
    ///
    /// # Errors
    /// Returns [`GameError`] if `config` doesn't fit `map`.
    pub fn with_seed(
        map: Arc<GameMap>,
        session_config: SessionConfig,
        config: GameConfig,
        seed: u64,
    ) -> Result<Self, GameError> {
        Self::with_rng(map, session_config, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        map: Arc<GameMap>,
        session_config: SessionConfig,
        config: GameConfig,
        rng: StdRng,
    ) -> Result<Self, GameError> {
        config.validate(&map)?;
        Ok(Self {
            registry: ClientRegistry::new(session_config),
            state: RoundState::Lobby,
            impostor: None,
            map,
            config,
            rng,
            corpses: Vec::new(),
            discussion: None,
            discussion_seq: 0,
        })
    }

    /// Registers a new connection.
    ///
    /// # Errors
    /// Returns [`SessionError::Full`] when every slot is taken.
    pub fn connect(
        &mut self,
        sender: PacketSender,
    ) -> Result<ClientId, SessionError> {
        self.registry.register(sender)
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ClientRegistry {
        &mut self.registry
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    /// The current round's impostor, if a round is running.
    pub fn impostor(&self) -> Option<ClientId> {
        self.impostor
    }

    pub fn map(&self) -> &GameMap {
        &self.map
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Returns `true` if the round is in its main phase and `id` is playing
    /// in it. Nobody is in play while a discussion is open.
    pub fn in_play(&self, id: ClientId) -> bool {
        self.state == RoundState::Main
            && self.registry.find(id).is_some_and(|s| s.in_round())
    }

    /// Routes every packet in `outbox` onto the recipients' queues.
    ///
    /// `All` and `AllExcept` reach named sessions only; `Client` reaches
    /// its session whatever the stage. Packets for clients that have gone
    /// away are dropped.
    pub fn deliver(&self, outbox: Outbox) {
        for (recipient, packet) in outbox {
            match recipient {
                Recipient::Client(id) => {
                    if let Some(session) = self.registry.find(id) {
                        session.send(packet);
                    } else {
                        tracing::trace!(client_id = %id, "dropping packet for departed client");
                    }
                }
                Recipient::All => {
                    for session in self.registry.named() {
                        session.send(packet.clone());
                    }
                }
                Recipient::AllExcept(except) => {
                    for session in self.registry.named().filter(|s| s.id != except) {
                        session.send(packet.clone());
                    }
                }
            }
        }
    }
}
