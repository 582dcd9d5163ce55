//! Game configuration and the round state machine.

use airlock_world::GameMap;
use serde::{Deserialize, Serialize};

use crate::GameError;

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Tuning knobs for a round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Tasks drawn for each crewmate at the start of a round.
    pub task_amount: usize,

    /// Named players required before a round can start.
    pub min_players: usize,

    /// The impostor wins once this many living crewmates (or fewer) remain.
    pub min_alive_crewmates: usize,

    /// Rooms the impostor must walk through between kills. The first kill
    /// of a round is available immediately.
    pub kill_cooldown_moves: u32,

    /// Longest accepted chat message, in characters.
    pub chat_len_max: usize,

    /// Emergency meetings each player may call per round.
    pub meetings_per_player: u32,

    /// Seconds a discussion stays open before the votes are counted.
    pub discussion_secs: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            task_amount: 10,
            min_players: 2,
            min_alive_crewmates: 0,
            kill_cooldown_moves: 5,
            chat_len_max: 100,
            meetings_per_player: 2,
            discussion_secs: 60,
        }
    }
}

impl GameConfig {
    /// Checks the config against the map it will be played on.
    ///
    /// # Errors
    /// - [`GameError::TaskAmount`] — more tasks per crewmate than the map has
    /// - [`GameError::Config`] — fewer than two players, a zero chat limit,
    ///   or a zero discussion time
    pub fn validate(&self, map: &GameMap) -> Result<(), GameError> {
        let available = map.tasks().len();
        if self.task_amount > available {
            return Err(GameError::TaskAmount {
                requested: self.task_amount,
                available,
            });
        }
        if self.min_players < 2 {
            return Err(GameError::Config("min_players must be at least 2"));
        }
        if self.chat_len_max == 0 {
            return Err(GameError::Config("chat_len_max must be positive"));
        }
        if self.discussion_secs == 0 {
            return Err(GameError::Config("discussion_secs must be positive"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RoundState
// ---------------------------------------------------------------------------

/// The lifecycle state of the round.
///
/// ```text
/// Lobby ──start()──→ Main ──(win / end_game)──→ Resolution ──→ Lobby
///                    │  ↑
///    report/meeting  ↓  │  votes counted
///                 Discussion
/// ```
///
/// - **Lobby**: players join and chat; `start_game` is accepted.
/// - **Main**: a round is running; movement, tasks, kills, vents, reports
///   and meetings are accepted.
/// - **Discussion**: the round is paused for a vote; living players may
///   chat and vote, nothing else moves.
/// - **Resolution**: the outcome is being announced. Transient: the state
///   folds back into `Lobby` before the lock is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundState {
    #[default]
    Lobby,
    Main,
    Discussion,
    Resolution,
}

impl RoundState {
    /// Returns `true` while a round is being played, discussions included.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Main | Self::Discussion)
    }
}

impl std::fmt::Display for RoundState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Main => write!(f, "Main"),
            Self::Discussion => write!(f, "Discussion"),
            Self::Resolution => write!(f, "Resolution"),
        }
    }
}
