//! The round state machine: start, win check, end.

use airlock_protocol::{ClientId, GameStatus, PacketType, Status};
use airlock_session::{Role, Stage};
use rand::Rng;

use crate::{packets, Game, Outbox, RoundState};

impl Game {
    /// Starts a round with every named client.
    ///
    /// Returns `Again` unless the game is in the lobby, and `Invalid` if
    /// fewer than `min_players` clients are named. Otherwise one of them
    /// becomes the impostor, everyone is placed at the spawn room and the
    /// crewmates draw their tasks.
    pub fn start(&mut self, out: &mut Outbox) -> Status {
        if self.state != RoundState::Lobby {
            return Status::Again;
        }

        // Slot order isn't join order; the pick goes through an explicit
        // random index.
        let players: Vec<ClientId> = self.registry.named().map(|s| s.id).collect();
        if players.len() < self.config.min_players {
            tracing::debug!(
                players = players.len(),
                min = self.config.min_players,
                "not enough players to start"
            );
            return Status::Invalid;
        }
        let impostor = players[self.rng.random_range(0..players.len())];

        let spawn = self.map.spawn();
        let cooldown = self.config.kill_cooldown_moves;
        let meetings = self.config.meetings_per_player;
        self.registry.for_each_matching(
            |s| s.is_named(),
            |s| {
                s.reset_round_state();
                s.role = if s.id == impostor {
                    Role::Impostor
                } else {
                    Role::Crewmate
                };
                s.stage = Stage::InRound;
                s.room = Some(spawn);
                s.moves_since_kill = cooldown;
                s.meetings_left = meetings;
            },
        );

        self.state = RoundState::Main;
        self.impostor = Some(impostor);

        tracing::info!(players = players.len(), %impostor, "round started");

        out.broadcast(packets::game_status(GameStatus::Running));
        for &id in &players {
            if let Some(session) = self.registry.find(id) {
                out.send_to(id, packets::state(session));
            }
            self.assign(id, out);
            let info = self.room_info(id);
            if info.status.is_ok() {
                out.send_to(id, info.into_packet(PacketType::RoomInfo));
            }
        }

        Status::Ok
    }

    /// Ends a running round without a winner.
    ///
    /// Returns `Again` if no round is running.
    pub fn stop(&mut self, out: &mut Outbox) -> Status {
        if !self.state.is_running() {
            return Status::Again;
        }
        self.end(None, out);
        Status::Ok
    }

    /// Ends the round if someone has won, and returns the winner.
    ///
    /// Checked in order:
    /// 1. the impostor is dead or gone → crewmates
    /// 2. too few living crewmates remain → impostor
    /// 3. every living crewmate finished their tasks → crewmates
    pub fn check_win(&mut self, out: &mut Outbox) -> Option<Role> {
        if !self.state.is_running() {
            return None;
        }

        let impostor_alive = self
            .impostor
            .and_then(|id| self.registry.find(id))
            .is_some_and(|s| s.alive);

        let winner = if !impostor_alive {
            Some(Role::Crewmate)
        } else if self.living_crewmates() <= self.config.min_alive_crewmates {
            Some(Role::Impostor)
        } else if self.all_done() {
            Some(Role::Crewmate)
        } else {
            None
        };

        if let Some(role) = winner {
            self.end(Some(role), out);
        }
        winner
    }

    /// Announces the outcome and folds everyone back into the lobby.
    ///
    /// `None` ends the round without a winner.
    pub fn end(&mut self, winner: Option<Role>, out: &mut Outbox) {
        self.state = RoundState::Resolution;

        let status = match winner {
            Some(Role::Impostor) => GameStatus::ImpostorWin,
            Some(Role::Crewmate) => GameStatus::CrewmateWin,
            None => GameStatus::Ended,
        };
        tracing::info!(outcome = ?status, impostor = ?self.impostor, "round over");
        out.broadcast(packets::game_status(status));

        self.impostor = None;
        self.discussion = None;
        self.corpses.clear();
        self.registry.for_each_matching(
            |s| s.in_round(),
            |s| {
                s.reset_round_state();
                s.stage = Stage::Lobby;
                out.send_to(s.id, packets::state(s));
            },
        );

        self.state = RoundState::Lobby;
    }

    fn living_crewmates(&self) -> usize {
        self.registry
            .sessions()
            .filter(|s| s.is_living_crewmate())
            .count()
    }
}
