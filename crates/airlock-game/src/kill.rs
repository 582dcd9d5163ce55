//! The impostor's kill.

use airlock_protocol::{ClientId, Status};

use crate::discussion::Corpse;
use crate::{packets, Game, Outbox};

impl Game {
    /// The impostor kills another player in the same room.
    ///
    /// | Condition | Status |
    /// |-----------|--------|
    /// | no running round, or killer not playing in it | `NotInGame` |
    /// | killer is a crewmate | `WrongRole` |
    /// | killer dead; target missing, self, outside the round or dead | `Invalid` |
    /// | target in another room | `WrongLocation` |
    /// | fewer than `kill_cooldown_moves` rooms walked since the last kill | `Again` |
    ///
    /// On success the victim gets a fresh State push, their body is left in
    /// the room for someone to report, and the round is re-checked for a
    /// winner.
    pub fn kill(
        &mut self,
        killer: ClientId,
        target: ClientId,
        out: &mut Outbox,
    ) -> Status {
        if !self.in_play(killer) {
            return Status::NotInGame;
        }
        let Some(attacker) = self.registry.find(killer) else {
            return Status::NotInGame;
        };
        if !attacker.is_impostor() {
            return Status::WrongRole;
        }
        if !attacker.alive || target == killer {
            return Status::Invalid;
        }
        let (room, walked) = (attacker.room, attacker.moves_since_kill);

        let Some(victim) = self.registry.find(target) else {
            return Status::Invalid;
        };
        if !victim.in_round() || !victim.alive {
            return Status::Invalid;
        }
        if victim.room != room {
            return Status::WrongLocation;
        }
        if walked < self.config.kill_cooldown_moves {
            tracing::debug!(client_id = %killer, walked, "kill on cooldown");
            return Status::Again;
        }

        if let Some(victim) = self.registry.find_mut(target) {
            victim.alive = false;
            out.send_to(target, packets::state(victim));
            if let Some(room) = victim.room {
                self.corpses.push(Corpse {
                    id: target,
                    name: victim.display_name().to_string(),
                    room,
                });
            }
        }
        if let Some(attacker) = self.registry.find_mut(killer) {
            attacker.moves_since_kill = 0;
        }

        tracing::info!(client_id = %killer, %target, "kill");

        self.check_win(out);
        Status::Ok
    }
}
