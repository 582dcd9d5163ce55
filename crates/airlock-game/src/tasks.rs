//! Task ledgers: drawing tasks and completing them.

use airlock_protocol::{ClientId, Status, TaskId};
use airlock_session::TaskSlot;
use rand::seq::index;

use crate::{packets, Game, Outbox};

impl Game {
    /// Draws a fresh ledger of distinct tasks for a crewmate and pushes it.
    ///
    /// No-op for the impostor and for clients outside the round.
    pub fn assign(&mut self, id: ClientId, out: &mut Outbox) {
        let Some(session) = self.registry.find_mut(id) else {
            return;
        };
        if !session.in_round() || session.is_impostor() {
            return;
        }

        let drawn = index::sample(
            &mut self.rng,
            self.map.tasks().len(),
            self.config.task_amount,
        );
        session.ledger = drawn
            .into_iter()
            .map(|i| TaskSlot::new(TaskId(i as u32)))
            .collect();

        tracing::debug!(client_id = %id, tasks = session.ledger.len(), "tasks assigned");
        out.send_to(id, packets::tasks(session, &self.map));
    }

    /// Marks a task done for a crewmate standing in the task's room.
    ///
    /// | Condition | Status |
    /// |-----------|--------|
    /// | no running round, or not playing in it | `NotInGame` |
    /// | the impostor | `WrongRole` |
    /// | task not on the ledger | `Invalid` |
    /// | already done | `Again` |
    /// | not in the task's room | `WrongLocation` |
    ///
    /// On success the win condition is re-checked.
    pub fn complete(
        &mut self,
        id: ClientId,
        task: TaskId,
        out: &mut Outbox,
    ) -> Status {
        if !self.in_play(id) {
            return Status::NotInGame;
        }
        let Some(session) = self.registry.find_mut(id) else {
            return Status::NotInGame;
        };
        if session.is_impostor() {
            return Status::WrongRole;
        }

        let Some(slot_index) = session.ledger.iter().position(|s| s.task == task) else {
            return Status::Invalid;
        };
        if session.ledger[slot_index].done {
            return Status::Again;
        }
        let Some(task_room) = self.map.task(task).map(|t| t.room) else {
            return Status::Invalid;
        };
        if session.room != Some(task_room) {
            return Status::WrongLocation;
        }

        session.ledger[slot_index].done = true;
        tracing::info!(client_id = %id, %task, "task completed");

        self.check_win(out);
        Status::Ok
    }

    /// Returns `true` if every living crewmate in the round has finished
    /// every task on their ledger.
    pub fn all_done(&self) -> bool {
        self.registry
            .sessions()
            .filter(|s| s.is_living_crewmate())
            .all(|s| s.tasks_done())
    }
}
