//! Discussions: reporting bodies, the emergency button, votes and ejection.

use std::collections::BTreeMap;

use airlock_protocol::{
    ClientId, DiscussionReason, DiscussionResult, RoomId, Status,
};
use serde_json::{json, Value};

use crate::{packets, Game, Outbox, RoundState};

/// A body left by a kill. Bodies stay put until the next discussion
/// closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Corpse {
    pub(crate) id: ClientId,
    pub(crate) name: String,
    pub(crate) room: RoomId,
}

/// The open discussion.
#[derive(Debug)]
pub(crate) struct Discussion {
    pub(crate) id: u64,

    /// Voter to choice; `None` is a skip.
    pub(crate) ballots: BTreeMap<ClientId, Option<ClientId>>,
}

impl Game {
    /// The open discussion's id, if there is one.
    ///
    /// Ids are never reused, so a timer armed for one discussion can tell
    /// whether it is still the open one.
    pub fn discussion_id(&self) -> Option<u64> {
        self.discussion.as_ref().map(|d| d.id)
    }

    /// Reports a body in the reporter's room and opens a discussion.
    ///
    /// | Condition | Status |
    /// |-----------|--------|
    /// | round not in its main phase, or reporter not playing | `NotInGame` |
    /// | reporter dead | `Invalid` |
    /// | no body in the reporter's room | `WrongLocation` |
    pub fn report(&mut self, id: ClientId, out: &mut Outbox) -> Status {
        let room = match self.living_caller(id) {
            Ok(room) => room,
            Err(status) => return status,
        };
        let Some(body) = self
            .corpses
            .iter()
            .find(|c| Some(c.room) == room)
            .map(|c| c.id)
        else {
            return Status::WrongLocation;
        };

        tracing::info!(client_id = %id, %body, "body reported");
        self.open_discussion(id, DiscussionReason::Report, Some(body), out);
        Status::Ok
    }

    /// Presses the emergency button, which sits in the spawn room.
    ///
    /// | Condition | Status |
    /// |-----------|--------|
    /// | round not in its main phase, or caller not playing | `NotInGame` |
    /// | caller dead | `Invalid` |
    /// | caller outside the spawn room | `WrongLocation` |
    /// | caller has used up their meetings | `Again` |
    pub fn meeting(&mut self, id: ClientId, out: &mut Outbox) -> Status {
        let room = match self.living_caller(id) {
            Ok(room) => room,
            Err(status) => return status,
        };
        if room != Some(self.map.spawn()) {
            return Status::WrongLocation;
        }
        let Some(session) = self.registry.find_mut(id) else {
            return Status::NotInGame;
        };
        if session.meetings_left == 0 {
            return Status::Again;
        }
        session.meetings_left -= 1;

        tracing::info!(client_id = %id, left = session.meetings_left, "emergency meeting");
        self.open_discussion(id, DiscussionReason::Button, None, out);
        Status::Ok
    }

    /// Casts a vote in the open discussion; `None` skips.
    ///
    /// | Condition | Status |
    /// |-----------|--------|
    /// | no discussion open, or voter not in the round | `NotInGame` |
    /// | voter dead | `Invalid` |
    /// | voter already voted | `Again` |
    /// | target is the voter, or not a living player | `Invalid` |
    ///
    /// Everyone hears the updated count. The last living player to vote
    /// closes the discussion.
    pub fn vote(
        &mut self,
        id: ClientId,
        target: Option<ClientId>,
        out: &mut Outbox,
    ) -> Status {
        let Some(voter) = self.registry.find(id).filter(|s| s.in_round()) else {
            return Status::NotInGame;
        };
        if self.state != RoundState::Discussion {
            return Status::NotInGame;
        }
        if !voter.alive {
            return Status::Invalid;
        }
        let Some(discussion) = self.discussion.as_ref() else {
            return Status::NotInGame;
        };
        if discussion.ballots.contains_key(&id) {
            return Status::Again;
        }
        if let Some(target) = target {
            let living = self
                .registry
                .find(target)
                .is_some_and(|s| s.is_living_player());
            if target == id || !living {
                return Status::Invalid;
            }
        }

        let Some(discussion) = self.discussion.as_mut() else {
            return Status::NotInGame;
        };
        discussion.ballots.insert(id, target);
        let discussion = discussion.id;

        tracing::debug!(client_id = %id, ?target, "vote cast");
        out.broadcast(self.votes_packet());

        if self.everyone_voted() {
            self.close_discussion(discussion, out);
        }
        Status::Ok
    }

    /// Counts the votes of discussion `id` and resumes the round.
    ///
    /// A player with strictly more votes than the skips and than anyone
    /// else is ejected and dies. Bodies are cleared and the round is
    /// re-checked for a winner. Returns `false` if `id` is not the open
    /// discussion.
    pub fn close_discussion(&mut self, id: u64, out: &mut Outbox) -> bool {
        if self.discussion_id() != Some(id) {
            return false;
        }
        let (skips, counts) = self.tally();
        self.discussion = None;

        let top = counts.values().copied().max().unwrap_or(0);
        let leaders: Vec<ClientId> = counts
            .iter()
            .filter(|&(_, &votes)| votes == top)
            .map(|(&candidate, _)| candidate)
            .collect();
        let (result, ejected) = match leaders[..] {
            _ if top <= skips => (DiscussionResult::Skip, None),
            [only] => (DiscussionResult::Eject, Some(only)),
            _ => (DiscussionResult::Tie, None),
        };

        tracing::info!(discussion = id, ?result, ?ejected, skips, "discussion closed");

        match ejected.and_then(|c| self.registry.find_mut(c)) {
            Some(session) => {
                session.alive = false;
                out.broadcast(packets::discussion_result(result, Some(session)));
                out.send_to(session.id, packets::state(session));
            }
            None => out.broadcast(packets::discussion_result(result, None)),
        }

        self.corpses.clear();
        self.state = RoundState::Main;
        self.check_win(out);
        true
    }

    /// Drops a departed voter's ballot and closes the discussion if
    /// everyone left has voted.
    pub(crate) fn forget_voter(&mut self, id: ClientId, out: &mut Outbox) {
        let Some(discussion) = self.discussion.as_mut() else {
            return;
        };
        discussion.ballots.remove(&id);
        let discussion = discussion.id;
        if self.everyone_voted() {
            self.close_discussion(discussion, out);
        }
    }

    fn living_caller(&self, id: ClientId) -> Result<Option<RoomId>, Status> {
        if !self.in_play(id) {
            return Err(Status::NotInGame);
        }
        match self.registry.find(id) {
            None => Err(Status::NotInGame),
            Some(session) if !session.alive => Err(Status::Invalid),
            Some(session) => Ok(session.room),
        }
    }

    fn open_discussion(
        &mut self,
        caller: ClientId,
        reason: DiscussionReason,
        body: Option<ClientId>,
        out: &mut Outbox,
    ) {
        self.discussion_seq += 1;
        self.discussion = Some(Discussion {
            id: self.discussion_seq,
            ballots: BTreeMap::new(),
        });
        self.state = RoundState::Discussion;
        out.broadcast(packets::discussion_start(reason, caller, body));
    }

    /// Skips, and votes per living player. A vote for someone who has
    /// since died or left counts as a skip.
    fn tally(&self) -> (usize, BTreeMap<ClientId, usize>) {
        let mut skips = 0;
        let mut counts = BTreeMap::new();
        let Some(discussion) = &self.discussion else {
            return (skips, counts);
        };
        for choice in discussion.ballots.values() {
            let living = choice.filter(|target| {
                self.registry
                    .find(*target)
                    .is_some_and(|s| s.is_living_player())
            });
            match living {
                Some(target) => *counts.entry(target).or_insert(0) += 1,
                None => skips += 1,
            }
        }
        (skips, counts)
    }

    fn votes_packet(&self) -> airlock_protocol::Packet {
        let (skips, counts) = self.tally();
        let candidates: Vec<Value> = self
            .registry
            .sessions()
            .filter(|s| s.is_living_player())
            .map(|s| {
                json!({
                    "id": s.id,
                    "name": s.display_name(),
                    "votes": counts.get(&s.id).copied().unwrap_or(0),
                })
            })
            .collect();
        packets::votes(skips, candidates)
    }

    fn everyone_voted(&self) -> bool {
        let Some(discussion) = &self.discussion else {
            return false;
        };
        self.registry
            .sessions()
            .filter(|s| s.is_living_player())
            .all(|s| discussion.ballots.contains_key(&s.id))
    }
}
