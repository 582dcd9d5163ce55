//! Walking between rooms, and the impostor's shortcut through the vents.

use airlock_protocol::{ClientId, PresenceEvent, RoomId, Status};

use serde_json::{json, Value};

use crate::{packets, Game, Outbox, Reply};

impl Game {
    /// Moves a player through a door.
    ///
    /// Returns `NotInGame` outside a round, `Again` if the player is
    /// already there and `Invalid` if no door leads there. On success the
    /// other players in the room left and in the room entered each hear
    /// one presence packet; the mover hears none.
    pub fn move_to(
        &mut self,
        id: ClientId,
        to: RoomId,
        out: &mut Outbox,
    ) -> Status {
        if !self.in_play(id) {
            return Status::NotInGame;
        }
        let Some(session) = self.registry.find_mut(id) else {
            return Status::NotInGame;
        };

        let from = session.room;
        if from == Some(to) {
            return Status::Again;
        }
        if !self.map.can_move(from, to) {
            tracing::debug!(client_id = %id, ?from, %to, "no door");
            return Status::Invalid;
        }

        session.room = Some(to);
        session.moves_since_kill = session.moves_since_kill.saturating_add(1);

        let leave = packets::presence(session, PresenceEvent::Leave);
        let enter = packets::presence(session, PresenceEvent::Enter);

        for other in self
            .registry
            .sessions()
            .filter(|s| s.id != id && s.in_round())
        {
            if from.is_some() && other.room == from {
                out.send_to(other.id, leave.clone());
            } else if other.room == Some(to) {
                out.send_to(other.id, enter.clone());
            }
        }

        tracing::debug!(client_id = %id, ?from, %to, "moved");
        Status::Ok
    }

    /// Moves the impostor through a vent.
    ///
    /// | Condition | Status |
    /// |-----------|--------|
    /// | round not in its main phase, or not playing | `NotInGame` |
    /// | a crewmate | `WrongRole` |
    /// | dead | `Invalid` |
    /// | already there | `Again` |
    /// | no vent leads there | `Invalid` |
    ///
    /// The rooms left and entered hear `vent_leave` and `vent_enter`.
    /// Venting doesn't count toward the kill cooldown.
    pub fn vent(
        &mut self,
        id: ClientId,
        to: RoomId,
        out: &mut Outbox,
    ) -> Status {
        if !self.in_play(id) {
            return Status::NotInGame;
        }
        let Some(session) = self.registry.find_mut(id) else {
            return Status::NotInGame;
        };
        if !session.is_impostor() {
            return Status::WrongRole;
        }
        if !session.alive {
            return Status::Invalid;
        }
        let Some(from) = session.room else {
            return Status::NotInGame;
        };
        if from == to {
            return Status::Again;
        }
        if !self.map.can_vent(from, to) {
            tracing::debug!(client_id = %id, %from, %to, "no vent");
            return Status::Invalid;
        }

        session.room = Some(to);

        let leave = packets::presence(session, PresenceEvent::VentLeave);
        let enter = packets::presence(session, PresenceEvent::VentEnter);

        for other in self
            .registry
            .sessions()
            .filter(|s| s.id != id && s.in_round())
        {
            if other.room == Some(from) {
                out.send_to(other.id, leave.clone());
            } else if other.room == Some(to) {
                out.send_to(other.id, enter.clone());
            }
        }

        tracing::debug!(client_id = %id, %from, %to, "vented");
        Status::Ok
    }

    /// Describes the player's current room: its doors, everyone else in it
    /// and any bodies lying there.
    ///
    /// Returns `NotInGame` outside a round.
    pub fn room_info(&self, id: ClientId) -> Reply {
        if !self.in_play(id) {
            return Status::NotInGame.into();
        }
        let Some(room) = self
            .registry
            .find(id)
            .and_then(|s| s.room)
            .and_then(|room| self.map.room(room))
        else {
            return Status::NotInGame.into();
        };

        let occupants = self
            .registry
            .sessions()
            .filter(|s| s.id != id && s.in_round() && s.room == Some(room.id));

        let mut arguments = packets::room_info_arguments(room, &self.map, occupants);
        let bodies: Vec<Value> = self
            .corpses
            .iter()
            .filter(|c| c.room == room.id)
            .map(|c| json!({ "id": c.id, "name": c.name }))
            .collect();
        arguments["bodies"] = Value::Array(bodies);
        Reply::ok_with(arguments)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use airlock_protocol::{Packet, PacketType};
    use airlock_session::SessionConfig;
    use airlock_world::GameMap;
    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;
    use crate::GameConfig;

    struct Table {
        game: Game,
        players: Vec<(ClientId, mpsc::UnboundedReceiver<Packet>)>,
    }

    impl Table {
        fn new(count: usize) -> Self {
            let map = Arc::new(GameMap::skeld().unwrap());
            let mut game =
                Game::with_seed(map, SessionConfig::default(), GameConfig::default(), 9)
                    .unwrap();
            let mut players = Vec::new();
            for i in 0..count {
                let (tx, rx) = mpsc::unbounded_channel();
                let id = game.connect(tx).unwrap();
                game.set_name(id, Some(&format!("P{i}")), &mut Outbox::new());
                players.push((id, rx));
            }
            game.start(&mut Outbox::new());
            Self { game, players }
        }

        fn id(&self, index: usize) -> ClientId {
            self.players[index].0
        }

        fn room(&self, name: &str) -> RoomId {
            self.game.map().room_by_name(name).unwrap().id
        }

        fn walk(&mut self, index: usize, room: &str) -> Status {
            let (id, to) = (self.id(index), self.room(room));
            let mut out = Outbox::new();
            let status = self.game.move_to(id, to, &mut out);
            self.game.deliver(out);
            status
        }

        fn impostor(&self) -> usize {
            let impostor = self.game.impostor().unwrap();
            self.players.iter().position(|(id, _)| *id == impostor).unwrap()
        }

        fn vent(&mut self, index: usize, room: &str) -> Status {
            let (id, to) = (self.id(index), self.room(room));
            let mut out = Outbox::new();
            let status = self.game.vent(id, to, &mut out);
            self.game.deliver(out);
            status
        }

        fn drain(&mut self, index: usize) -> Vec<Packet> {
            let rx = &mut self.players[index].1;
            std::iter::from_fn(|| rx.try_recv().ok()).collect()
        }
    }

    #[test]
    fn test_move_through_door_updates_room() {
        let mut table = Table::new(2);
        assert_eq!(table.walk(0, "MedBay"), Status::Ok);
        let room = table.game.registry().find(table.id(0)).unwrap().room;
        assert_eq!(room, Some(table.room("MedBay")));
    }

    #[test]
    fn test_move_without_door_is_invalid_and_stays() {
        let mut table = Table::new(2);
        assert_eq!(table.walk(0, "Reactor"), Status::Invalid);
        let room = table.game.registry().find(table.id(0)).unwrap().room;
        assert_eq!(room, Some(table.game.map().spawn()));
    }

    #[test]
    fn test_move_to_same_room_is_again() {
        let mut table = Table::new(2);
        assert_eq!(table.walk(0, "Cafeteria"), Status::Again);
    }

    #[test]
    fn test_move_outside_round_is_not_in_game() {
        let mut table = Table::new(2);
        table.game.stop(&mut Outbox::new());
        assert_eq!(table.walk(0, "MedBay"), Status::NotInGame);
    }

    #[test]
    fn test_move_counts_toward_kill_cooldown() {
        let mut table = Table::new(2);
        let before = table.game.registry().find(table.id(0)).unwrap().moves_since_kill;
        table.walk(0, "MedBay");
        let after = table.game.registry().find(table.id(0)).unwrap().moves_since_kill;
        assert_eq!(after, before + 1);
    }

    #[test]
    fn test_move_notifies_old_and_new_room_but_not_mover() {
        let mut table = Table::new(4);
        // P2 waits in MedBay, P0 and P1 in the Cafeteria, P3 in Admin.
        assert_eq!(table.walk(2, "MedBay"), Status::Ok);
        assert_eq!(table.walk(3, "Admin"), Status::Ok);
        for i in 0..4 {
            table.drain(i);
        }

        assert_eq!(table.walk(0, "MedBay"), Status::Ok);

        assert!(table.drain(0).is_empty());

        let to_p1 = table.drain(1);
        assert_eq!(to_p1.len(), 1);
        assert_eq!(to_p1[0].kind, PacketType::Presence);
        assert_eq!(to_p1[0].arguments.as_ref().unwrap()["event"], "leave");

        let to_p2 = table.drain(2);
        assert_eq!(to_p2.len(), 1);
        assert_eq!(to_p2[0].arguments.as_ref().unwrap()["event"], "enter");
        assert_eq!(to_p2[0].arguments.as_ref().unwrap()["id"], json!(table.id(0)));

        assert!(table.drain(3).is_empty());
    }

    #[test]
    fn test_room_info_lists_doors_and_others() {
        let table = Table::new(2);
        let reply = table.game.room_info(table.id(0));
        let args = reply.arguments.unwrap();

        assert_eq!(args["name"], "Cafeteria");
        assert_eq!(args["doors"].as_array().unwrap().len(), 5);
        assert_eq!(
            args["occupants"],
            json!([{ "id": table.id(1), "name": "P1", "alive": true }])
        );
        assert_eq!(args["bodies"], json!([]));
    }

    #[test]
    fn test_room_info_lists_bodies() {
        let mut table = Table::new(3);
        let impostor = table.impostor();
        let victim = (impostor + 1) % 3;
        let (killer, target) = (table.id(impostor), table.id(victim));
        assert_eq!(table.game.kill(killer, target, &mut Outbox::new()), Status::Ok);

        let args = table.game.room_info(killer).arguments.unwrap();

        assert_eq!(
            args["bodies"],
            json!([{ "id": target, "name": format!("P{victim}") }])
        );
    }

    // =====================================================================
    // vent()
    // =====================================================================

    #[test]
    fn test_vent_by_crewmate_is_wrong_role() {
        let mut table = Table::new(2);
        let crew = 1 - table.impostor();
        assert_eq!(table.vent(crew, "Admin"), Status::WrongRole);
    }

    #[test]
    fn test_vent_moves_impostor_without_touching_cooldown() {
        let mut table = Table::new(3);
        let impostor = table.impostor();
        let before = table
            .game
            .registry()
            .find(table.id(impostor))
            .unwrap()
            .moves_since_kill;

        assert_eq!(table.vent(impostor, "Admin"), Status::Ok);

        let session = table.game.registry().find(table.id(impostor)).unwrap();
        assert_eq!(session.room, Some(table.room("Admin")));
        assert_eq!(session.moves_since_kill, before);
    }

    #[test]
    fn test_vent_announces_vent_events() {
        let mut table = Table::new(3);
        let impostor = table.impostor();
        let (stays, goes) = ((impostor + 1) % 3, (impostor + 2) % 3);
        assert_eq!(table.walk(goes, "Admin"), Status::Ok);
        for i in 0..3 {
            table.drain(i);
        }

        assert_eq!(table.vent(impostor, "Admin"), Status::Ok);

        assert!(table.drain(impostor).is_empty());
        let to_stayer = table.drain(stays);
        assert_eq!(to_stayer.len(), 1);
        assert_eq!(to_stayer[0].arguments.as_ref().unwrap()["event"], "vent_leave");
        let to_goer = table.drain(goes);
        assert_eq!(to_goer.len(), 1);
        assert_eq!(to_goer[0].arguments.as_ref().unwrap()["event"], "vent_enter");
    }

    #[test]
    fn test_vent_without_link_is_invalid() {
        let mut table = Table::new(2);
        let impostor = table.impostor();
        assert_eq!(table.vent(impostor, "MedBay"), Status::Invalid);
        assert_eq!(table.vent(impostor, "Cafeteria"), Status::Again);
    }

    #[test]
    fn test_vent_outside_round_is_not_in_game() {
        let mut table = Table::new(2);
        let impostor = table.impostor();
        table.game.stop(&mut Outbox::new());
        assert_eq!(table.vent(impostor, "Admin"), Status::NotInGame);
    }

    #[test]
    fn test_room_info_outside_round_is_not_in_game() {
        let mut table = Table::new(2);
        table.game.stop(&mut Outbox::new());
        assert_eq!(table.game.room_info(table.id(0)).status, Status::NotInGame);
    }
}
