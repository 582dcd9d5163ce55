//! Registry-facing operations: naming, listing, chat and departure.

use airlock_protocol::{
    ClientEvent, ClientId, Packet, PacketType, PresenceEvent, Status,
};
use airlock_session::{is_printable, validate_name, Stage};
use serde_json::{json, Value};

use crate::{packets, Game, Outbox, Reply, RoundState};

impl Game {
    /// Names a client and moves it from naming into the lobby.
    ///
    /// Replies `{id, name}` on success; the others hear a `join`, and the
    /// new client gets the task catalog and the location graph. A name
    /// already held by another client, ignoring case, is `NameTaken`.
    pub fn set_name(
        &mut self,
        id: ClientId,
        raw: Option<&str>,
        out: &mut Outbox,
    ) -> Reply {
        let Some(session) = self.registry.find(id) else {
            return Status::Invalid.into();
        };
        if session.is_named() {
            return Status::Again.into();
        }

        let name = match validate_name(raw, self.registry.config()) {
            Ok(name) => name,
            Err(e) => {
                tracing::debug!(client_id = %id, error = %e, "name rejected");
                return e.status().into();
            }
        };

        if self
            .registry
            .named()
            .any(|s| s.display_name().eq_ignore_ascii_case(&name))
        {
            tracing::debug!(client_id = %id, %name, "name taken");
            return Status::NameTaken.into();
        }

        let Some(session) = self.registry.find_mut(id) else {
            return Status::Invalid.into();
        };
        session.name = Some(name.clone());
        session.stage = Stage::Lobby;

        tracing::info!(client_id = %id, %name, "client named");

        out.broadcast_except(id, packets::client_info(session, ClientEvent::Join));
        out.send_to(id, packets::task_catalog(&self.map));
        out.send_to(id, packets::location_graph(&self.map));

        Reply::ok_with(json!({ "id": id, "name": name }))
    }

    /// Replies with `[{id, name}]` for every other named client.
    pub fn list_clients(&self, id: ClientId) -> Reply {
        let clients: Vec<Value> = self
            .registry
            .named()
            .filter(|s| s.id != id)
            .map(|s| json!({ "id": s.id, "name": s.display_name() }))
            .collect();
        Reply::ok_with(Value::Array(clients))
    }

    /// Relays a chat line to every other named client.
    ///
    /// Clients waiting in the lobby may always chat. Players in a round
    /// may only chat while a discussion is open, and only while alive;
    /// otherwise they get `Invalid`. The raw line must be printable ASCII
    /// throughout before surrounding spaces are trimmed.
    pub fn chat(
        &mut self,
        id: ClientId,
        content: Option<&str>,
        out: &mut Outbox,
    ) -> Reply {
        let Some(session) = self.registry.find(id) else {
            return Status::Invalid.into();
        };
        let may_speak = !session.in_round()
            || (self.state == RoundState::Discussion && session.alive);
        if !may_speak {
            return Status::Invalid.into();
        }

        let Some(raw) = content else {
            return Status::Invalid.into();
        };
        if !is_printable(raw) {
            return Status::Invalid.into();
        }
        let content = raw.trim_matches(' ');
        let len = content.chars().count();
        if len == 0 || len > self.config.chat_len_max {
            return Status::WrongLength.into();
        }

        tracing::debug!(client_id = %id, len, "chat");

        out.broadcast_except(
            id,
            Packet::new(PacketType::Chat, Status::Ok)
                .with_arguments(json!({ "id": id, "content": content })),
        );
        Reply::ok()
    }

    /// Removes a client for good.
    ///
    /// Safe to call more than once: only the first call has any effect.
    /// Named clients are announced as leaving; a player who was in a
    /// round is announced to their room, and the round is re-checked for
    /// a winner.
    pub fn disconnect(&mut self, id: ClientId, out: &mut Outbox) {
        let Some(session) = self.registry.unregister(id) else {
            return;
        };

        if session.is_named() {
            out.broadcast(packets::client_info(&session, ClientEvent::Leave));
        }

        if let Some(room) = session.room.filter(|_| session.in_round()) {
            let leave = packets::presence(&session, PresenceEvent::Leave);
            for other in self
                .registry
                .sessions()
                .filter(|s| s.in_round() && s.room == Some(room))
            {
                out.send_to(other.id, leave.clone());
            }
        }

        if self.state.is_running() {
            self.check_win(out);
        }
        self.forget_voter(id, out);
    }
}
