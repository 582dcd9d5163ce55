//! Packet dispatch: the stage gate, the handler table and the handlers.
//!
//! Every inbound packet that makes it past the gate gets exactly one
//! direct reply, of the same type as the request, delivered before any
//! other packet the operation produced.

use airlock_game::{Game, Outbox, Reply};
use airlock_protocol::{ClientId, Inbound, PacketType, RoomId, Status, TaskId};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// A handler for one inbound packet type.
///
/// Side-effect packets go into the outbox; the return value is the direct
/// reply to the sender.
pub(crate) type Handler = fn(&mut Game, ClientId, &Inbound, &mut Outbox) -> Reply;

/// Looks up the handler for an inbound packet type.
///
/// Server-push-only types have none.
pub(crate) fn handler_for(kind: PacketType) -> Option<Handler> {
    match kind {
        PacketType::Name => Some(set_name),
        PacketType::Clients => Some(list_clients),
        PacketType::Command => Some(run_command),
        PacketType::Chat => Some(chat),
        PacketType::Location => Some(set_location),
        PacketType::RoomInfo => Some(room_info),
        PacketType::Task => Some(do_task),
        PacketType::Kill => Some(kill),
        PacketType::Report => Some(report),
        PacketType::Meeting => Some(meeting),
        PacketType::Vote => Some(vote),
        PacketType::Vent => Some(vent),
        PacketType::Info
        | PacketType::ClientInfo
        | PacketType::GameStatus
        | PacketType::State
        | PacketType::Tasks
        | PacketType::Presence
        | PacketType::TaskCatalog
        | PacketType::LocationGraph
        | PacketType::Discussion
        | PacketType::Votes => None,
    }
}

/// Runs one inbound packet and returns everything to deliver, reply first.
///
/// Packets from unknown clients, packets other than `Name` from clients
/// still naming, and packets with no inbound handler are dropped without
/// a reply.
pub fn dispatch(game: &mut Game, client: ClientId, inbound: &Inbound) -> Outbox {
    let mut out = Outbox::new();

    let Some(session) = game.registry().find(client) else {
        tracing::debug!(%client, "packet from unregistered client");
        return out;
    };
    if !session.is_named() && inbound.kind != PacketType::Name {
        tracing::debug!(%client, kind = ?inbound.kind, "dropping packet before naming");
        return out;
    }
    let Some(handler) = handler_for(inbound.kind) else {
        tracing::debug!(%client, kind = ?inbound.kind, "no inbound handler");
        return out;
    };

    let mut effects = Outbox::new();
    let reply = handler(game, client, inbound, &mut effects);
    tracing::debug!(%client, kind = ?inbound.kind, status = ?reply.status, "handled");

    out.send_to(client, reply.into_packet(inbound.kind));
    out.extend(effects);
    out
}

/// Parses the arguments object, turning a shape mismatch into `Invalid`.
fn args<T: DeserializeOwned>(client: ClientId, inbound: &Inbound) -> Result<T, Reply> {
    inbound.parse_arguments().map_err(|e| {
        tracing::debug!(%client, error = %e, "bad arguments");
        Reply::from(Status::Invalid)
    })
}

// ---------------------------------------------------------------------------
// Argument shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct NameArgs {
    name: Option<String>,
}

#[derive(Deserialize)]
struct ChatArgs {
    content: Option<String>,
}

/// A room given by id or by name.
#[derive(Deserialize)]
#[serde(untagged)]
enum RoomRef {
    Id(RoomId),
    Name(String),
}

#[derive(Deserialize)]
struct LocationArgs {
    room: RoomRef,
}

#[derive(Deserialize)]
struct TaskArgs {
    task: TaskId,
}

#[derive(Deserialize)]
struct KillArgs {
    target: ClientId,
}

/// A missing or null target is a skip.
#[derive(Deserialize)]
struct VoteArgs {
    target: Option<ClientId>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn set_name(game: &mut Game, client: ClientId, inbound: &Inbound, out: &mut Outbox) -> Reply {
    if game.registry().find(client).is_some_and(|s| s.is_named()) {
        return Status::Again.into();
    }
    match args::<NameArgs>(client, inbound) {
        Ok(a) => game.set_name(client, a.name.as_deref(), out),
        Err(reply) => reply,
    }
}

fn list_clients(game: &mut Game, client: ClientId, _: &Inbound, _: &mut Outbox) -> Reply {
    game.list_clients(client)
}

fn run_command(game: &mut Game, client: ClientId, inbound: &Inbound, out: &mut Outbox) -> Reply {
    let a = match args::<NameArgs>(client, inbound) {
        Ok(a) => a,
        Err(reply) => return reply,
    };
    let status = match a.name.as_deref() {
        Some("start_game") => game.start(out),
        Some("end_game") => game.stop(out),
        other => {
            tracing::debug!(%client, command = ?other, "unknown command");
            Status::Invalid
        }
    };
    tracing::info!(%client, command = ?a.name, ?status, "command");
    status.into()
}

fn chat(game: &mut Game, client: ClientId, inbound: &Inbound, out: &mut Outbox) -> Reply {
    match args::<ChatArgs>(client, inbound) {
        Ok(a) => game.chat(client, a.content.as_deref(), out),
        Err(reply) => reply,
    }
}

fn set_location(game: &mut Game, client: ClientId, inbound: &Inbound, out: &mut Outbox) -> Reply {
    if !game.in_play(client) {
        return Status::NotInGame.into();
    }
    let a = match args::<LocationArgs>(client, inbound) {
        Ok(a) => a,
        Err(reply) => return reply,
    };
    let Some(to) = resolve_room(game, a.room) else {
        return Status::Invalid.into();
    };

    let status = game.move_to(client, to, out);
    if status.is_ok() {
        let info = game.room_info(client);
        out.send_to(client, info.into_packet(PacketType::RoomInfo));
    }
    status.into()
}

fn resolve_room(game: &Game, room: RoomRef) -> Option<RoomId> {
    let room = match room {
        RoomRef::Id(id) => game.map().room(id),
        RoomRef::Name(name) => game.map().room_by_name(&name),
    };
    room.map(|r| r.id)
}

fn room_info(game: &mut Game, client: ClientId, _: &Inbound, _: &mut Outbox) -> Reply {
    game.room_info(client)
}

fn do_task(game: &mut Game, client: ClientId, inbound: &Inbound, out: &mut Outbox) -> Reply {
    if !game.in_play(client) {
        return Status::NotInGame.into();
    }
    if game.impostor() == Some(client) {
        return Status::WrongRole.into();
    }
    let a = match args::<TaskArgs>(client, inbound) {
        Ok(a) => a,
        Err(reply) => return reply,
    };
    let status = game.complete(client, a.task, out);
    Reply::from(status).with_arguments(serde_json::json!({ "task": a.task }))
}

fn kill(game: &mut Game, client: ClientId, inbound: &Inbound, out: &mut Outbox) -> Reply {
    if !game.in_play(client) {
        return Status::NotInGame.into();
    }
    if game.impostor() != Some(client) {
        return Status::WrongRole.into();
    }
    let a = match args::<KillArgs>(client, inbound) {
        Ok(a) => a,
        Err(reply) => return reply,
    };
    match game.kill(client, a.target, out) {
        Status::Ok => Reply::ok_with(serde_json::json!({ "target": a.target })),
        status => status.into(),
    }
}

fn report(game: &mut Game, client: ClientId, _: &Inbound, out: &mut Outbox) -> Reply {
    game.report(client, out).into()
}

fn meeting(game: &mut Game, client: ClientId, _: &Inbound, out: &mut Outbox) -> Reply {
    game.meeting(client, out).into()
}

fn vote(game: &mut Game, client: ClientId, inbound: &Inbound, out: &mut Outbox) -> Reply {
    match args::<VoteArgs>(client, inbound) {
        Ok(a) => game.vote(client, a.target, out).into(),
        Err(reply) => reply,
    }
}

fn vent(game: &mut Game, client: ClientId, inbound: &Inbound, out: &mut Outbox) -> Reply {
    if !game.in_play(client) {
        return Status::NotInGame.into();
    }
    if game.impostor() != Some(client) {
        return Status::WrongRole.into();
    }
    let a = match args::<LocationArgs>(client, inbound) {
        Ok(a) => a,
        Err(reply) => return reply,
    };
    let Some(to) = resolve_room(game, a.room) else {
        return Status::Invalid.into();
    };

    let status = game.vent(client, to, out);
    if status.is_ok() {
        let info = game.room_info(client);
        out.send_to(client, info.into_packet(PacketType::RoomInfo));
    }
    status.into()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use airlock_game::{GameConfig, RoundState};
    use airlock_protocol::{Arguments, Packet, Recipient};
    use airlock_session::{SessionConfig, Stage};
    use airlock_world::GameMap;
    use serde_json::{json, Value};
    use tokio::sync::mpsc;

    use super::*;

    fn game() -> Game {
        let map = Arc::new(GameMap::skeld().unwrap());
        Game::with_seed(map, SessionConfig::default(), GameConfig::default(), 17).unwrap()
    }

    fn inbound(kind: PacketType, arguments: Value) -> Inbound {
        let arguments: Arguments = match arguments {
            Value::Object(map) => map,
            _ => Arguments::new(),
        };
        Inbound::new(kind, arguments)
    }

    fn connect(game: &mut Game) -> ClientId {
        let (tx, _rx) = mpsc::unbounded_channel();
        game.connect(tx).unwrap()
    }

    fn reply_of(out: &Outbox) -> &Packet {
        let (recipient, packet) = out.iter().next().unwrap();
        assert!(matches!(recipient, Recipient::Client(_)));
        packet
    }

    fn named(game: &mut Game, name: &str) -> ClientId {
        let id = connect(game);
        let out = dispatch(game, id, &inbound(PacketType::Name, json!({ "name": name })));
        assert_eq!(reply_of(&out).status, Status::Ok);
        id
    }

    #[test]
    fn test_handler_table_covers_inbound_types_only() {
        for kind in PacketType::ALL {
            let inbound_type = matches!(
                kind,
                PacketType::Name
                    | PacketType::Clients
                    | PacketType::Command
                    | PacketType::Chat
                    | PacketType::Location
                    | PacketType::RoomInfo
                    | PacketType::Task
                    | PacketType::Kill
                    | PacketType::Report
                    | PacketType::Meeting
                    | PacketType::Vote
                    | PacketType::Vent
            );
            assert_eq!(handler_for(kind).is_some(), inbound_type, "{kind:?}");
        }
    }

    #[test]
    fn test_dispatch_drops_everything_but_name_while_naming() {
        let mut game = game();
        let id = connect(&mut game);

        let out = dispatch(&mut game, id, &inbound(PacketType::Chat, json!({ "content": "hi" })));

        assert!(out.is_empty());
    }

    #[test]
    fn test_dispatch_drops_push_only_types() {
        let mut game = game();
        let id = named(&mut game, "Ann");
        let out = dispatch(&mut game, id, &inbound(PacketType::Presence, json!({})));
        assert!(out.is_empty());
    }

    #[test]
    fn test_dispatch_reply_comes_first_with_request_type() {
        let mut game = game();
        let id = connect(&mut game);

        let out = dispatch(&mut game, id, &inbound(PacketType::Name, json!({ "name": "Ann" })));

        let kinds: Vec<_> = out.iter().map(|(_, p)| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PacketType::Name,
                PacketType::ClientInfo,
                PacketType::TaskCatalog,
                PacketType::LocationGraph
            ]
        );
        assert_eq!(game.registry().find(id).unwrap().stage, Stage::Lobby);
    }

    #[test]
    fn test_set_name_with_non_string_is_invalid() {
        let mut game = game();
        let id = connect(&mut game);
        let out = dispatch(&mut game, id, &inbound(PacketType::Name, json!({ "name": 42 })));
        assert_eq!(reply_of(&out).status, Status::Invalid);
    }

    #[test]
    fn test_set_name_when_named_is_again() {
        let mut game = game();
        let id = named(&mut game, "Ann");
        let out = dispatch(&mut game, id, &inbound(PacketType::Name, json!({ "name": "Bob" })));
        assert_eq!(reply_of(&out).status, Status::Again);
    }

    #[test]
    fn test_unknown_command_is_invalid() {
        let mut game = game();
        let id = named(&mut game, "Ann");
        let out = dispatch(&mut game, id, &inbound(PacketType::Command, json!({ "name": "self_destruct" })));
        assert_eq!(reply_of(&out).status, Status::Invalid);
    }

    #[test]
    fn test_start_game_command_starts_round() {
        let mut game = game();
        let ann = named(&mut game, "Ann");
        let _bob = named(&mut game, "Bob");

        let out = dispatch(&mut game, ann, &inbound(PacketType::Command, json!({ "name": "start_game" })));

        assert_eq!(reply_of(&out).status, Status::Ok);
        assert_eq!(reply_of(&out).kind, PacketType::Command);
        assert!(game.state().is_running());
    }

    #[test]
    fn test_end_game_without_round_is_again() {
        let mut game = game();
        let ann = named(&mut game, "Ann");
        let out = dispatch(&mut game, ann, &inbound(PacketType::Command, json!({ "name": "end_game" })));
        assert_eq!(reply_of(&out).status, Status::Again);
    }

    #[test]
    fn test_location_in_lobby_is_not_in_game() {
        let mut game = game();
        let ann = named(&mut game, "Ann");
        let out = dispatch(&mut game, ann, &inbound(PacketType::Location, json!({ "room": 5 })));
        assert_eq!(reply_of(&out).status, Status::NotInGame);
    }

    #[test]
    fn test_location_by_name_moves_and_pushes_room_info() {
        let mut game = game();
        let ann = named(&mut game, "Ann");
        let _bob = named(&mut game, "Bob");
        dispatch(&mut game, ann, &inbound(PacketType::Command, json!({ "name": "start_game" })));

        let out = dispatch(&mut game, ann, &inbound(PacketType::Location, json!({ "room": "medbay" })));

        assert_eq!(reply_of(&out).status, Status::Ok);
        let info = out
            .iter()
            .find(|(r, p)| *r == Recipient::Client(ann) && p.kind == PacketType::RoomInfo)
            .map(|(_, p)| p)
            .unwrap();
        assert_eq!(info.arguments.as_ref().unwrap()["name"], "MedBay");
    }

    #[test]
    fn test_location_unknown_room_is_invalid() {
        let mut game = game();
        let ann = named(&mut game, "Ann");
        let _bob = named(&mut game, "Bob");
        dispatch(&mut game, ann, &inbound(PacketType::Command, json!({ "name": "start_game" })));

        for room in [json!(99), json!("Bridge"), json!(null)] {
            let out = dispatch(&mut game, ann, &inbound(PacketType::Location, json!({ "room": room })));
            assert_eq!(reply_of(&out).status, Status::Invalid);
        }
    }

    #[test]
    fn test_task_reply_echoes_task_id() {
        let mut game = game();
        let ann = named(&mut game, "Ann");
        let bob = named(&mut game, "Bob");
        dispatch(&mut game, ann, &inbound(PacketType::Command, json!({ "name": "start_game" })));
        let crew = if game.impostor() == Some(ann) { bob } else { ann };

        let out = dispatch(&mut game, crew, &inbound(PacketType::Task, json!({ "task": 25 })));

        let reply = reply_of(&out);
        assert_eq!(reply.arguments, Some(json!({ "task": 25 })));
    }

    #[test]
    fn test_task_by_impostor_is_wrong_role() {
        let mut game = game();
        let ann = named(&mut game, "Ann");
        let _bob = named(&mut game, "Bob");
        dispatch(&mut game, ann, &inbound(PacketType::Command, json!({ "name": "start_game" })));
        let impostor = game.impostor().unwrap();

        let out = dispatch(&mut game, impostor, &inbound(PacketType::Task, json!({ "task": 0 })));

        assert_eq!(reply_of(&out).status, Status::WrongRole);
    }

    #[test]
    fn test_kill_by_crewmate_is_wrong_role() {
        let mut game = game();
        let ann = named(&mut game, "Ann");
        let bob = named(&mut game, "Bob");
        dispatch(&mut game, ann, &inbound(PacketType::Command, json!({ "name": "start_game" })));
        let (crew, impostor) = if game.impostor() == Some(ann) { (bob, ann) } else { (ann, bob) };

        let out = dispatch(&mut game, crew, &inbound(PacketType::Kill, json!({ "target": impostor.0 })));

        assert_eq!(reply_of(&out).status, Status::WrongRole);
    }

    #[test]
    fn test_kill_success_replies_with_target() {
        let mut game = game();
        let ann = named(&mut game, "Ann");
        let bob = named(&mut game, "Bob");
        let _cid = named(&mut game, "Cid");
        dispatch(&mut game, ann, &inbound(PacketType::Command, json!({ "name": "start_game" })));
        let impostor = game.impostor().unwrap();
        let victim = if impostor == bob { ann } else { bob };

        let out = dispatch(&mut game, impostor, &inbound(PacketType::Kill, json!({ "target": victim.0 })));

        assert_eq!(reply_of(&out).arguments, Some(json!({ "target": victim.0 })));
        assert!(!game.registry().find(victim).unwrap().alive);
    }

    fn started(game: &mut Game, names: &[&str]) -> Vec<ClientId> {
        let ids: Vec<_> = names.iter().map(|n| named(game, n)).collect();
        dispatch(game, ids[0], &inbound(PacketType::Command, json!({ "name": "start_game" })));
        assert!(game.state().is_running());
        ids
    }

    #[test]
    fn test_meeting_then_votes_eject_over_dispatch() {
        let mut game = game();
        let ids = started(&mut game, &["Ann", "Bob", "Cid"]);
        let impostor = game.impostor().unwrap();
        let crew: Vec<_> = ids.iter().copied().filter(|id| *id != impostor).collect();

        let out = dispatch(&mut game, crew[0], &inbound(PacketType::Meeting, json!({})));
        assert_eq!(reply_of(&out).kind, PacketType::Meeting);
        assert_eq!(reply_of(&out).status, Status::Ok);
        assert!(out.iter().any(|(_, p)| p.kind == PacketType::Discussion));

        for voter in &crew {
            let out = dispatch(&mut game, *voter, &inbound(PacketType::Vote, json!({ "target": impostor.0 })));
            assert_eq!(reply_of(&out).status, Status::Ok);
        }
        let out = dispatch(&mut game, impostor, &inbound(PacketType::Vote, json!({ "target": null })));
        assert_eq!(reply_of(&out).status, Status::Ok);

        assert_eq!(game.state(), RoundState::Lobby);
    }

    #[test]
    fn test_vote_with_bad_target_shape_is_invalid() {
        let mut game = game();
        let ids = started(&mut game, &["Ann", "Bob", "Cid"]);
        let crew = ids.iter().copied().find(|id| Some(*id) != game.impostor()).unwrap();
        dispatch(&mut game, crew, &inbound(PacketType::Meeting, json!({})));

        let out = dispatch(&mut game, crew, &inbound(PacketType::Vote, json!({ "target": "Bob" })));

        assert_eq!(reply_of(&out).status, Status::Invalid);
    }

    #[test]
    fn test_report_without_body_is_wrong_location() {
        let mut game = game();
        let ids = started(&mut game, &["Ann", "Bob"]);
        let out = dispatch(&mut game, ids[0], &inbound(PacketType::Report, json!({})));
        assert_eq!(reply_of(&out).kind, PacketType::Report);
        assert_eq!(reply_of(&out).status, Status::WrongLocation);
    }

    #[test]
    fn test_vent_by_name_pushes_room_info() {
        let mut game = game();
        started(&mut game, &["Ann", "Bob"]);
        let impostor = game.impostor().unwrap();

        let out = dispatch(&mut game, impostor, &inbound(PacketType::Vent, json!({ "room": "admin" })));

        assert_eq!(reply_of(&out).status, Status::Ok);
        let info = out
            .iter()
            .find(|(r, p)| *r == Recipient::Client(impostor) && p.kind == PacketType::RoomInfo)
            .map(|(_, p)| p)
            .unwrap();
        assert_eq!(info.arguments.as_ref().unwrap()["name"], "Admin");
    }

    #[test]
    fn test_vent_by_crewmate_is_wrong_role() {
        let mut game = game();
        let ids = started(&mut game, &["Ann", "Bob"]);
        let crew = ids.iter().copied().find(|id| Some(*id) != game.impostor()).unwrap();

        let out = dispatch(&mut game, crew, &inbound(PacketType::Vent, json!({ "room": "Admin" })));

        assert_eq!(reply_of(&out).status, Status::WrongRole);
    }
}
