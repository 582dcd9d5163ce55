//! Builders for server-pushed packets.
//!
//! Every push carries status `Ok`. The argument shapes here are what
//! clients parse, so they are pinned by the tests at the bottom.

use airlock_protocol::{
    ClientEvent, ClientId, DiscussionReason, DiscussionResult, GameStatus,
    Packet, PacketType, PresenceEvent, Status, PROTOCOL_VERSION,
};
use airlock_session::Session;
use airlock_world::{GameMap, Room};
use serde_json::{json, Value};

fn push(kind: PacketType, arguments: Value) -> Packet {
    Packet::new(kind, Status::Ok).with_arguments(arguments)
}

/// Greeting sent as soon as a connection is registered.
pub fn info(id: ClientId) -> Packet {
    push(PacketType::Info, json!({ "id": id, "version": PROTOCOL_VERSION }))
}

pub fn game_status(status: GameStatus) -> Packet {
    push(PacketType::GameStatus, json!({ "status": status }))
}

/// A client joined or left the server.
pub fn client_info(session: &Session, event: ClientEvent) -> Packet {
    push(
        PacketType::ClientInfo,
        json!({ "id": session.id, "name": session.display_name(), "event": event }),
    )
}

/// A player walked into or out of the recipient's room.
pub fn presence(session: &Session, event: PresenceEvent) -> Packet {
    push(
        PacketType::Presence,
        json!({
            "id": session.id,
            "name": session.display_name(),
            "alive": session.alive,
            "event": event,
        }),
    )
}

/// The recipient's own stage, role and liveness.
pub fn state(session: &Session) -> Packet {
    push(
        PacketType::State,
        json!({
            "stage": session.stage,
            "role": session.role,
            "alive": session.alive,
        }),
    )
}

/// The recipient's task ledger.
pub fn tasks(session: &Session, map: &GameMap) -> Packet {
    let ledger: Vec<Value> = session
        .ledger
        .iter()
        .filter_map(|slot| {
            let task = map.task(slot.task)?;
            Some(json!({
                "id": task.id,
                "description": task.description,
                "room": task.room,
                "done": slot.done,
            }))
        })
        .collect();
    push(PacketType::Tasks, Value::Array(ledger))
}

/// Arguments of a room info reply or push: the room, its doors and who
/// else is in it.
pub fn room_info_arguments<'a>(
    room: &Room,
    map: &GameMap,
    occupants: impl Iterator<Item = &'a Session>,
) -> Value {
    let doors: Vec<Value> = room
        .doors
        .iter()
        .filter_map(|door| map.room(*door))
        .map(|door| json!({ "id": door.id, "name": door.name }))
        .collect();
    let occupants: Vec<Value> = occupants
        .map(|s| json!({ "id": s.id, "name": s.display_name(), "alive": s.alive }))
        .collect();
    json!({
        "id": room.id,
        "name": room.name,
        "doors": doors,
        "occupants": occupants,
    })
}

/// A discussion was opened. `body` is set when it was a report.
pub fn discussion_start(
    reason: DiscussionReason,
    caller: ClientId,
    body: Option<ClientId>,
) -> Packet {
    let mut arguments = json!({ "event": "start", "reason": reason, "caller": caller });
    if let Some(body) = body {
        arguments["body"] = json!(body);
    }
    push(PacketType::Discussion, arguments)
}

/// A discussion was settled. An ejected player's role is revealed.
pub fn discussion_result(result: DiscussionResult, ejected: Option<&Session>) -> Packet {
    let mut arguments = json!({ "event": "result", "result": result });
    if let Some(session) = ejected {
        arguments["id"] = json!(session.id);
        arguments["name"] = json!(session.display_name());
        arguments["role"] = json!(session.role);
    }
    push(PacketType::Discussion, arguments)
}

/// The running vote count: skips, then `{id, name, votes}` per candidate.
pub fn votes(skips: usize, candidates: Vec<Value>) -> Packet {
    push(PacketType::Votes, json!({ "skips": skips, "votes": candidates }))
}

/// The whole task catalog, pushed once after naming.
pub fn task_catalog(map: &GameMap) -> Packet {
    push(PacketType::TaskCatalog, json!(map.tasks()))
}

/// The whole location graph, pushed once after naming.
pub fn location_graph(map: &GameMap) -> Packet {
    push(
        PacketType::LocationGraph,
        json!({
            "name": map.name(),
            "spawn": map.spawn(),
            "rooms": map.rooms(),
        }),
    )
}
