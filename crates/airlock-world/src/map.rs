//! The validated, id-based map used during play.

use std::collections::HashMap;

use airlock_protocol::{RoomId, TaskId};
use serde::Serialize;

use crate::{MapDefinition, WorldError};

/// A room of the location graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,

    /// Adjacent rooms, in the order the definition listed them.
    pub doors: Vec<RoomId>,

    /// Rooms reachable through a vent.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vents: Vec<RoomId>,
}

/// An entry of the task catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,

    /// The only room the task can be performed in.
    pub room: RoomId,
}

/// An immutable, validated map.
///
/// Built once at startup and shared read-only (behind an `Arc`) for the
/// server's whole lifetime. Every `RoomId` and `TaskId` handed out by a
/// `GameMap` is an index into its own tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameMap {
    name: String,
    rooms: Vec<Room>,
    tasks: Vec<Task>,
    spawn: RoomId,
}

impl GameMap {
    /// The built-in "skeld" map.
    ///
    /// # Errors
    /// Fails only if the built-in tables are inconsistent.
    pub fn skeld() -> Result<Self, WorldError> {
        Self::from_definition(&MapDefinition::skeld())
    }

    /// The built-in "mirahq" map.
    ///
    /// # Errors
    /// Fails only if the built-in tables are inconsistent.
    pub fn mirahq() -> Result<Self, WorldError> {
        Self::from_definition(&MapDefinition::mirahq())
    }

    /// Builds a built-in map by name.
    ///
    /// # Errors
    /// Returns [`WorldError::UnknownMap`] if no built-in map has that name.
    pub fn builtin(name: &str) -> Result<Self, WorldError> {
        let def = MapDefinition::builtin(name)
            .ok_or_else(|| WorldError::UnknownMap(name.to_string()))?;
        Self::from_definition(&def)
    }

    /// Validates a definition and resolves its names into ids.
    ///
    /// # Errors
    /// - [`WorldError::NoRooms`] — the definition is empty
    /// - [`WorldError::DuplicateRoom`] — two rooms share a name (ignoring case)
    /// - [`WorldError::UnknownDoor`], [`WorldError::DuplicateDoor`],
    ///   [`WorldError::SelfDoor`], [`WorldError::AsymmetricDoor`] — a bad door
    /// - the matching `*Vent` variants for a bad vent
    /// - [`WorldError::UnknownSpawn`] — the spawn room isn't declared
    /// - [`WorldError::Unreachable`] — no path of doors leads from the spawn
    /// - [`WorldError::UnknownTaskRoom`] — a task names an undeclared room
    pub fn from_definition(def: &MapDefinition) -> Result<Self, WorldError> {
        if def.rooms.is_empty() {
            return Err(WorldError::NoRooms);
        }

        // Pass 1: assign ids, keyed by lowercase name.
        let mut ids: HashMap<String, RoomId> = HashMap::new();
        for (index, room) in def.rooms.iter().enumerate() {
            let id = RoomId(index as u32);
            if ids.insert(room.name.to_lowercase(), id).is_some() {
                return Err(WorldError::DuplicateRoom(room.name.clone()));
            }
        }
        let lookup = |name: &str| ids.get(&name.to_lowercase()).copied();

        // Pass 2: resolve doors and vents.
        let mut rooms = Vec::with_capacity(def.rooms.len());
        for (index, room) in def.rooms.iter().enumerate() {
            let id = RoomId(index as u32);
            let doors = resolve_links(id, &room.doors, &lookup).map_err(|e| match e {
                LinkError::Unknown(door) => WorldError::UnknownDoor {
                    room: room.name.clone(),
                    door,
                },
                LinkError::ToSelf => WorldError::SelfDoor(room.name.clone()),
                LinkError::Repeated(door) => WorldError::DuplicateDoor {
                    room: room.name.clone(),
                    door,
                },
            })?;
            let vents = resolve_links(id, &room.vents, &lookup).map_err(|e| match e {
                LinkError::Unknown(vent) => WorldError::UnknownVent {
                    room: room.name.clone(),
                    vent,
                },
                LinkError::ToSelf => WorldError::SelfVent(room.name.clone()),
                LinkError::Repeated(vent) => WorldError::DuplicateVent {
                    room: room.name.clone(),
                    vent,
                },
            })?;

            rooms.push(Room {
                id,
                name: room.name.clone(),
                doors,
                vents,
            });
        }

        // Pass 3: every door and vent needs a way back.
        for room in &rooms {
            for door in &room.doors {
                let other = &rooms[door.0 as usize];
                if !other.doors.contains(&room.id) {
                    return Err(WorldError::AsymmetricDoor {
                        from: room.name.clone(),
                        to: other.name.clone(),
                    });
                }
            }
            for vent in &room.vents {
                let other = &rooms[vent.0 as usize];
                if !other.vents.contains(&room.id) {
                    return Err(WorldError::AsymmetricVent {
                        from: room.name.clone(),
                        to: other.name.clone(),
                    });
                }
            }
        }

        let spawn = lookup(&def.spawn)
            .ok_or_else(|| WorldError::UnknownSpawn(def.spawn.clone()))?;

        // Pass 4: every room is reachable on foot from the spawn.
        let mut seen = vec![false; rooms.len()];
        let mut stack = vec![spawn];
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.0 as usize], true) {
                continue;
            }
            stack.extend(rooms[id.0 as usize].doors.iter().copied());
        }
        if let Some(index) = seen.iter().position(|&reached| !reached) {
            return Err(WorldError::Unreachable(rooms[index].name.clone()));
        }

        let tasks = def
            .tasks
            .iter()
            .enumerate()
            .map(|(index, task)| {
                let room = lookup(&task.room).ok_or_else(|| {
                    WorldError::UnknownTaskRoom {
                        task: task.description.clone(),
                        room: task.room.clone(),
                    }
                })?;
                Ok(Task {
                    id: TaskId(index as u32),
                    description: task.description.clone(),
                    room,
                })
            })
            .collect::<Result<Vec<_>, WorldError>>()?;

        tracing::debug!(
            map = %def.name,
            rooms = rooms.len(),
            tasks = tasks.len(),
            "map validated"
        );

        Ok(Self {
            name: def.name.clone(),
            rooms,
            tasks,
            spawn,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id.0 as usize)
    }

    /// Looks a room up by name, ignoring case the same way room names are
    /// kept unique.
    pub fn room_by_name(&self, name: &str) -> Option<&Room> {
        let key = name.to_lowercase();
        self.rooms.iter().find(|room| room.name.to_lowercase() == key)
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// The room every player starts a round in.
    pub fn spawn(&self) -> RoomId {
        self.spawn
    }

    /// Returns `true` if a player in `from` may walk into `to`.
    ///
    /// `from == None` is the initial placement, which may go anywhere.
    pub fn can_move(&self, from: Option<RoomId>, to: RoomId) -> bool {
        if self.room(to).is_none() {
            return false;
        }
        match from {
            None => true,
            Some(from) => self
                .room(from)
                .is_some_and(|room| room.doors.contains(&to)),
        }
    }

    /// Returns `true` if a vent links `from` to `to`.
    pub fn can_vent(&self, from: RoomId, to: RoomId) -> bool {
        self.room(from).is_some_and(|room| room.vents.contains(&to))
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id.0 as usize)
    }

    /// The whole task catalog, in id order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }
}

enum LinkError {
    Unknown(String),
    ToSelf,
    Repeated(String),
}

/// Resolves one room's door or vent names into ids.
fn resolve_links(
    id: RoomId,
    names: &[String],
    lookup: &impl Fn(&str) -> Option<RoomId>,
) -> Result<Vec<RoomId>, LinkError> {
    let mut links = Vec::with_capacity(names.len());
    for name in names {
        let target = lookup(name).ok_or_else(|| LinkError::Unknown(name.clone()))?;
        if target == id {
            return Err(LinkError::ToSelf);
        }
        if links.contains(&target) {
            return Err(LinkError::Repeated(name.clone()));
        }
        links.push(target);
    }
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RoomDefinition, TaskDefinition};

    fn room(name: &str, doors: &[&str]) -> RoomDefinition {
        RoomDefinition {
            name: name.to_string(),
            doors: doors.iter().map(|d| d.to_string()).collect(),
            vents: Vec::new(),
        }
    }

    fn vented(name: &str, doors: &[&str], vents: &[&str]) -> RoomDefinition {
        RoomDefinition {
            vents: vents.iter().map(|v| v.to_string()).collect(),
            ..room(name, doors)
        }
    }

    fn def(rooms: Vec<RoomDefinition>) -> MapDefinition {
        MapDefinition {
            name: "test".to_string(),
            spawn: "A".to_string(),
            rooms,
            tasks: Vec::new(),
        }
    }

    #[test]
    fn test_from_definition_resolves_ids_in_order() {
        let map = GameMap::from_definition(&def(vec![
            room("A", &["B"]),
            room("B", &["A"]),
        ]))
        .unwrap();

        assert_eq!(map.room(RoomId(1)).unwrap().name, "B");
        assert_eq!(map.room(RoomId(0)).unwrap().doors, vec![RoomId(1)]);
        assert_eq!(map.spawn(), RoomId(0));
    }

    #[test]
    fn test_from_definition_empty_is_error() {
        let result = GameMap::from_definition(&def(Vec::new()));
        assert!(matches!(result, Err(WorldError::NoRooms)));
    }

    #[test]
    fn test_from_definition_duplicate_room_ignores_case() {
        let result =
            GameMap::from_definition(&def(vec![room("A", &[]), room("a", &[])]));
        assert!(matches!(result, Err(WorldError::DuplicateRoom(name)) if name == "a"));
    }

    #[test]
    fn test_from_definition_unknown_door_is_error() {
        let result = GameMap::from_definition(&def(vec![room("A", &["Nowhere"])]));
        assert!(matches!(result, Err(WorldError::UnknownDoor { .. })));
    }

    #[test]
    fn test_from_definition_self_door_is_error() {
        let result = GameMap::from_definition(&def(vec![room("A", &["A"])]));
        assert!(matches!(result, Err(WorldError::SelfDoor(_))));
    }

    #[test]
    fn test_from_definition_duplicate_door_is_error() {
        let result = GameMap::from_definition(&def(vec![
            room("A", &["B", "b"]),
            room("B", &["A"]),
        ]));
        assert!(matches!(result, Err(WorldError::DuplicateDoor { .. })));
    }

    #[test]
    fn test_from_definition_one_way_door_is_error() {
        let result =
            GameMap::from_definition(&def(vec![room("A", &["B"]), room("B", &[])]));
        assert!(matches!(
            result,
            Err(WorldError::AsymmetricDoor { from, to }) if from == "A" && to == "B"
        ));
    }

    #[test]
    fn test_from_definition_unknown_spawn_is_error() {
        let mut d = def(vec![room("A", &[])]);
        d.spawn = "Z".to_string();
        assert!(matches!(
            GameMap::from_definition(&d),
            Err(WorldError::UnknownSpawn(_))
        ));
    }

    #[test]
    fn test_from_definition_task_in_unknown_room_is_error() {
        let mut d = def(vec![room("A", &[])]);
        d.tasks.push(TaskDefinition {
            description: "Sweep".to_string(),
            room: "Z".to_string(),
        });
        assert!(matches!(
            GameMap::from_definition(&d),
            Err(WorldError::UnknownTaskRoom { .. })
        ));
    }

    #[test]
    fn test_can_move_only_through_doors() {
        let map = GameMap::from_definition(&def(vec![
            room("A", &["B"]),
            room("B", &["A", "C"]),
            room("C", &["B"]),
        ]))
        .unwrap();

        assert!(map.can_move(Some(RoomId(0)), RoomId(1)));
        assert!(!map.can_move(Some(RoomId(0)), RoomId(2)));
        assert!(!map.can_move(Some(RoomId(0)), RoomId(0)));
    }

    #[test]
    fn test_can_move_from_nowhere_goes_anywhere_known() {
        let map = GameMap::from_definition(&def(vec![room("A", &[])])).unwrap();
        assert!(map.can_move(None, RoomId(0)));
        assert!(!map.can_move(None, RoomId(9)));
    }

    #[test]
    fn test_room_serializes_ids_as_numbers() {
        let map = GameMap::from_definition(&def(vec![
            room("A", &["B"]),
            room("B", &["A"]),
        ]))
        .unwrap();
        let json = serde_json::to_value(map.room(RoomId(0)).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"id": 0, "name": "A", "doors": [1]}));
    }

    #[test]
    fn test_from_definition_unreachable_room_is_error() {
        let result = GameMap::from_definition(&def(vec![
            room("A", &["B"]),
            room("B", &["A"]),
            room("C", &[]),
        ]));
        assert!(matches!(result, Err(WorldError::Unreachable(name)) if name == "C"));
    }

    #[test]
    fn test_from_definition_vent_alone_does_not_make_room_reachable() {
        let result = GameMap::from_definition(&def(vec![
            vented("A", &[], &["B"]),
            vented("B", &[], &["A"]),
        ]));
        assert!(matches!(result, Err(WorldError::Unreachable(_))));
    }

    #[test]
    fn test_from_definition_resolves_vents() {
        let map = GameMap::from_definition(&def(vec![
            vented("A", &["B"], &["C"]),
            room("B", &["A", "C"]),
            vented("C", &["B"], &["A"]),
        ]))
        .unwrap();

        assert!(map.can_vent(RoomId(0), RoomId(2)));
        assert!(map.can_vent(RoomId(2), RoomId(0)));
        assert!(!map.can_vent(RoomId(0), RoomId(1)));
        assert!(!map.can_vent(RoomId(0), RoomId(9)));
    }

    #[test]
    fn test_from_definition_one_way_vent_is_error() {
        let result = GameMap::from_definition(&def(vec![
            vented("A", &["B"], &["B"]),
            room("B", &["A"]),
        ]));
        assert!(matches!(
            result,
            Err(WorldError::AsymmetricVent { from, to }) if from == "A" && to == "B"
        ));
    }

    #[test]
    fn test_from_definition_bad_vents_are_errors() {
        let unknown = GameMap::from_definition(&def(vec![vented("A", &[], &["Z"])]));
        assert!(matches!(unknown, Err(WorldError::UnknownVent { .. })));

        let to_self = GameMap::from_definition(&def(vec![vented("A", &[], &["a"])]));
        assert!(matches!(to_self, Err(WorldError::SelfVent(_))));

        let repeated = GameMap::from_definition(&def(vec![
            vented("A", &["B"], &["B", "B"]),
            vented("B", &["A"], &["A"]),
        ]));
        assert!(matches!(repeated, Err(WorldError::DuplicateVent { .. })));
    }

    #[test]
    fn test_room_by_name_folds_case_like_uniqueness_check() {
        let map = GameMap::from_definition(&MapDefinition {
            spawn: "Äther".to_string(),
            ..def(vec![room("Äther", &["Öl"]), room("Öl", &["Äther"])])
        })
        .unwrap();

        assert_eq!(map.room_by_name("äTHER").unwrap().id, RoomId(0));
        assert_eq!(map.room_by_name("öl").unwrap().id, RoomId(1));

        let clash = GameMap::from_definition(&MapDefinition {
            spawn: "Äther".to_string(),
            ..def(vec![room("Äther", &[]), room("äther", &[])])
        });
        assert!(matches!(clash, Err(WorldError::DuplicateRoom(_))));
    }

    #[test]
    fn test_builtin_unknown_name_is_error() {
        assert!(matches!(
            GameMap::builtin("polus"),
            Err(WorldError::UnknownMap(name)) if name == "polus"
        ));
        assert_eq!(GameMap::builtin("Skeld").unwrap(), GameMap::skeld().unwrap());
    }
}
