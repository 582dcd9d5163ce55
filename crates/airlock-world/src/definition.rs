//! Map definitions: the name-based, serializable form of a map.
//!
//! A definition refers to rooms by name so that a map file can be written
//! by hand:
//!
//! ```json
//! {
//!   "name": "tiny",
//!   "spawn": "Hall",
//!   "rooms": [
//!     { "name": "Hall", "doors": ["Lab"], "vents": ["Lab"] },
//!     { "name": "Lab",  "doors": ["Hall"], "vents": ["Hall"] }
//!   ],
//!   "tasks": [
//!     { "description": "Calibrate the centrifuge", "room": "Lab" }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::WorldError;

/// A map as written in a file, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDefinition {
    pub name: String,

    /// Name of the room every player starts a round in.
    pub spawn: String,

    /// Rooms in id order: the first room gets `RoomId(0)`.
    pub rooms: Vec<RoomDefinition>,

    /// Tasks in id order: the first task gets `TaskId(0)`.
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDefinition {
    pub name: String,

    /// Names of adjacent rooms, in display order.
    #[serde(default)]
    pub doors: Vec<String>,

    /// Names of rooms the impostor can vent to from here.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub description: String,

    /// Name of the room the task must be performed in.
    pub room: String,
}

/// `(room, doors, vents)`
type RoomTable = &'static [(&'static str, &'static [&'static str], &'static [&'static str])];

/// `(description, rooms)`: one catalog entry per room.
type TaskTable = &'static [(&'static str, &'static [&'static str])];

const SKELD_ROOMS: RoomTable = &[
    (
        "Cafeteria",
        &["Admin", "MedBay", "Weapons", "Upper Engine", "Lower Engine"],
        &["Admin"],
    ),
    ("Admin", &["Cafeteria", "Storage"], &["Cafeteria"]),
    ("Navigation", &["O2", "Weapons", "Shields"], &["Weapons", "Shields"]),
    (
        "Security",
        &["Reactor", "Upper Engine", "Lower Engine"],
        &["MedBay", "Electrical"],
    ),
    ("Electrical", &["Lower Engine", "Storage"], &["Security", "MedBay"]),
    (
        "Storage",
        &["Admin", "Electrical", "Communications", "Shields"],
        &[],
    ),
    ("Weapons", &["Cafeteria", "O2", "Navigation"], &["Navigation"]),
    ("O2", &["Navigation", "Weapons"], &[]),
    (
        "Reactor",
        &["Security", "Upper Engine", "Lower Engine"],
        &["Upper Engine", "Lower Engine"],
    ),
    ("MedBay", &["Cafeteria", "Upper Engine"], &["Security", "Electrical"]),
    (
        "Upper Engine",
        &["Cafeteria", "MedBay", "Reactor", "Security"],
        &["Reactor"],
    ),
    (
        "Lower Engine",
        &["Cafeteria", "Electrical", "Reactor", "Security"],
        &["Reactor"],
    ),
    ("Communications", &["Storage", "Shields"], &[]),
    ("Shields", &["Storage", "Communications", "Navigation"], &["Navigation"]),
];

const SKELD_TASKS: TaskTable = &[
    (
        "Wiring",
        &["Cafeteria", "Admin", "Navigation", "Security", "Electrical", "Storage"],
    ),
    ("Swipe card", &["Admin"]),
    (
        "Download data",
        &["Cafeteria", "Weapons", "Navigation", "Admin", "Communications", "Electrical"],
    ),
    ("Upload data", &["Admin"]),
    ("Fix wiring", &["Electrical", "Security", "Navigation", "Admin"]),
    ("Empty garbage", &["Cafeteria", "Storage"]),
    ("Fuel engines", &["Storage", "Upper Engine", "Lower Engine"]),
    ("Align engine output", &["Upper Engine", "Lower Engine"]),
    (
        "Accept diverted power",
        &["Electrical", "Weapons", "Shields", "O2", "Navigation", "Communications"],
    ),
    ("Inspect sample", &["MedBay"]),
    ("Start reactor", &["Reactor"]),
    ("Calibrate distributor", &["Electrical"]),
    ("Clear asteroids", &["Weapons"]),
    ("Divert power", &["Electrical"]),
    ("Clean O2 filter", &["O2"]),
    ("Stabilize steering", &["Navigation"]),
    ("Unlock manifolds", &["Reactor"]),
    ("Prime shields", &["Shields"]),
    ("Submit scan", &["MedBay"]),
    ("Empty chute", &["O2", "Storage"]),
];

const MIRAHQ_ROOMS: RoomTable = &[
    ("Cafeteria", &["Greenhouse", "MedBay", "Admin"], &[]),
    ("Admin", &["Cafeteria", "Greenhouse", "Office"], &[]),
    ("Greenhouse", &["Cafeteria", "Admin"], &["Office"]),
    ("Reactor", &["Laboratory"], &["Launchpad"]),
    ("Office", &["Admin", "Communications"], &["Laboratory", "Greenhouse"]),
    ("Launchpad", &["MedBay", "Laboratory"], &["Reactor"]),
    ("MedBay", &["Launchpad", "Cafeteria"], &["Communications"]),
    ("Communications", &["Office"], &["MedBay"]),
    ("Laboratory", &["Reactor", "Launchpad"], &["Office"]),
];

const MIRAHQ_TASKS: TaskTable = &[
    ("Wiring", &["Cafeteria", "Admin"]),
    ("Fix wiring", &["Greenhouse"]),
    ("Assemble artifact", &["Reactor"]),
    ("Buy beverage", &["Cafeteria"]),
    ("Clean O2 filter", &["Greenhouse"]),
    ("Divert power", &["Reactor", "Office"]),
    ("Empty garbage", &["Cafeteria"]),
    ("Enter ID code", &["Admin"]),
    ("Fuel engines", &["Launchpad"]),
    ("Measure weather", &["Office"]),
    ("Process data", &["Communications"]),
    ("Run diagnostics", &["Launchpad"]),
    ("Sort samples", &["Reactor"]),
    ("Start reactor", &["Reactor"]),
    ("Submit scan", &["MedBay"]),
    ("Water plants", &["Greenhouse"]),
];

/// Names accepted by [`MapDefinition::builtin`].
pub const BUILTIN_MAPS: &[&str] = &["skeld", "mirahq"];

impl MapDefinition {
    /// The built-in "skeld" map: fourteen rooms, forty-three tasks, spawn
    /// in the Cafeteria.
    pub fn skeld() -> Self {
        Self::from_tables("skeld", "Cafeteria", SKELD_ROOMS, SKELD_TASKS)
    }

    /// The built-in "mirahq" map: nine rooms, eighteen tasks, spawn on the
    /// Launchpad.
    pub fn mirahq() -> Self {
        Self::from_tables("mirahq", "Launchpad", MIRAHQ_ROOMS, MIRAHQ_TASKS)
    }

    /// Looks up a built-in map by name, ignoring case.
    pub fn builtin(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "skeld" => Some(Self::skeld()),
            "mirahq" | "mira" => Some(Self::mirahq()),
            _ => None,
        }
    }

    fn from_tables(name: &str, spawn: &str, rooms: RoomTable, tasks: TaskTable) -> Self {
        let names =
            |list: &[&str]| -> Vec<String> { list.iter().map(|n| n.to_string()).collect() };
        Self {
            name: name.to_string(),
            spawn: spawn.to_string(),
            rooms: rooms
                .iter()
                .map(|&(name, doors, vents)| RoomDefinition {
                    name: name.to_string(),
                    doors: names(doors),
                    vents: names(vents),
                })
                .collect(),
            tasks: tasks
                .iter()
                .flat_map(|&(description, rooms)| {
                    rooms.iter().map(move |room| TaskDefinition {
                        description: description.to_string(),
                        room: room.to_string(),
                    })
                })
                .collect(),
        }
    }

    /// Parses a definition from JSON text.
    ///
    /// # Errors
    /// Returns [`WorldError::Parse`] if the JSON doesn't describe a map.
    pub fn from_json(data: &[u8]) -> Result<Self, WorldError> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Reads and parses a JSON map file.
    ///
    /// # Errors
    /// Returns [`WorldError::Io`] if the file can't be read, or
    /// [`WorldError::Parse`] if it isn't a valid map definition.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, WorldError> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_json(&data)
    }
}
