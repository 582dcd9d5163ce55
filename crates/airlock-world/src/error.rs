//! Error types for map loading.

/// Errors raised while loading or validating a map.
///
/// Every variant is fatal at startup: the server refuses to run on a map
/// it can't trust.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("failed to read map file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse map file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("map has no rooms")]
    NoRooms,

    #[error("room `{0}` is declared more than once")]
    DuplicateRoom(String),

    #[error("room `{room}` has a door to undeclared room `{door}`")]
    UnknownDoor { room: String, door: String },

    #[error("room `{room}` lists the door to `{door}` more than once")]
    DuplicateDoor { room: String, door: String },

    #[error("room `{0}` has a door to itself")]
    SelfDoor(String),

    #[error("door from `{from}` to `{to}` has no way back")]
    AsymmetricDoor { from: String, to: String },

    #[error("room `{room}` has a vent to undeclared room `{vent}`")]
    UnknownVent { room: String, vent: String },

    #[error("room `{room}` lists the vent to `{vent}` more than once")]
    DuplicateVent { room: String, vent: String },

    #[error("room `{0}` has a vent to itself")]
    SelfVent(String),

    #[error("vent from `{from}` to `{to}` has no way back")]
    AsymmetricVent { from: String, to: String },

    #[error("room `{0}` can't be reached from the spawn room")]
    Unreachable(String),

    #[error("spawn room `{0}` is not declared")]
    UnknownSpawn(String),

    #[error("task `{task}` is bound to undeclared room `{room}`")]
    UnknownTaskRoom { task: String, room: String },

    #[error("no built-in map named `{0}`")]
    UnknownMap(String),
}
