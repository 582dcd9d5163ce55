//! The static world of an airlock round: rooms, doors and tasks.
//!
//! A map is described by a [`MapDefinition`] (one of the built-in "skeld"
//! and "mirahq" layouts, or a JSON file) and turned into an immutable [`GameMap`] exactly once at
//! startup. Building the map checks that every name it references exists
//! that every door and vent works in both directions, and that every room
//! can be walked to from the spawn, so nothing downstream has to handle a
//! dangling `RoomId` or `TaskId`.
//!
//! ```text
//! MapDefinition (names) ──validate──→ GameMap (ids)
//! ```

mod definition;
mod error;
mod map;

pub use definition::{MapDefinition, RoomDefinition, TaskDefinition, BUILTIN_MAPS};
pub use error::WorldError;
pub use map::{GameMap, Room, Task};
