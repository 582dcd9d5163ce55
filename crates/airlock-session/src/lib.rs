//! Client session management for airlock.
//!
//! This crate handles the lifecycle of player connections:
//!
//! 1. **Registration** — a fixed number of slots, one per connection
//!    ([`ClientRegistry`])
//! 2. **Session state** — stage, role, room and task ledger ([`Session`])
//! 3. **Naming** — validating display names ([`validate_name`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Game Layer (above)  ← reads and mutates sessions during a round
//!     ↕
//! Session Layer (this crate)  ← owns who's connected and what stage they're in
//!     ↕
//! Protocol Layer (below)  ← provides ClientId, RoomId, Packet
//! ```

mod error;
mod name;
mod registry;
mod session;

pub use error::SessionError;
pub use name::{is_printable, validate_name, NameError};
pub use registry::ClientRegistry;
pub use session::{PacketSender, Role, Session, SessionConfig, Stage, TaskSlot};
