//! Game rules for airlock.
//!
//! Everything a round needs lives in one [`Game`] context: the client
//! registry, the round state, the map, the tuning knobs and the random
//! source. The server wraps it in a single mutex; every operation here
//! runs to completion under that lock and never touches a socket.
//!
//! # Key types
//!
//! - [`Game`] — the context object; operations are methods on it
//! - [`Outbox`] — packets an operation wants sent, with their recipients
//! - [`Reply`] — the direct answer to the client that asked
//! - [`RoundState`] — lobby → main (⇄ discussion) → resolution
//! - [`GameConfig`] — task amount, player minimums, cooldowns, limits
//!
//! Operations report semantic failures as [`Status`](airlock_protocol::Status)
//! codes in their reply; only configuration problems are errors.

mod config;
mod discussion;
mod error;
mod game;
mod kill;
mod lobby;
mod movement;
mod outbox;
pub mod packets;
mod round;
mod tasks;

pub use config::{GameConfig, RoundState};
pub use error::GameError;
pub use game::Game;
pub use outbox::{Outbox, Reply};
