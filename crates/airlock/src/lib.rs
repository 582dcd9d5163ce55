//! # Airlock
//!
//! A multiplayer text-adventure server modeled on a social-deduction game.
//!
//! Players connect over TCP and speak newline-delimited JSON. They pick a
//! name, wait in a lobby, then play a round in which one hidden player is
//! the impostor and the rest are crewmates racing to finish their tasks.
//!
//! This crate ties the layers together: transport → protocol → dispatcher
//! → game. The rules themselves live in `airlock-game`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use airlock::prelude::*;
//!
//! # async fn run() -> Result<(), AirlockError> {
//! let server = AirlockServer::builder()
//!     .bind("0.0.0.0:1234")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod dispatch;
mod error;
mod handler;
mod server;

pub use dispatch::dispatch;
pub use error::AirlockError;
pub use server::{AirlockServer, AirlockServerBuilder, DEFAULT_PORT};

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use crate::{AirlockError, AirlockServer, AirlockServerBuilder};
    pub use airlock_game::{Game, GameConfig, RoundState};
    pub use airlock_protocol::{
        ClientId, Codec, JsonCodec, Packet, PacketType, Status,
    };
    pub use airlock_session::SessionConfig;
    pub use airlock_world::{GameMap, MapDefinition, WorldError};
}
