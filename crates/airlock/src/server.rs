//! `AirlockServer` builder and server loop.
//!
//! This is the entry point for running an Airlock server. It ties the
//! layers together: transport → protocol → dispatcher → game.

use std::sync::Arc;

use airlock_game::{Game, GameConfig};
use airlock_protocol::{Codec, JsonCodec};
use airlock_session::SessionConfig;
use airlock_transport::{TcpLineTransport, Transport};
use airlock_world::{GameMap, MapDefinition};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::AirlockError;

/// The port the server listens on when none is given.
pub const DEFAULT_PORT: u16 = 1234;

/// Shared server state passed to each connection handler task.
///
/// The one `Game` sits behind one lock. Handlers hold it only while the
/// game runs an operation and the outcome is queued; socket writes
/// happen later, on each connection's writer task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) game: Mutex<Game>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting an Airlock server.
///
/// # Example
///
/// ```rust,ignore
/// use airlock::prelude::*;
///
/// let server = AirlockServer::builder()
///     .bind("0.0.0.0:1234")
///     .game_config(GameConfig { task_amount: 5, ..GameConfig::default() })
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct AirlockServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
    game_config: GameConfig,
    map: Option<MapDefinition>,
    seed: Option<u64>,
}

impl AirlockServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: format!("127.0.0.1:{DEFAULT_PORT}"),
            session_config: SessionConfig::default(),
            game_config: GameConfig::default(),
            map: None,
            seed: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets capacity and name-length limits.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets the round rules.
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    /// Plays on this map instead of the built-in one.
    pub fn map(mut self, map: MapDefinition) -> Self {
        self.map = Some(map);
        self
    }

    /// Fixes the random seed (impostor picks, task draws).
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the map and rules, then binds the listener.
    ///
    /// # Errors
    /// - [`AirlockError::World`] if the map is malformed
    /// - [`AirlockError::Game`] if the rules don't fit the map
    /// - [`AirlockError::Transport`] if the address can't be bound
    pub async fn build(self) -> Result<AirlockServer, AirlockError> {
        let map = match &self.map {
            Some(definition) => GameMap::from_definition(definition)?,
            None => GameMap::skeld()?,
        };
        let map = Arc::new(map);
        tracing::info!(
            map = map.name(),
            rooms = map.rooms().len(),
            tasks = map.tasks().len(),
            "map loaded"
        );

        let game = match self.seed {
            Some(seed) => {
                Game::with_seed(map, self.session_config, self.game_config, seed)?
            }
            None => Game::new(map, self.session_config, self.game_config)?,
        };

        let transport = TcpLineTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            game: Mutex::new(game),
            codec: JsonCodec,
        });

        Ok(AirlockServer { transport, state })
    }
}

impl Default for AirlockServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Airlock server.
///
/// Call [`run()`](Self::run) to start accepting connections. Packets go
/// over the wire as JSON lines.
pub struct AirlockServer {
    transport: TcpLineTransport,
    state: Arc<ServerState<JsonCodec>>,
}

impl AirlockServer {
    /// Creates a new builder.
    pub fn builder() -> AirlockServerBuilder {
        AirlockServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop, spawning a handler task per connection.
    ///
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), AirlockError> {
        tracing::info!("airlock server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
