//! `airlockd`: runs one Airlock game server.

use std::path::PathBuf;
use std::process::ExitCode;

use airlock::prelude::*;
use clap::Parser;

/// Multiplayer social-deduction text-adventure server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,
    /// Port to listen on
    #[arg(short, long, default_value_t = airlock::DEFAULT_PORT)]
    port: u16,
    /// Most clients connected at once
    #[arg(long, default_value = "10")]
    capacity: usize,
    /// Tasks drawn for each crewmate
    #[arg(long, default_value = "10")]
    tasks: usize,
    /// Named players needed to start a round
    #[arg(long, default_value = "2")]
    min_players: usize,
    /// Rooms the impostor walks between kills
    #[arg(long, default_value = "5")]
    kill_cooldown: u32,
    /// Emergency meetings each player may call per round
    #[arg(long, default_value = "2")]
    meetings: u32,
    /// Seconds a discussion stays open before votes are counted
    #[arg(long, default_value = "60")]
    discussion_secs: u64,
    /// Built-in map to play (skeld or mirahq)
    #[arg(short, long, default_value = "skeld")]
    map: String,
    /// Map definition (JSON) to play instead of a built-in one
    #[arg(long, conflicts_with = "map")]
    map_file: Option<PathBuf>,
    /// Fixed random seed
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!(error = %e, "server stopped");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(args: Args) -> Result<(), AirlockError> {
    let session_config = SessionConfig {
        capacity: args.capacity,
        ..SessionConfig::default()
    };
    let game_config = GameConfig {
        task_amount: args.tasks,
        min_players: args.min_players,
        kill_cooldown_moves: args.kill_cooldown,
        meetings_per_player: args.meetings,
        discussion_secs: args.discussion_secs,
        ..GameConfig::default()
    };

    let map = match &args.map_file {
        Some(path) => MapDefinition::from_file(path)?,
        None => MapDefinition::builtin(&args.map)
            .ok_or_else(|| WorldError::UnknownMap(args.map.clone()))?,
    };

    let mut builder = AirlockServer::builder()
        .bind(&format!("{}:{}", args.host, args.port))
        .session_config(session_config)
        .game_config(game_config)
        .map(map);
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }

    let server = builder.build().await?;
    if let Ok(addr) = server.local_addr() {
        tracing::info!(%addr, "listening");
    }
    server.run().await
}
