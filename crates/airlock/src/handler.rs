//! Per-connection handler: admission, greeting and the read loop.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register with the game, or send `Full` and close
//!   2. Greet with an `Info` packet
//!   3. Spawn a writer task that drains the session's packet queue
//!   4. Loop: receive lines → decode → dispatch → deliver
//!
//! A dispatch that opens a discussion also arms its timer; when it fires,
//! the discussion closes with whatever votes are in.

use std::sync::Arc;
use std::time::Duration;

use airlock_game::{packets, Outbox};
use airlock_protocol::{ClientId, Codec, GameStatus, Inbound, Packet};
use airlock_transport::{Connection, LineConnection, TransportError};
use tokio::sync::mpsc;

use crate::dispatch::dispatch;
use crate::server::ServerState;
use crate::AirlockError;

/// Drop guard that removes a client from the game when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async lock.
struct SessionGuard<C: Codec> {
    client: ClientId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for SessionGuard<C> {
    fn drop(&mut self) {
        let client = self.client;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut game = state.game.lock().await;
            let mut out = Outbox::new();
            game.disconnect(client, &mut out);
            game.deliver(out);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec + Clone>(
    conn: LineConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), AirlockError> {
    let conn_id = conn.id();
    let peer = conn.peer_addr();
    tracing::debug!(%conn_id, %peer, "handling new connection");

    let conn = Arc::new(conn);
    let (tx, rx) = mpsc::unbounded_channel();

    // --- Step 1: Admission ---
    let admitted = {
        let mut game = state.game.lock().await;
        game.connect(tx).map(|client| {
            let mut out = Outbox::new();
            out.send_to(client, packets::info(client));
            game.deliver(out);
            client
        })
    };
    let client = match admitted {
        Ok(client) => client,
        Err(e) => {
            tracing::info!(%conn_id, %peer, error = %e, "turning connection away");
            let bytes = state.codec.encode(&packets::game_status(GameStatus::Full))?;
            conn.send(&bytes).await?;
            conn.close().await?;
            return Ok(());
        }
    };

    tracing::info!(%conn_id, %peer, %client, "client connected");

    let guard = SessionGuard {
        client,
        state: Arc::clone(&state),
    };

    // --- Step 2: Writer ---
    let writer = tokio::spawn(write_loop(Arc::clone(&conn), rx, state.codec.clone()));

    // --- Step 3: Read loop ---
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%client, "connection closed cleanly");
                break;
            }
            Err(TransportError::LineTooLong(limit)) => {
                tracing::debug!(%client, limit, "skipping over-long line");
                continue;
            }
            Err(e) => {
                tracing::debug!(%client, error = %e, "recv error");
                break;
            }
        };

        let inbound = match Inbound::decode(&state.codec, &data) {
            Ok(inbound) => inbound,
            Err(e) => {
                tracing::debug!(%client, error = %e, "failed to decode packet");
                continue;
            }
        };

        let mut game = state.game.lock().await;
        let open = game.discussion_id();
        let out = dispatch(&mut game, client, &inbound);
        game.deliver(out);

        if let Some(id) = game.discussion_id().filter(|id| Some(*id) != open) {
            let after = Duration::from_secs(game.config().discussion_secs);
            tokio::spawn(close_discussion_after(Arc::clone(&state), id, after));
        }
    }

    // The guard's disconnect drops the session's sender, which ends the
    // writer once it has flushed whatever was already queued.
    drop(guard);
    if let Err(e) = writer.await {
        tracing::debug!(%client, error = %e, "writer task failed");
    }
    if let Err(e) = conn.close().await {
        tracing::trace!(%client, error = %e, "close after disconnect");
    }
    Ok(())
}

/// Closes discussion `id` once `after` has passed, unless votes already
/// closed it.
async fn close_discussion_after<C: Codec>(
    state: Arc<ServerState<C>>,
    id: u64,
    after: Duration,
) {
    tokio::time::sleep(after).await;
    let mut game = state.game.lock().await;
    let mut out = Outbox::new();
    if game.close_discussion(id, &mut out) {
        tracing::info!(discussion = id, "discussion timed out");
        game.deliver(out);
    }
}

/// Drains one session's packet queue onto its socket.
///
/// Ends when every sender is gone or the socket stops accepting writes.
async fn write_loop<C: Codec>(
    conn: Arc<LineConnection>,
    mut rx: mpsc::UnboundedReceiver<Packet>,
    codec: C,
) {
    let conn_id = conn.id();
    while let Some(packet) = rx.recv().await {
        let bytes = match codec.encode(&packet) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(%conn_id, error = %e, "failed to encode packet");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed");
            break;
        }
    }
}
