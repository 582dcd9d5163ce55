//! The client registry: a fixed number of slots, one per live connection.
//!
//! # Concurrency note
//!
//! `ClientRegistry` is NOT thread-safe by itself — it's a plain `Vec`.
//! The server keeps it inside the game context behind a single mutex, so
//! every broadcast and every win check sees a stable set of sessions.

use airlock_protocol::ClientId;

use crate::{PacketSender, Session, SessionConfig, SessionError};

/// Tracks every connected session.
///
/// ## Lifecycle
///
/// ```text
/// register() ──→ [slot taken, Naming] ──→ ... ──→ unregister() ──→ [slot free]
/// ```
///
/// Identities come from a counter that only goes up, so a `ClientId` is
/// never handed out twice during the server's lifetime, even after its
/// slot has been reused.
#[derive(Debug)]
pub struct ClientRegistry {
    /// `None` marks a free slot. Length is always `config.capacity`.
    slots: Vec<Option<Session>>,

    /// Identity for the next registration.
    next_id: u64,

    config: SessionConfig,
}

impl ClientRegistry {
    /// Creates an empty registry with `config.capacity` free slots.
    pub fn new(config: SessionConfig) -> Self {
        let slots = (0..config.capacity).map(|_| None).collect();
        Self {
            slots,
            next_id: 1,
            config,
        }
    }

    /// Registers a new connection in the first free slot.
    ///
    /// # Errors
    /// Returns [`SessionError::Full`] if every slot is taken. No session is
    /// created in that case.
    pub fn register(
        &mut self,
        sender: PacketSender,
    ) -> Result<ClientId, SessionError> {
        let Some(slot) = self.slots.iter_mut().find(|slot| slot.is_none())
        else {
            tracing::warn!(capacity = self.config.capacity, "registry full");
            return Err(SessionError::Full {
                capacity: self.config.capacity,
            });
        };

        let client_id = ClientId(self.next_id);
        self.next_id += 1;
        *slot = Some(Session::new(client_id, sender));

        tracing::info!(%client_id, "client registered");
        Ok(client_id)
    }

    /// Removes a session and hands it back.
    ///
    /// Returns `None` if nothing is registered under `id`, so calling this
    /// twice for the same connection is harmless.
    pub fn unregister(&mut self, id: ClientId) -> Option<Session> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|s| s.id == id))?;

        let mut session = slot.take()?;
        session.connected = false;

        tracing::info!(client_id = %id, name = session.display_name(), "client unregistered");
        Some(session)
    }

    pub fn find(&self, id: ClientId) -> Option<&Session> {
        self.sessions().find(|s| s.id == id)
    }

    pub fn find_mut(&mut self, id: ClientId) -> Option<&mut Session> {
        self.sessions_mut().find(|s| s.id == id)
    }

    /// Live sessions in slot order.
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.slots.iter().flatten()
    }

    pub fn sessions_mut(&mut self) -> impl Iterator<Item = &mut Session> {
        self.slots.iter_mut().flatten()
    }

    /// Sessions that have finished naming.
    pub fn named(&self) -> impl Iterator<Item = &Session> {
        self.sessions().filter(|s| s.is_named())
    }

    /// Runs `action` on every live session matching `predicate`, in slot
    /// order.
    pub fn for_each_matching<P, A>(&mut self, predicate: P, mut action: A)
    where
        P: Fn(&Session) -> bool,
        A: FnMut(&mut Session),
    {
        for session in self.sessions_mut() {
            if predicate(session) {
                action(session);
            }
        }
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
