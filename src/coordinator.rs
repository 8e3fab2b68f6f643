//! Process-wide matchmaking and event delivery.
//!
//! # Locking
//!
//! There are three kinds of lock:
//!
//! * the registry (list of live sessions);
//! * one per session;
//! * the connection table.
//!
//! The registry may be held while a session or the connection table is
//! locked, never the reverse. The connection table is a leaf: nothing else
//! is locked while it is held.
//! Session events are dispatched only after the session lock is released,
//! so ending a session (which takes the registry) cannot deadlock against a
//! join in progress.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use othello_rules::{GameState, RulesError, Side};
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, instrument, warn};

use crate::protocol::{EndReason, ServerMessage, WaitingCounts};
use crate::session::{ConnectionId, GameSession, Lifecycle, SessionEvent, SessionId, SharedSession};

/// A live connection as the coordinator sees it.
#[derive(Debug)]
struct Connection {
    outbox: UnboundedSender<ServerMessage>,
    session: Option<SharedSession>,
}

/// Matches connections into sessions and routes their intents.
#[derive(Debug)]
pub struct MatchCoordinator {
    opening: GameState,
    registry: Mutex<Vec<SharedSession>>,
    connections: Mutex<HashMap<ConnectionId, Connection>>,
    next_connection: AtomicU64,
    next_session: AtomicU64,
}

impl MatchCoordinator {
    /// Creates a coordinator whose games use a `width` × `height` board.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError`] if the dimensions cannot hold the opening
    /// position.
    #[instrument]
    pub fn new(width: usize, height: usize) -> Result<Self, RulesError> {
        let opening = GameState::initial(width, height)?;
        info!(width, height, "Creating match coordinator");
        Ok(Self {
            opening,
            registry: Mutex::new(Vec::new()),
            connections: Mutex::new(HashMap::new()),
            next_connection: AtomicU64::new(1),
            next_session: AtomicU64::new(1),
        })
    }

    /// Registers a new connection and sends it the current waiting counts.
    ///
    /// Messages for the connection arrive on the returned receiver. It
    /// closes when the connection is unregistered.
    #[instrument(skip(self))]
    pub async fn connect(&self) -> (ConnectionId, UnboundedReceiver<ServerMessage>) {
        let id = ConnectionId::from(self.next_connection.fetch_add(1, Ordering::Relaxed));
        let (outbox, inbox) = mpsc::unbounded_channel();

        // The registry stays locked until the insert, so no broadcast can
        // fall between this count and the connection becoming visible.
        let registry = self.registry.lock().await;
        let waiting = Self::count_waiting(&registry).await;
        // Queued before the table insert, so it is always the first frame.
        let _ = outbox.send(ServerMessage::Waiting { waiting });

        self.connections.lock().await.insert(
            id,
            Connection {
                outbox,
                session: None,
            },
        );
        drop(registry);
        info!(%id, "Connection registered");
        (id, inbox)
    }

    /// Finds or creates a session for `id` and joins it.
    ///
    /// Connections already in a live session are refused.
    #[instrument(skip(self))]
    pub async fn request_join(&self, id: ConnectionId, preferred: Option<Side>) {
        let Some(current) = self.connection_session(id).await else {
            warn!(%id, "Join from unknown connection");
            return;
        };
        if let Some(session) = current
            && session.lock().await.lifecycle() != Lifecycle::Ended
        {
            warn!(%id, "Connection is already in a game");
            return;
        }

        let (session, events) = {
            let mut registry = self.registry.lock().await;

            let mut found = None;
            for candidate in registry.iter() {
                if candidate.lock().await.accepts(preferred) {
                    found = Some(Arc::clone(candidate));
                    break;
                }
            }

            let session = match found {
                Some(session) => session,
                None => {
                    let session_id =
                        SessionId::from(self.next_session.fetch_add(1, Ordering::Relaxed));
                    let session = Arc::new(Mutex::new(GameSession::new(
                        session_id,
                        self.opening.clone(),
                    )));
                    registry.push(Arc::clone(&session));
                    debug!(%session_id, sessions = registry.len(), "Registered new session");
                    session
                }
            };

            let events = session.lock().await.join(id, preferred);
            (session, events)
        };

        if let Some(connection) = self.connections.lock().await.get_mut(&id) {
            connection.session = Some(Arc::clone(&session));
        }
        self.dispatch(&session, events).await;
    }

    /// Forwards a move to the connection's session.
    #[instrument(skip(self))]
    pub async fn submit_move(&self, id: ConnectionId, cell: usize) {
        let Some(Some(session)) = self.connection_session(id).await else {
            warn!(%id, cell, "Move from connection without a game");
            return;
        };
        let events = session.lock().await.make_move(id, cell);
        self.dispatch(&session, events).await;
    }

    /// Voluntary leave: ends the connection's session with
    /// [`EndReason::OpponentLeft`]. The connection stays registered.
    #[instrument(skip(self))]
    pub async fn leave(&self, id: ConnectionId) {
        let session = match self.connections.lock().await.get_mut(&id) {
            Some(connection) => connection.session.take(),
            None => None,
        };
        match session {
            Some(session) => self.leave_session(id, session, EndReason::OpponentLeft).await,
            None => warn!(%id, "Leave from connection without a game"),
        }
    }

    /// Unregisters a closed connection and ends its session with
    /// [`EndReason::OpponentDisconnect`].
    #[instrument(skip(self))]
    pub async fn disconnect(&self, id: ConnectionId) {
        let removed = self.connections.lock().await.remove(&id);
        info!(%id, "Connection closed");
        if let Some(Connection {
            session: Some(session),
            ..
        }) = removed
        {
            self.leave_session(id, session, EndReason::OpponentDisconnect)
                .await;
        }
    }

    async fn leave_session(&self, id: ConnectionId, session: SharedSession, reason: EndReason) {
        let events = session.lock().await.leave(id, reason);
        self.dispatch(&session, events).await;
    }

    /// Counts, over sessions still awaiting players, how many lack each side.
    pub async fn waiting_counts(&self) -> WaitingCounts {
        let registry = self.registry.lock().await;
        Self::count_waiting(&registry).await
    }

    async fn count_waiting(registry: &[SharedSession]) -> WaitingCounts {
        let mut counts = WaitingCounts::default();
        for session in registry {
            for side in session.lock().await.open_sides() {
                match side {
                    Side::First => counts.first += 1,
                    Side::Second => counts.second += 1,
                }
            }
        }
        counts
    }

    /// Sends the current waiting counts to every live connection.
    ///
    /// The registry is held until every send is queued, so concurrent
    /// broadcasts reach each outbox in the order they were counted.
    #[instrument(skip(self))]
    pub async fn broadcast_waiting_counts(&self) {
        let registry = self.registry.lock().await;
        let waiting = Self::count_waiting(&registry).await;
        let connections = self.connections.lock().await;
        debug!(
            first = waiting.first,
            second = waiting.second,
            recipients = connections.len(),
            "Broadcasting waiting counts"
        );
        for connection in connections.values() {
            let _ = connection.outbox.send(ServerMessage::Waiting { waiting });
        }
    }

    /// Number of sessions in the registry.
    pub async fn session_count(&self) -> usize {
        self.registry.lock().await.len()
    }

    /// Number of live connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Session the connection currently sits in, if any.
    pub async fn session_of(&self, id: ConnectionId) -> Option<SessionId> {
        let session = self.connection_session(id).await.flatten()?;
        let session_id = session.lock().await.id();
        Some(session_id)
    }

    /// Outer `None`: unknown connection. Inner: its session, if any.
    async fn connection_session(&self, id: ConnectionId) -> Option<Option<SharedSession>> {
        self.connections
            .lock()
            .await
            .get(&id)
            .map(|connection| connection.session.clone())
    }

    /// Sends to one connection if it is still registered.
    async fn deliver(&self, to: ConnectionId, message: ServerMessage) {
        match self.connections.lock().await.get(&to) {
            Some(connection) => {
                if connection.outbox.send(message).is_err() {
                    debug!(%to, "Outbox closed, dropping message");
                }
            }
            None => debug!(%to, ?message, "Recipient gone, dropping message"),
        }
    }

    async fn dispatch(&self, session: &SharedSession, events: Vec<SessionEvent>) {
        for event in events {
            match event {
                SessionEvent::Send { to, message } => self.deliver(to, message).await,
                SessionEvent::Joined => self.broadcast_waiting_counts().await,
                SessionEvent::Ended {
                    reason,
                    participants,
                } => self.finish(session, reason, participants).await,
            }
        }
    }

    /// Drops an ended session, tells its remaining participants, and
    /// rebroadcasts availability.
    async fn finish(
        &self,
        session: &SharedSession,
        reason: EndReason,
        participants: Vec<ConnectionId>,
    ) {
        {
            let mut registry = self.registry.lock().await;
            registry.retain(|candidate| !Arc::ptr_eq(candidate, session));
            debug!(sessions = registry.len(), "Removed ended session");
        }

        {
            let mut connections = self.connections.lock().await;
            for participant in &participants {
                let Some(connection) = connections.get_mut(participant) else {
                    continue;
                };
                if connection
                    .session
                    .as_ref()
                    .is_some_and(|held| Arc::ptr_eq(held, session))
                {
                    connection.session = None;
                }
                if reason.is_announced() {
                    let _ = connection.outbox.send(ServerMessage::GameEnd { reason });
                }
            }
        }

        self.broadcast_waiting_counts().await;
    }
}
