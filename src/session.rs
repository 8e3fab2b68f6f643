//! One game between two connections.
//!
//! A [`GameSession`] never talks to the network. Each operation returns the
//! [`SessionEvent`]s it produced and the coordinator delivers them once the
//! session lock has been released.

use std::sync::Arc;

use derive_more::{Display, From};
use othello_rules::{GameState, History, Side};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::protocol::{EndReason, ServerMessage};

/// Process-unique handle for one client connection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize,
)]
#[display("conn-{_0}")]
pub struct ConnectionId(u64);

/// Process-unique handle for one game session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize,
)]
#[display("game-{_0}")]
pub struct SessionId(u64);

/// A session behind its own lock, shared between the registry and the
/// connections seated in it.
pub type SharedSession = Arc<Mutex<GameSession>>;

/// Where a session is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Lifecycle {
    /// Zero or one side seated.
    AwaitingPlayers,
    /// Both sides seated.
    Active,
    /// Terminal. The coordinator has been asked to drop the session.
    Ended,
}

/// Side effect produced by a session operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Deliver a message to one connection.
    Send {
        /// Recipient.
        to: ConnectionId,
        /// Payload.
        message: ServerMessage,
    },
    /// Someone joined, so waiting counts changed.
    Joined,
    /// The session is over.
    Ended {
        /// Why it ended.
        reason: EndReason,
        /// Everyone who was in the session, connected or not.
        participants: Vec<ConnectionId>,
    },
}

/// One occupied side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Seat {
    id: ConnectionId,
    connected: bool,
}

/// One game plus its two participant slots.
#[derive(Debug)]
pub struct GameSession {
    id: SessionId,
    first: Option<Seat>,
    second: Option<Seat>,
    /// Joined with no side preference and not yet paired.
    unassigned: Option<ConnectionId>,
    history: History,
    lifecycle: Lifecycle,
}

impl GameSession {
    /// Creates an empty session starting from `opening`.
    #[instrument(skip(opening))]
    pub fn new(id: SessionId, opening: GameState) -> Self {
        info!(session_id = %id, "Creating new game session");
        Self {
            id,
            first: None,
            second: None,
            unassigned: None,
            history: History::new(opening),
            lifecycle: Lifecycle::AwaitingPlayers,
        }
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// The authoritative position.
    pub fn state(&self) -> &GameState {
        self.history.current()
    }

    /// Every position played so far.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Identity seated on `side`, if any.
    pub fn occupant(&self, side: Side) -> Option<ConnectionId> {
        self.seat(side).map(|seat| seat.id)
    }

    /// Identity waiting without a side.
    pub fn unassigned(&self) -> Option<ConnectionId> {
        self.unassigned
    }

    /// Side held by `id`, if seated.
    pub fn side_of(&self, id: ConnectionId) -> Option<Side> {
        Side::iter().find(|&side| self.occupant(side) == Some(id))
    }

    /// Whether `id` is seated or waiting in this session.
    pub fn holds(&self, id: ConnectionId) -> bool {
        self.unassigned == Some(id) || self.side_of(id).is_some()
    }

    /// Whether the side's occupant still has a live connection.
    pub fn is_connected(&self, side: Side) -> bool {
        self.seat(side).is_some_and(|seat| seat.connected)
    }

    /// Whether a join request for `requested` would be taken.
    ///
    /// A specific side needs that slot empty; no preference needs any slot
    /// empty.
    pub fn accepts(&self, requested: Option<Side>) -> bool {
        if self.lifecycle == Lifecycle::Ended {
            return false;
        }
        match requested {
            Some(side) => self.seat(side).is_none(),
            None => self.first.is_none() || self.second.is_none(),
        }
    }

    /// Sides still missing a player, for waiting counts. Empty unless the
    /// session is awaiting players.
    pub fn open_sides(&self) -> Vec<Side> {
        if self.lifecycle != Lifecycle::AwaitingPlayers {
            return Vec::new();
        }
        Side::iter()
            .filter(|&side| self.seat(side).is_none())
            .collect()
    }

    /// Everyone in the session, seated first then unassigned.
    pub fn participants(&self) -> Vec<ConnectionId> {
        self.first
            .iter()
            .chain(self.second.iter())
            .map(|seat| seat.id)
            .chain(self.unassigned)
            .collect()
    }

    fn seat(&self, side: Side) -> Option<Seat> {
        match side {
            Side::First => self.first,
            Side::Second => self.second,
        }
    }

    fn seat_mut(&mut self, side: Side) -> &mut Option<Seat> {
        match side {
            Side::First => &mut self.first,
            Side::Second => &mut self.second,
        }
    }

    /// Queues `message` for the side's occupant if it is connected.
    fn send_to_side(&self, side: Side, message: ServerMessage, events: &mut Vec<SessionEvent>) {
        if let Some(seat) = self.seat(side).filter(|seat| seat.connected) {
            events.push(SessionEvent::Send {
                to: seat.id,
                message,
            });
        }
    }

    /// Seats `id`, on `requested` if given.
    ///
    /// With no preference the joiner takes whichever side is free. If
    /// another no-preference joiner is already waiting, that one becomes
    /// [`Side::First`] and the newcomer [`Side::Second`]. A lone
    /// no-preference joiner waits unassigned.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn join(&mut self, id: ConnectionId, requested: Option<Side>) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if self.holds(id) {
            warn!(%id, "Connection is already in this session");
            return events;
        }
        if !self.accepts(requested) {
            warn!(%id, ?requested, lifecycle = %self.lifecycle, "Session cannot take this join");
            return events;
        }

        match requested {
            Some(side) => self.join_assigned(id, side, &mut events),
            None => self.join_unassigned(id, &mut events),
        }
        events
    }

    fn join_unassigned(&mut self, id: ConnectionId, events: &mut Vec<SessionEvent>) {
        if self.first.is_some() {
            self.join_assigned(id, Side::Second, events);
        } else if self.second.is_some() {
            self.join_assigned(id, Side::First, events);
        } else if self.unassigned.is_some() {
            // Both arrived without a preference: the earlier one plays first.
            self.join_assigned(id, Side::Second, events);
        } else {
            info!(%id, "Holding connection until a side can be assigned");
            self.unassigned = Some(id);
            events.push(SessionEvent::Joined);
        }
    }

    fn join_assigned(&mut self, id: ConnectionId, side: Side, events: &mut Vec<SessionEvent>) {
        info!(%id, %side, "Seating connection");
        *self.seat_mut(side) = Some(Seat {
            id,
            connected: true,
        });

        if let Some(waiting) = self.unassigned.take() {
            info!(id = %waiting, side = %side.opponent(), "Resolving unassigned connection");
            *self.seat_mut(side.opponent()) = Some(Seat {
                id: waiting,
                connected: true,
            });
        }

        for seated in Side::iter() {
            self.send_to_side(seated, ServerMessage::Color { color: seated }, events);
        }

        self.send_to_side(
            side,
            ServerMessage::OpponentConnected {
                opponent_connected: self.is_connected(side.opponent()),
            },
            events,
        );
        self.send_to_side(
            side.opponent(),
            ServerMessage::OpponentConnected {
                opponent_connected: true,
            },
            events,
        );

        if self.first.is_some() && self.second.is_some() {
            info!(session_id = %self.id, "Both sides seated, game is active");
            self.lifecycle = Lifecycle::Active;
        }
        events.push(SessionEvent::Joined);
    }

    /// Plays `cell` for `id` and relays it to the opponent.
    ///
    /// Moves from connections that are not seated on the side to move, or
    /// that the board rejects, change nothing and produce no events. The
    /// same holds for any move made before both sides are seated or after
    /// the session ended: only an [`Lifecycle::Active`] session plays.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn make_move(&mut self, id: ConnectionId, cell: usize) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if self.lifecycle != Lifecycle::Active {
            warn!(%id, lifecycle = %self.lifecycle, "Move outside an active game");
            return events;
        }

        let Some(side) = self.side_of(id) else {
            warn!(%id, "Connection asked to move but isn't seated");
            return events;
        };

        let current = self.state().current_side();
        if side != current {
            warn!(%id, %side, %current, "Move out of turn");
            return events;
        }

        let next = match self.state().apply_move(side, cell) {
            Ok(next) => next,
            Err(e) => {
                warn!(%id, error = %e, "Invalid move");
                return events;
            }
        };

        let game_over = next.game_over();
        let score = next.score();
        self.history.push(next);
        debug!(
            %side,
            cell,
            first = score.first,
            second = score.second,
            board = %self.state().board().render(),
            "Move accepted"
        );

        self.send_to_side(
            side.opponent(),
            ServerMessage::OpponentMoved { cell, player: side },
            &mut events,
        );

        if game_over {
            match score.leader() {
                Some(winner) => info!(%winner, first = score.first, second = score.second, "Game finished"),
                None => info!(first = score.first, second = score.second, "Game finished in a draw"),
            }
            self.end(EndReason::Completed, &mut events);
        }

        events
    }

    /// Removes `id` from play and ends the session.
    ///
    /// The opponent, if still connected, is told first that `id` went away.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn leave(&mut self, id: ConnectionId, reason: EndReason) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if self.lifecycle == Lifecycle::Ended {
            debug!(%id, "Leave after session already ended");
            return events;
        }

        if self.unassigned == Some(id) {
            info!(%id, %reason, "Unassigned connection left");
        } else if let Some(side) = self.side_of(id) {
            info!(%id, %side, %reason, "Seated connection left");
            if let Some(seat) = self.seat_mut(side) {
                seat.connected = false;
            }
            self.send_to_side(
                side.opponent(),
                ServerMessage::OpponentConnected {
                    opponent_connected: false,
                },
                &mut events,
            );
        } else {
            warn!(%id, "Connection asked to leave but isn't in game");
            return events;
        }

        self.end(reason, &mut events);
        events
    }

    fn end(&mut self, reason: EndReason, events: &mut Vec<SessionEvent>) {
        info!(session_id = %self.id, %reason, moves = self.history.len() - 1, "Session ended");
        self.lifecycle = Lifecycle::Ended;
        events.push(SessionEvent::Ended {
            reason,
            participants: self.participants(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GameSession {
        GameSession::new(SessionId::from(1), GameState::initial(8, 8).unwrap())
    }

    #[test]
    fn test_accepts_by_side() {
        let mut s = session();
        assert!(s.accepts(Some(Side::First)));
        s.join(ConnectionId::from(1), Some(Side::First));
        assert!(!s.accepts(Some(Side::First)));
        assert!(s.accepts(Some(Side::Second)));
        assert!(s.accepts(None));
    }

    #[test]
    fn test_open_sides_with_unassigned() {
        let mut s = session();
        s.join(ConnectionId::from(1), None);
        assert_eq!(s.open_sides(), vec![Side::First, Side::Second]);
        assert_eq!(s.participants(), vec![ConnectionId::from(1)]);
    }

    #[test]
    fn test_duplicate_join_ignored() {
        let mut s = session();
        s.join(ConnectionId::from(1), Some(Side::Second));
        assert!(s.join(ConnectionId::from(1), Some(Side::First)).is_empty());
        assert_eq!(s.occupant(Side::First), None);
    }

    #[test]
    fn test_ended_session_accepts_nothing() {
        let mut s = session();
        s.join(ConnectionId::from(1), Some(Side::First));
        s.leave(ConnectionId::from(1), EndReason::OpponentLeft);
        assert_eq!(s.lifecycle(), Lifecycle::Ended);
        assert!(!s.accepts(None));
        assert!(s.leave(ConnectionId::from(1), EndReason::OpponentLeft).is_empty());
    }
}
