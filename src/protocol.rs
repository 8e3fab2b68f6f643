//! JSON wire protocol spoken over the game socket.
//!
//! Every frame is one JSON object. Client frames may carry several keys at
//! once (`joinAs`, `move`, `endGame`); they are handled in that order.
//! Server frames carry exactly one notification each.

use othello_rules::Side;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

/// Something a client asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Join a game, optionally as a specific side.
    Join(Option<Side>),
    /// Play at a cell index.
    Move(usize),
    /// Leave the current game voluntarily.
    Leave,
}

/// Decodes one client frame into intents.
///
/// Each known key is read on its own, so a malformed `move` does not cost
/// a well-formed `joinAs` in the same frame. Frames that are not JSON
/// objects, and frames with no usable key, yield nothing; the caller keeps
/// the connection open either way.
#[instrument(level = "debug", skip(text), fields(len = text.len()))]
pub fn decode(text: &str) -> Vec<Intent> {
    let frame: Map<String, Value> = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, frame = %text, "Dropping malformed client frame");
            return Vec::new();
        }
    };

    let mut intents = Vec::new();
    // `null` means no side preference.
    if let Some(side) = field::<Option<Side>>(&frame, "joinAs") {
        intents.push(Intent::Join(side));
    }
    if let Some(cell) = field::<usize>(&frame, "move") {
        intents.push(Intent::Move(cell));
    }
    if field::<bool>(&frame, "endGame") == Some(true) {
        intents.push(Intent::Leave);
    }

    if intents.is_empty() {
        warn!(frame = %text, "Client frame carries no known intent");
    } else {
        debug!(?intents, "Decoded client frame");
    }
    intents
}

/// Reads `key` as `T`. Absent keys and values of the wrong type give `None`.
fn field<T: DeserializeOwned>(frame: &Map<String, Value>, key: &str) -> Option<T> {
    let value = frame.get(key)?;
    match T::deserialize(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(key, error = %e, "Ignoring malformed frame field");
            None
        }
    }
}

/// Why a session ended.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum EndReason {
    /// A participant sent `endGame`.
    OpponentLeft,
    /// A participant's connection closed.
    OpponentDisconnect,
    /// Neither side can move. Clients detect this from the board, so it is
    /// never sent on the wire.
    Completed,
}

impl EndReason {
    /// Whether remaining participants are told with a `gameEnd` frame.
    pub fn is_announced(self) -> bool {
        !matches!(self, EndReason::Completed)
    }
}

/// Number of sessions short of each side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingCounts {
    /// Sessions missing a [`Side::First`] player.
    #[serde(rename = "true")]
    pub first: usize,
    /// Sessions missing a [`Side::Second`] player.
    #[serde(rename = "false")]
    pub second: usize,
}

/// A notification sent to one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    /// Aggregate availability, sent to everyone.
    Waiting {
        /// Counts per side.
        waiting: WaitingCounts,
    },
    /// The side this client plays.
    Color {
        /// Assigned side.
        color: Side,
    },
    /// Whether the opponent currently has a live connection.
    OpponentConnected {
        /// Connectivity flag.
        #[serde(rename = "opponentConnected")]
        opponent_connected: bool,
    },
    /// The opponent played; the receiver applies it locally.
    OpponentMoved {
        /// Cell index played.
        #[serde(rename = "move")]
        cell: usize,
        /// Side that played it.
        player: Side,
    },
    /// The session is over.
    GameEnd {
        /// Termination reason.
        #[serde(rename = "gameEnd")]
        reason: EndReason,
    },
}

impl ServerMessage {
    /// Serializes the message as a JSON text frame.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` failures, which do not occur for these types
    /// in practice.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn as_value(message: &ServerMessage) -> Value {
        serde_json::from_str(&message.encode().unwrap()).unwrap()
    }

    #[test]
    fn test_decode_join_variants() {
        assert_eq!(decode(r#"{"joinAs": true}"#), vec![Intent::Join(Some(Side::First))]);
        assert_eq!(decode(r#"{"joinAs": false}"#), vec![Intent::Join(Some(Side::Second))]);
        assert_eq!(decode(r#"{"joinAs": null}"#), vec![Intent::Join(None)]);
    }

    #[test]
    fn test_decode_move_and_leave() {
        assert_eq!(decode(r#"{"move": 19}"#), vec![Intent::Move(19)]);
        assert_eq!(decode(r#"{"endGame": true}"#), vec![Intent::Leave]);
        assert!(decode(r#"{"endGame": false}"#).is_empty());
    }

    #[test]
    fn test_decode_keeps_good_keys_beside_bad_ones() {
        assert_eq!(
            decode(r#"{"joinAs": true, "move": "x"}"#),
            vec![Intent::Join(Some(Side::First))]
        );
        assert_eq!(
            decode(r#"{"joinAs": 3, "move": 26, "endGame": true}"#),
            vec![Intent::Move(26), Intent::Leave]
        );
    }

    #[test]
    fn test_decode_keys_in_fixed_order() {
        let intents = decode(r#"{"endGame": true, "move": 3, "joinAs": null}"#);
        assert_eq!(intents, vec![Intent::Join(None), Intent::Move(3), Intent::Leave]);
    }

    #[test]
    fn test_decode_drops_garbage() {
        assert!(decode("not json").is_empty());
        assert!(decode("[1, 2, 3]").is_empty());
        assert!(decode(r#"{"hello": "world"}"#).is_empty());
        assert!(decode(r#"{"move": -4}"#).is_empty());
        assert!(decode(r#"{"joinAs": "black"}"#).is_empty());
    }

    #[test]
    fn test_encode_shapes() {
        let waiting = ServerMessage::Waiting {
            waiting: WaitingCounts { first: 2, second: 1 },
        };
        assert_eq!(as_value(&waiting), json!({"waiting": {"true": 2, "false": 1}}));

        let color = ServerMessage::Color { color: Side::Second };
        assert_eq!(as_value(&color), json!({"color": false}));

        let connected = ServerMessage::OpponentConnected {
            opponent_connected: true,
        };
        assert_eq!(as_value(&connected), json!({"opponentConnected": true}));

        let moved = ServerMessage::OpponentMoved {
            cell: 19,
            player: Side::First,
        };
        assert_eq!(as_value(&moved), json!({"move": 19, "player": true}));

        let end = ServerMessage::GameEnd {
            reason: EndReason::OpponentDisconnect,
        };
        assert_eq!(as_value(&end), json!({"gameEnd": "opponentDisconnect"}));
    }

    #[test]
    fn test_server_message_parses_back() {
        let parsed: ServerMessage = serde_json::from_str(r#"{"move": 44, "player": false}"#).unwrap();
        assert_eq!(
            parsed,
            ServerMessage::OpponentMoved {
                cell: 44,
                player: Side::Second
            }
        );
    }

    #[test]
    fn test_completed_is_not_announced() {
        assert!(!EndReason::Completed.is_announced());
        assert!(EndReason::OpponentLeft.is_announced());
        assert_eq!(EndReason::OpponentLeft.to_string(), "opponentLeft");
    }
}
