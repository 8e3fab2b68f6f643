//! Sides and cells.

use serde::{Deserialize, Serialize};

/// One of the two competing players.
///
/// On the wire `First` (black) is `true` and `Second` (white) is `false`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(from = "bool", into = "bool")]
pub enum Side {
    /// Black, moves first.
    #[strum(to_string = "black")]
    First,
    /// White.
    #[strum(to_string = "white")]
    Second,
}

impl Side {
    /// Returns the other side.
    pub fn opponent(self) -> Self {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }
}

impl From<bool> for Side {
    fn from(value: bool) -> Self {
        if value { Side::First } else { Side::Second }
    }
}

impl From<Side> for bool {
    fn from(side: Side) -> Self {
        side == Side::First
    }
}

/// A single board position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Nobody has played here.
    #[default]
    Empty,
    /// Held by a side.
    Occupied(Side),
}

impl Cell {
    /// Returns the occupying side, if any.
    pub fn side(self) -> Option<Side> {
        match self {
            Cell::Empty => None,
            Cell::Occupied(side) => Some(side),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent_is_involution() {
        assert_eq!(Side::First.opponent(), Side::Second);
        assert_eq!(Side::Second.opponent().opponent(), Side::Second);
    }

    #[test]
    fn test_side_serializes_as_bool() {
        assert_eq!(serde_json::to_string(&Side::First).unwrap(), "true");
        assert_eq!(serde_json::to_string(&Side::Second).unwrap(), "false");
        let side: Side = serde_json::from_str("false").unwrap();
        assert_eq!(side, Side::Second);
    }
}
