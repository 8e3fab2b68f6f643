//! Snapshot history with an undo/redo cursor.

use crate::state::GameState;

/// Ordered snapshots of one game plus a cursor into them.
///
/// Snapshots are never edited. [`History::push`] discards anything after
/// the cursor (the redo tail) before appending, so the sequence always
/// describes one line of play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    snapshots: Vec<GameState>,
    cursor: usize,
}

impl History {
    /// Starts a history at `initial`.
    pub fn new(initial: GameState) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
        }
    }

    /// The snapshot under the cursor.
    pub fn current(&self) -> &GameState {
        // The vector is never empty and the cursor is always in range.
        &self.snapshots[self.cursor]
    }

    /// Appends `state` after the cursor and moves onto it.
    pub fn push(&mut self, state: GameState) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(state);
        self.cursor += 1;
    }

    /// Steps back one snapshot. Returns `false` at the start.
    pub fn undo(&mut self) -> bool {
        if self.can_undo() {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Steps forward one snapshot. Returns `false` at the end.
    pub fn redo(&mut self) -> bool {
        if self.can_redo() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Whether [`History::undo`] would move.
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Whether [`History::redo`] would move.
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Index of the current snapshot.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of snapshots kept, including the opening.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false; a history holds at least its opening snapshot.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// All snapshots in play order.
    pub fn snapshots(&self) -> &[GameState] {
        &self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Side;

    #[test]
    fn test_undo_redo_walks_snapshots() {
        let opening = GameState::initial(8, 8).unwrap();
        let after = opening.apply_move(Side::First, 19).unwrap();
        let mut history = History::new(opening.clone());
        history.push(after.clone());

        assert_eq!(history.current(), &after);
        assert!(history.undo());
        assert_eq!(history.current(), &opening);
        assert!(!history.undo());
        assert!(history.redo());
        assert!(!history.redo());
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_push_after_undo_drops_redo_tail() {
        let opening = GameState::initial(8, 8).unwrap();
        let a = opening.apply_move(Side::First, 19).unwrap();
        let b = opening.apply_move(Side::First, 26).unwrap();

        let mut history = History::new(opening);
        history.push(a);
        history.undo();
        history.push(b.clone());

        assert_eq!(history.len(), 2);
        assert_eq!(history.current(), &b);
        assert!(!history.can_redo());
    }
}
