//! Exhaustive solution of every position reachable from a start board.
//!
//! [`PerfectPlayTable::precompute`] runs a memoized minimax from the start board and
//! records, for every distinct position, the minimax value from X's point of view
//! (X maximizes, O minimizes) and the first move achieving it. Terminal positions are
//! stored with no move and their final value. From the empty board the table holds
//! 5,478 positions.
//!
//! The table is keyed by [`BoardKey`] and serializes as a JSON object mapping the
//! 9-character key to its entry.

use std::collections::BTreeMap;

use oxo_engine::{Board, BoardKey, Player, Position};
use serde::{Deserialize, Serialize};

use crate::algorithm::Value;

/// Solved value and best move of a single position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    #[serde(rename = "move")]
    best_move: Option<Position>,
    value: Value,
}

impl TableEntry {
    /// Best move for the player to move, `None` for a finished game.
    #[must_use]
    pub fn best_move(&self) -> Option<Position> {
        self.best_move
    }

    /// Minimax value from X's point of view.
    #[must_use]
    pub fn value(&self) -> Value {
        self.value
    }

    /// Minimax value from `player`'s point of view.
    #[must_use]
    pub fn value_for(&self, player: Player) -> Value {
        match player {
            Player::X => self.value,
            Player::O => -self.value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerfectPlayTable {
    entries: BTreeMap<BoardKey, TableEntry>,
}

impl PerfectPlayTable {
    /// Solves every position reachable from `start`.
    ///
    /// Each distinct position is searched exactly once; positions reached again
    /// through a different move order are answered from the table.
    ///
    /// # Example
    ///
    /// ```
    /// use oxo_engine::Board;
    /// use oxo_search::PerfectPlayTable;
    ///
    /// let table = PerfectPlayTable::precompute(&Board::new());
    /// assert_eq!(table.len(), 5478);
    /// assert_eq!(table.value(&Board::new()), Some(0));
    /// ```
    #[must_use]
    pub fn precompute(start: &Board) -> Self {
        let mut entries = BTreeMap::new();
        solve(&mut start.clone(), &mut entries);
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, board: &Board) -> Option<&TableEntry> {
        self.get_key(board.key())
    }

    /// Looks a position up by its key, without building a [`Board`].
    #[must_use]
    pub fn get_key(&self, key: BoardKey) -> Option<&TableEntry> {
        self.entries.get(&key)
    }

    /// Best move for the player to move, `None` for unknown or finished positions.
    #[must_use]
    pub fn best_move(&self, board: &Board) -> Option<Position> {
        self.get(board).and_then(TableEntry::best_move)
    }

    /// Minimax value from X's point of view, `None` for unknown positions.
    #[must_use]
    pub fn value(&self, board: &Board) -> Option<Value> {
        self.get(board).map(TableEntry::value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BoardKey, &TableEntry)> + '_ {
        self.entries.iter().map(|(key, entry)| (*key, entry))
    }
}

fn solve(board: &mut Board, entries: &mut BTreeMap<BoardKey, TableEntry>) -> Value {
    let key = board.key();
    if let Some(entry) = entries.get(&key) {
        return entry.value;
    }

    if let Some(outcome) = board.outcome() {
        let value = outcome.value_for(Player::X);
        entries.insert(
            key,
            TableEntry {
                best_move: None,
                value,
            },
        );
        return value;
    }

    let maximizing = board.turn() == Player::X;
    let mut best: Option<(Position, Value)> = None;
    for position in board.legal_moves() {
        let mut child = board
            .play(position)
            .expect("legal move should always be accepted");
        let score = solve(&mut child, entries);
        let better = best.is_none_or(|(_, best_score)| {
            if maximizing {
                score > best_score
            } else {
                score < best_score
            }
        });
        if better {
            best = Some((position, score));
        }
    }

    let (position, value) = best.expect("non-terminal board should have a legal move");
    entries.insert(
        key,
        TableEntry {
            best_move: Some(position),
            value,
        },
    );
    value
}
