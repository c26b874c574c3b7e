//! Game rules and the mutable board state.
//!
//! - [`Board`] - cell contents, player to move and game status
//! - [`GameStatus`] / [`Outcome`] - whether the game is still running and how it ended
//! - [`MoveUndo`] - token returned by [`Board::apply`] to reverse a move
//! - [`MoveGuard`] - scoped move that is reverted when the guard is dropped
//!
//! # Game Flow
//!
//! 1. Start from [`Board::new`] (X to move)
//! 2. Apply moves with [`Board::apply`]; after each placement the 8 lines are checked
//!    for a win and the full board for a draw
//! 3. The turn passes to the opponent only while the game is ongoing
//! 4. Once [`Board::is_terminal`] returns `true`, further moves are rejected
//!
//! Searches explore the tree with a single board by pairing every move with its undo,
//! most conveniently through [`Board::play`]:
//!
//! ```
//! use oxo_engine::{Board, Position};
//!
//! let mut board = Board::new();
//! {
//!     let guard = board.play(Position::CENTER).unwrap();
//!     assert_eq!(guard.legal_moves().len(), 8);
//! }
//! assert_eq!(board, Board::new());
//! ```

use serde::{Deserialize, Serialize};

pub use self::board::*;

use crate::core::{Player, WinLine};

mod board;

/// Status of a game. Exactly one of the variants holds at any time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, derive_more::IsVariant,
)]
pub enum GameStatus {
    #[default]
    Ongoing,
    Won {
        winner: Player,
        line: WinLine,
    },
    Draw,
}

impl GameStatus {
    #[must_use]
    pub const fn outcome(self) -> Option<Outcome> {
        match self {
            GameStatus::Ongoing => None,
            GameStatus::Won { winner, .. } => Some(Outcome::Winner(winner)),
            GameStatus::Draw => Some(Outcome::Draw),
        }
    }
}

/// Result of a finished game.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display, derive_more::IsVariant,
)]
pub enum Outcome {
    #[display("{_0} wins")]
    Winner(Player),
    #[display("draw")]
    Draw,
}

impl Outcome {
    #[must_use]
    pub const fn winner(self) -> Option<Player> {
        match self {
            Outcome::Winner(player) => Some(player),
            Outcome::Draw => None,
        }
    }

    /// Game value seen from `perspective`: `1` for a win, `-1` for a loss, `0` for a draw.
    #[must_use]
    pub fn value_for(self, perspective: Player) -> i8 {
        match self {
            Outcome::Winner(winner) if winner == perspective => 1,
            Outcome::Winner(_) => -1,
            Outcome::Draw => 0,
        }
    }
}
