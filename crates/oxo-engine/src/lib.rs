//! Tic-tac-toe game state shared by the search, learning and training crates.
//!
//! The crate is split in two layers, mirroring how the rest of the workspace uses it:
//!
//! - [`core`] - small value types: [`Player`], [`Cell`], [`Position`], [`WinLine`] and
//!   the hashable [`BoardKey`] encoding of a position
//! - [`engine`] - the mutable [`Board`] with move application, win/draw detection and
//!   reversible moves ([`Board::apply`] / [`Board::undo`] and the scoped [`MoveGuard`])
//!
//! # Example
//!
//! ```
//! use oxo_engine::{Board, Player, Position};
//!
//! let mut board = Board::new();
//! for (row, col) in [(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)] {
//!     board.apply(Position::new(row, col).unwrap()).unwrap();
//! }
//! assert_eq!(board.winner(), Some(Player::X));
//! assert!(board.is_terminal());
//! ```

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// Error returned when a move cannot be applied to a board.
///
/// The board is left untouched when this error is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum MoveError {
    #[display("cell {position} is already occupied")]
    Occupied { position: Position },
    #[display("game is already over")]
    GameOver,
}

/// Error returned when a cell layout cannot be reached by legal play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum InvalidBoardError {
    #[display("invalid mark counts: {x_count} X and {o_count} O")]
    MarkCount { x_count: usize, o_count: usize },
    #[display("both players have a winning line")]
    BothWinners,
    #[display("{winner} has a winning line but the mark counts say it was not the last mover")]
    WinnerOutOfTurn { winner: Player },
}

/// Error returned when parsing a board or a board key from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ParseBoardError {
    #[display("expected {CELL_COUNT} cells, got {len}")]
    Length { len: usize },
    #[display("invalid cell character {ch:?}")]
    Cell { ch: char },
    #[display("unreachable board: {_0}")]
    Unreachable(InvalidBoardError),
}
