//! Value types describing players, cells and positions on the 3×3 board.
//!
//! These types are `Copy` and carry no game logic; rule enforcement lives in
//! [`engine`](crate::engine).

use serde::{Deserialize, Serialize};

pub use self::{board_key::*, position::*, win_line::*};

mod board_key;
mod position;
mod win_line;

/// Number of rows (and columns) on the board.
pub const BOARD_SIZE: usize = 3;

/// Number of cells on the board.
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// One of the two players.
///
/// [`Player::X`] is player 1 and always moves first; [`Player::O`] is player 2.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
pub enum Player {
    X,
    O,
}

impl Player {
    pub const ALL: [Player; 2] = [Player::X, Player::O];

    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    /// Returns the player number (1 for X, 2 for O).
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Player::X => 1,
            Player::O => 2,
        }
    }

    /// Index suitable for per-player arrays (0 for X, 1 for O).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Player::X => 0,
            Player::O => 1,
        }
    }
}

/// Content of a single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, derive_more::IsVariant)]
pub enum Cell {
    #[default]
    Empty,
    Marked(Player),
}

impl Cell {
    #[must_use]
    pub const fn player(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::Marked(player) => Some(player),
        }
    }

    #[must_use]
    pub const fn to_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Marked(Player::X) => 'X',
            Cell::Marked(Player::O) => 'O',
        }
    }

    #[must_use]
    pub const fn from_char(ch: char) -> Option<Self> {
        match ch {
            '.' | '_' | '-' => Some(Cell::Empty),
            'X' | 'x' => Some(Cell::Marked(Player::X)),
            'O' | 'o' => Some(Cell::Marked(Player::O)),
            _ => None,
        }
    }

    const fn digit(self) -> u16 {
        match self {
            Cell::Empty => 0,
            Cell::Marked(Player::X) => 1,
            Cell::Marked(Player::O) => 2,
        }
    }

    const fn from_digit(digit: u16) -> Self {
        match digit {
            1 => Cell::Marked(Player::X),
            2 => Cell::Marked(Player::O),
            _ => Cell::Empty,
        }
    }
}
