use serde::{Deserialize, Serialize};

use super::{BOARD_SIZE, Position};

/// One of the eight lines that win the game when filled by a single player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum WinLine {
    #[display("row {_0}")]
    Row(u8),
    #[display("column {_0}")]
    Column(u8),
    /// Top-left to bottom-right.
    #[display("diagonal")]
    Diagonal,
    /// Top-right to bottom-left.
    #[display("anti-diagonal")]
    AntiDiagonal,
}

impl WinLine {
    /// All lines in detection order: rows, columns, then both diagonals.
    pub const ALL: [WinLine; 8] = [
        WinLine::Row(0),
        WinLine::Row(1),
        WinLine::Row(2),
        WinLine::Column(0),
        WinLine::Column(1),
        WinLine::Column(2),
        WinLine::Diagonal,
        WinLine::AntiDiagonal,
    ];

    /// Returns the three positions making up this line.
    #[must_use]
    pub fn positions(self) -> [Position; BOARD_SIZE] {
        let at = |row: usize, col: usize| Position::ALL[row * BOARD_SIZE + col];
        match self {
            WinLine::Row(r) => {
                let r = usize::from(r);
                [at(r, 0), at(r, 1), at(r, 2)]
            }
            WinLine::Column(c) => {
                let c = usize::from(c);
                [at(0, c), at(1, c), at(2, c)]
            }
            WinLine::Diagonal => [at(0, 0), at(1, 1), at(2, 2)],
            WinLine::AntiDiagonal => [at(0, 2), at(1, 1), at(2, 0)],
        }
    }
}
