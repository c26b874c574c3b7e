use std::fmt;

use serde::{Deserialize, Serialize};

use super::{BOARD_SIZE, CELL_COUNT};

/// A cell on the board, addressed in row-major order (index 0 is the top-left corner).
///
/// Serialized as the bare cell index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Position(u8);

/// Error returned when converting an out-of-range index into a [`Position`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("cell index {index} is outside the board")]
pub struct InvalidPositionError {
    index: usize,
}

impl Position {
    /// Every position in row-major order.
    #[expect(clippy::cast_possible_truncation)]
    pub const ALL: [Position; CELL_COUNT] = {
        let mut all = [Position(0); CELL_COUNT];
        let mut i = 0;
        while i < CELL_COUNT {
            all[i] = Position(i as u8);
            i += 1;
        }
        all
    };

    pub const CENTER: Position = Position(4);
    pub const CORNERS: [Position; 4] = [Position(0), Position(2), Position(6), Position(8)];

    /// Creates a position from a row and a column, both in `0..3`.
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Option<Self> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Self::from_index(row * BOARD_SIZE + col)
        } else {
            None
        }
    }

    #[expect(clippy::cast_possible_truncation)]
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < CELL_COUNT {
            Some(Position(index as u8))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[must_use]
    pub const fn row(self) -> usize {
        self.index() / BOARD_SIZE
    }

    #[must_use]
    pub const fn col(self) -> usize {
        self.index() % BOARD_SIZE
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row(), self.col())
    }
}

impl TryFrom<u8> for Position {
    type Error = InvalidPositionError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::from_index(usize::from(index)).ok_or(InvalidPositionError {
            index: usize::from(index),
        })
    }
}

impl From<Position> for u8 {
    fn from(position: Position) -> Self {
        position.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_col_roundtrip() {
        for position in Position::ALL {
            assert_eq!(
                Position::new(position.row(), position.col()),
                Some(position)
            );
        }
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(Position::new(3, 0), None);
        assert_eq!(Position::new(0, 3), None);
        assert_eq!(Position::from_index(9), None);
        assert!(Position::try_from(9).is_err());
    }

    #[test]
    fn test_serialized_as_index() {
        let position = Position::new(2, 1).unwrap();
        assert_eq!(serde_json::to_string(&position).unwrap(), "7");
        let parsed: Position = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, position);
        assert!(serde_json::from_str::<Position>("12").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Position::new(1, 2).unwrap().to_string(), "(1, 2)");
    }
}
