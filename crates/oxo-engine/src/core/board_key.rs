use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ParseBoardError;

use super::{CELL_COUNT, Cell};

/// Hashable encoding of the cell contents of a board.
///
/// The key is the base-3 number formed by the cells in row-major order (empty = 0,
/// X = 1, O = 2), so two boards with the same marks always produce the same key no
/// matter which move order reached them. Whose turn it is is not part of the key;
/// for positions reached by legal play it follows from the mark counts.
///
/// Keys are serialized as a 9-character string (`.`, `X`, `O`) so they can be used
/// as JSON object keys.
///
/// # Example
///
/// ```
/// use oxo_engine::{Board, BoardKey, Position};
///
/// let mut board = Board::new();
/// board.apply(Position::CENTER).unwrap();
/// assert_eq!(board.key().to_string(), "....X....");
/// assert_eq!("....X....".parse::<BoardKey>().unwrap(), board.key());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoardKey(u16);

impl BoardKey {
    /// Key of the empty board.
    pub const EMPTY: Self = Self(0);

    #[must_use]
    pub fn from_cells(cells: &[Cell; CELL_COUNT]) -> Self {
        Self(cells.iter().fold(0, |acc, cell| acc * 3 + cell.digit()))
    }

    /// Decodes the key back into cell contents.
    #[must_use]
    pub fn cells(self) -> [Cell; CELL_COUNT] {
        let mut cells = [Cell::Empty; CELL_COUNT];
        let mut rest = self.0;
        for cell in cells.iter_mut().rev() {
            *cell = Cell::from_digit(rest % 3);
            rest /= 3;
        }
        cells
    }

    /// Returns the raw base-3 value.
    #[must_use]
    pub fn value(self) -> u16 {
        self.0
    }
}

impl fmt::Display for BoardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in self.cells() {
            write!(f, "{}", cell.to_char())?;
        }
        Ok(())
    }
}

impl FromStr for BoardKey {
    type Err = ParseBoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cells = [Cell::Empty; CELL_COUNT];
        let mut len = 0;
        for ch in s.chars().filter(|ch| !ch.is_whitespace() && *ch != '|' && *ch != '/') {
            let cell = Cell::from_char(ch).ok_or(ParseBoardError::Cell { ch })?;
            if len < CELL_COUNT {
                cells[len] = cell;
            }
            len += 1;
        }
        if len != CELL_COUNT {
            return Err(ParseBoardError::Length { len });
        }
        Ok(Self::from_cells(&cells))
    }
}

impl Serialize for BoardKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BoardKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|e| serde::de::Error::custom(format!("invalid board key {s:?}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Player;

    #[test]
    fn test_empty_key() {
        let cells = [Cell::Empty; CELL_COUNT];
        assert_eq!(BoardKey::from_cells(&cells), BoardKey::EMPTY);
        assert_eq!(BoardKey::EMPTY.to_string(), ".........");
    }

    #[test]
    fn test_cells_roundtrip() {
        let mut cells = [Cell::Empty; CELL_COUNT];
        cells[0] = Cell::Marked(Player::X);
        cells[4] = Cell::Marked(Player::O);
        cells[8] = Cell::Marked(Player::X);
        let key = BoardKey::from_cells(&cells);
        assert_eq!(key.cells(), cells);
        assert_eq!(key.to_string(), "X...O...X");
    }

    #[test]
    fn test_keys_are_row_major() {
        let mut first = [Cell::Empty; CELL_COUNT];
        first[0] = Cell::Marked(Player::X);
        let mut last = [Cell::Empty; CELL_COUNT];
        last[8] = Cell::Marked(Player::X);
        assert!(BoardKey::from_cells(&first) > BoardKey::from_cells(&last));
    }

    #[test]
    fn test_parse_accepts_grid_layout() {
        let key: BoardKey = "X.O / .X. / ..O".parse().unwrap();
        assert_eq!(key.to_string(), "X.O.X...O");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "X.O".parse::<BoardKey>(),
            Err(ParseBoardError::Length { len: 3 })
        );
        assert_eq!(
            "X.O.Z....".parse::<BoardKey>(),
            Err(ParseBoardError::Cell { ch: 'Z' })
        );
    }

    #[test]
    fn test_serde_as_string() {
        let key: BoardKey = "XO.......".parse().unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"XO.......\"");
        let back: BoardKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
        assert!(serde_json::from_str::<BoardKey>("\"XO\"").is_err());
    }
}
